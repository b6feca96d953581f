//! Drawable regions and their screen-space rectangles

use serde::{Deserialize, Serialize};

/// One of the two independent drawable areas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Canvas,
    Palette,
}

impl Region {
    pub const ALL: [Region; 2] = [Region::Canvas, Region::Palette];

    pub const fn index(self) -> usize {
        match self {
            Region::Canvas => 0,
            Region::Palette => 1,
        }
    }
}

/// Axis-aligned pixel rectangle, `[x, x + width) × [y, y + height)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegionRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RegionRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether a continuous point lies inside the rectangle
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x as f32 && y >= self.y as f32 && x < self.right() as f32 && y < self.bottom() as f32
    }

    pub const fn contains_pixel(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }
}

/// Canvas on the left, palette strip on the right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionLayout {
    pub canvas: RegionRect,
    pub palette: RegionRect,
}

impl RegionLayout {
    pub fn split(width: u32, height: u32, palette_fraction: f32) -> Self {
        let fraction = if palette_fraction.is_finite() {
            palette_fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let palette_width = ((width as f32 * fraction).round() as u32).min(width);
        let canvas_width = width - palette_width;
        Self {
            canvas: RegionRect::new(0, 0, canvas_width, height),
            palette: RegionRect::new(canvas_width, 0, palette_width, height),
        }
    }

    pub fn rect(&self, region: Region) -> &RegionRect {
        match region {
            Region::Canvas => &self.canvas,
            Region::Palette => &self.palette,
        }
    }

    /// Region under a point; the palette wins since it is drawn on top
    pub fn region_at(&self, x: f32, y: f32) -> Option<Region> {
        if self.palette.contains(x, y) {
            Some(Region::Palette)
        } else if self.canvas.contains(x, y) {
            Some(Region::Canvas)
        } else {
            None
        }
    }
}
