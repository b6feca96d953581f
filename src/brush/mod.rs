//! Brush engine module - turns pointer samples into pigment-mixed stamps

pub mod engine;
pub mod interpolation;
pub mod ledger;
pub mod mask;
pub mod pigment;

pub use engine::{BrushEngine, BrushSettings, StrokePhase};
pub use interpolation::{
    build_centerline, catmull_rom_segments, stamp_positions, StampWalker,
    DEFAULT_STEPS_PER_SEGMENT, MIN_CURVE_POINTS,
};
pub use ledger::{Stroke, StrokeLedger};
pub use mask::BrushMask;
pub use pigment::{blend_pixel, MixModel};

use serde::{Deserialize, Serialize};

/// A pointer sample in layer pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn lerp(&self, other: &Point, t: f32) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Straight-alpha RGBA color, every channel in 0.0-1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_array(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }

    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const fn rgb(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn with_rgb(self, rgb: [f32; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2], self.a)
    }

    pub fn from_rgba8(px: [u8; 4]) -> Self {
        Self::new(
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
            px[3] as f32 / 255.0,
        )
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        self.to_array()
            .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    /// Clamp every channel into 0.0-1.0 (NaN becomes 0)
    pub fn clamped(self) -> Self {
        Self::from_array(self.to_array().map(|c| if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) }))
    }

    /// Largest per-channel difference, alpha included
    pub fn max_channel_delta(&self, other: &Color) -> f32 {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}
