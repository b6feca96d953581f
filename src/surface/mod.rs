//! Layer surface - ping-pong buffer pairs per region and per mix model
//!
//! Every `(region, model)` combination owns a [`PingPong`] pair. All pairs
//! flip together through [`LayerSurface::advance`], so a stroke update lands
//! in the pigment and linear results at the same time. After any drawing
//! operation the active slot of each pair holds the full history for that
//! region and model; the other slot is stale.

mod buffer;
mod region;

pub use buffer::{PingPong, PixelBuffer};
pub use region::{Region, RegionLayout, RegionRect};

use std::sync::Arc;

use image::RgbaImage;
use rayon::prelude::*;

use crate::brush::{Color, MixModel, Point};
use crate::core::config::validate_dimensions;
use crate::core::errors::CoreError;

type Pairs = [[PingPong; 2]; 2];

/// Two regions, two models, two slots each
const BUFFER_COUNT: u64 = 8;

/// Upper bound on the memory held by all layer buffers together
pub const MAX_SURFACE_BYTES: u64 = 4 << 30;

pub struct LayerSurface {
    width: u32,
    height: u32,
    max_dimension: u32,
    palette_fraction: f32,
    layout: RegionLayout,
    /// Indexed `[region][model]`
    pairs: Pairs,
    background: Arc<RgbaImage>,
}

impl LayerSurface {
    pub fn new(
        width: u32,
        height: u32,
        palette_fraction: f32,
        max_dimension: u32,
        background: Arc<RgbaImage>,
    ) -> Result<Self, CoreError> {
        let pairs = Self::build_pairs(width, height, max_dimension, &background)?;
        Ok(Self {
            width,
            height,
            max_dimension,
            palette_fraction,
            layout: RegionLayout::split(width, height, palette_fraction),
            pairs,
            background,
        })
    }

    fn build_pairs(
        width: u32,
        height: u32,
        max_dimension: u32,
        background: &RgbaImage,
    ) -> Result<Pairs, CoreError> {
        validate_dimensions(width, height, max_dimension)?;
        let bytes = width as u64 * height as u64 * std::mem::size_of::<[f32; 4]>() as u64 * BUFFER_COUNT;
        if bytes > MAX_SURFACE_BYTES {
            tracing::warn!(
                "Layer surface {}x{} needs {} bytes, over the {} byte budget",
                width,
                height,
                bytes,
                MAX_SURFACE_BYTES
            );
            return Err(CoreError::Allocation { width, height });
        }
        let make = || PingPong::try_new(width, height, background);
        Ok([[make()?, make()?], [make()?, make()?]])
    }

    /// Recreate every buffer at the new size: transparent, then background.
    ///
    /// All pairs start with `active = 0`. On failure the previous buffers are
    /// kept untouched.
    pub fn allocate(&mut self, width: u32, height: u32) -> Result<(), CoreError> {
        let pairs = Self::build_pairs(width, height, self.max_dimension, &self.background)
            .map_err(|e| {
                tracing::error!("Layer allocation failed: {}", e);
                e
            })?;

        self.pairs = pairs;
        self.width = width;
        self.height = height;
        self.layout = RegionLayout::split(width, height, self.palette_fraction);
        tracing::info!(
            "Allocated layer surface {}x{} (canvas {:?}, palette {:?})",
            width,
            height,
            self.layout.canvas,
            self.layout.palette
        );
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> &RegionLayout {
        &self.layout
    }

    pub fn region_rect(&self, region: Region) -> &RegionRect {
        self.layout.rect(region)
    }

    pub fn region_at(&self, x: f32, y: f32) -> Option<Region> {
        self.layout.region_at(x, y)
    }

    pub fn background(&self) -> &Arc<RgbaImage> {
        &self.background
    }

    /// Replace the underlay; it shows up on the next allocate or clear
    pub fn set_background(&mut self, background: Arc<RgbaImage>) {
        self.background = background;
    }

    fn pair(&self, model: MixModel, region: Region) -> &PingPong {
        &self.pairs[region.index()][model.index()]
    }

    fn pair_mut(&mut self, model: MixModel, region: Region) -> &mut PingPong {
        &mut self.pairs[region.index()][model.index()]
    }

    pub fn active_index(&self, model: MixModel, region: Region) -> usize {
        self.pair(model, region).active_index()
    }

    /// The displayable buffer holding the latest result
    pub fn active_buffer(&self, model: MixModel, region: Region) -> &PixelBuffer {
        self.pair(model, region).active()
    }

    /// The previous result, i.e. the slot that is not active
    pub fn read_buffer(&self, model: MixModel, region: Region) -> &PixelBuffer {
        self.pair(model, region).inactive()
    }

    /// The active slot, written by the brush after [`advance`](Self::advance)
    pub fn write_target(&mut self, model: MixModel, region: Region) -> &mut PixelBuffer {
        self.pair_mut(model, region).active_mut()
    }

    /// Flip every pair in lockstep
    pub fn advance(&mut self) {
        for pair in self.pairs.iter_mut().flatten() {
            pair.flip();
        }
    }

    /// Copy each read buffer into its write target so untouched content survives
    pub fn carry_forward(&mut self) {
        for pair in self.pairs.iter_mut().flatten() {
            pair.carry_forward();
        }
    }

    /// Wipe one region's four buffers back to the background
    pub fn clear_region(&mut self, region: Region) {
        let background = Arc::clone(&self.background);
        for pair in self.pairs[region.index()].iter_mut() {
            pair.reset(&background);
        }
        tracing::debug!("Cleared {:?} region", region);
    }

    /// Canvas first, then the palette alpha-over inside its rectangle
    pub fn composite_to_screen(&self, mode: MixModel) -> RgbaImage {
        let canvas = self.active_buffer(mode, Region::Canvas).pixels();
        let palette = self.active_buffer(mode, Region::Palette).pixels();
        let palette_rect = self.layout.palette;
        let width = self.width as usize;

        let mut frame = RgbaImage::new(self.width, self.height);
        frame
            .par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, out) in row.chunks_exact_mut(4).enumerate() {
                    let i = y * width + x;
                    let color = if palette_rect.contains_pixel(x as u32, y as u32) {
                        over(palette[i], canvas[i])
                    } else {
                        canvas[i]
                    };
                    out.copy_from_slice(&Color::from_array(color).to_rgba8());
                }
            });
        frame
    }

    /// Active pixel under a point, `None` outside the region rectangle
    pub fn sample_color(&self, x: f32, y: f32, model: MixModel, region: Region) -> Option<Color> {
        if !self.region_rect(region).contains(x, y) {
            return None;
        }
        self.active_buffer(model, region)
            .pixel(x.floor() as u32, y.floor() as u32)
    }

    /// Average of the square neighborhood around `center` (half-width
    /// `radius`), counting only pixels whose alpha exceeds `alpha_threshold`.
    pub fn sample_average(
        &self,
        center: Point,
        radius: u32,
        alpha_threshold: f32,
        model: MixModel,
        region: Region,
    ) -> Option<Color> {
        let rect = self.region_rect(region);
        if !rect.contains(center.x, center.y) {
            return None;
        }

        let buffer = self.active_buffer(model, region);
        let (cx, cy) = (center.x.floor() as u32, center.y.floor() as u32);
        let x0 = cx.saturating_sub(radius).max(rect.x);
        let y0 = cy.saturating_sub(radius).max(rect.y);
        let x1 = cx.saturating_add(radius).min(rect.right().saturating_sub(1));
        let y1 = cy.saturating_add(radius).min(rect.bottom().saturating_sub(1));

        let mut sum = [0.0f32; 4];
        let mut count = 0u32;
        for y in y0..=y1 {
            for x in x0..=x1 {
                let Some(px) = buffer.pixel(x, y) else {
                    continue;
                };
                if px.a <= alpha_threshold {
                    continue;
                }
                for (acc, c) in sum.iter_mut().zip(px.to_array()) {
                    *acc += c;
                }
                count += 1;
            }
        }

        if count == 0 {
            return None;
        }
        Some(Color::from_array(sum.map(|c| c / count as f32)))
    }

    /// Digest of one region's active buffer
    pub fn fingerprint(&self, model: MixModel, region: Region) -> String {
        self.active_buffer(model, region).fingerprint()
    }

    /// Digests of every active buffer, ordered `[canvas pigment, canvas linear,
    /// palette pigment, palette linear]`
    pub fn fingerprints(&self) -> Vec<String> {
        Region::ALL
            .iter()
            .flat_map(|&region| MixModel::ALL.iter().map(move |&model| (model, region)))
            .map(|(model, region)| self.fingerprint(model, region))
            .collect()
    }
}

/// Straight-alpha "over"
#[inline]
fn over(top: [f32; 4], bottom: [f32; 4]) -> [f32; 4] {
    let ta = top[3];
    let ba = bottom[3] * (1.0 - ta);
    let a = ta + ba;
    if a <= 0.0 {
        return [0.0; 4];
    }
    [
        (top[0] * ta + bottom[0] * ba) / a,
        (top[1] * ta + bottom[1] * ba) / a,
        (top[2] * ta + bottom[2] * ba) / a,
        a,
    ]
}
