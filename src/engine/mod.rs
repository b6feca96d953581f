//! Paint engine - the object a host event loop drives
//!
//! Owns the layer surface, the brush engine, the stroke ledger and the asset
//! slots. Every call runs to completion; there is no shared global state.

use image::RgbaImage;

use crate::assets::EngineAssets;
use crate::brush::engine::StrokeRenderer;
use crate::brush::{BrushEngine, BrushSettings, Color, MixModel, Point, StrokeLedger};
use crate::core::config::EngineConfig;
use crate::core::errors::CoreError;
use crate::surface::{LayerSurface, Region};

/// Which buffers are shown; both are always kept up to date
pub type DisplayMode = MixModel;

pub struct PaintEngine {
    config: EngineConfig,
    surface: LayerSurface,
    brush: BrushEngine,
    ledger: StrokeLedger,
    display_mode: DisplayMode,
    assets: EngineAssets,
    /// Asset generation the surface and brush were last built from
    assets_generation: u64,
    next_seed: u64,
}

impl PaintEngine {
    /// Create an engine with placeholder textures
    pub fn new(config: EngineConfig) -> Result<Self, CoreError> {
        Self::with_assets(config, EngineAssets::new())
    }

    /// Create an engine sharing the given asset slots
    pub fn with_assets(config: EngineConfig, assets: EngineAssets) -> Result<Self, CoreError> {
        config.validate()?;

        let surface = LayerSurface::new(
            config.width,
            config.height,
            config.palette_fraction,
            config.max_dimension,
            assets.background.get(),
        )?;

        let renderer = StrokeRenderer {
            steps_per_segment: config.steps_per_segment,
            pickup_radius: config.pickup_radius,
            pickup_alpha_threshold: config.pickup_alpha_threshold,
            tip: Some(assets.brush_tip.get()),
        };
        let brush = BrushEngine::with_settings(config.brush.clone(), config.selected_color)
            .with_renderer(renderer);

        tracing::info!(
            "Paint engine ready: {}x{}, palette fraction {}",
            config.width,
            config.height,
            config.palette_fraction
        );

        Ok(Self {
            assets_generation: assets.generation(),
            config,
            surface,
            brush,
            ledger: StrokeLedger::new(),
            display_mode: DisplayMode::default(),
            assets,
            next_seed: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn surface(&self) -> &LayerSurface {
        &self.surface
    }

    pub fn brush(&self) -> &BrushEngine {
        &self.brush
    }

    pub fn ledger(&self) -> &StrokeLedger {
        &self.ledger
    }

    pub fn assets(&self) -> &EngineAssets {
        &self.assets
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    /// Start a stroke; ignored when the point is outside `region`
    pub fn begin_stroke(&mut self, x: f32, y: f32, region: Region) {
        if self.brush.is_stroking() {
            self.end_stroke();
        }
        if !self.surface.region_rect(region).contains(x, y) {
            tracing::debug!("Ignoring stroke start at ({}, {}) outside {:?}", x, y, region);
            return;
        }
        let seed = self.next_seed;
        self.next_seed += 1;
        self.brush.begin_stroke(Point::new(x, y), region, seed);
    }

    /// Append a point to the in-flight stroke. Leaving the stroke's region
    /// seals it instead.
    pub fn extend_stroke(&mut self, x: f32, y: f32) {
        let Some(region) = self.brush.active_stroke().map(|s| s.region) else {
            return;
        };
        if !self.surface.region_rect(region).contains(x, y) {
            tracing::debug!("Pointer left {:?} at ({}, {}); sealing stroke", region, x, y);
            self.end_stroke();
            return;
        }
        self.brush.extend_stroke(&mut self.surface, Point::new(x, y));
    }

    pub fn end_stroke(&mut self) {
        if let Some(stroke) = self.brush.end_stroke(&mut self.surface) {
            self.ledger.push(stroke);
        }
    }

    pub fn set_brush_size(&mut self, px: f32) {
        self.brush.set_size(px);
    }

    pub fn set_flow(&mut self, flow: f32) {
        self.brush.set_flow(flow);
    }

    pub fn set_spacing(&mut self, fraction: f32) {
        self.brush.set_spacing(fraction);
    }

    pub fn set_hardness(&mut self, hardness: f32) {
        self.brush.set_hardness(hardness);
    }

    pub fn set_selected_color(&mut self, color: Color) {
        self.brush.set_selected_color(color);
    }

    pub fn set_pickup_amount(&mut self, amount: f32) {
        self.brush.set_pickup_amount(amount);
    }

    pub fn set_return_rate(&mut self, rate: f32) {
        self.brush.set_return_rate(rate);
    }

    pub fn brush_settings(&self) -> &BrushSettings {
        self.brush.settings()
    }

    /// Switch the shown model and return the new frame. No buffer changes.
    pub fn set_display_mode(&mut self, mode: DisplayMode) -> RgbaImage {
        self.display_mode = mode;
        self.present()
    }

    /// Composite the displayed model to a screen frame
    pub fn present(&self) -> RgbaImage {
        self.surface.composite_to_screen(self.display_mode)
    }

    /// Color under a screen point in the displayed model
    pub fn pick_color_at(&self, x: f32, y: f32) -> Option<Color> {
        let region = self.surface.region_at(x, y)?;
        self.surface.sample_color(x, y, self.display_mode, region)
    }

    /// Reallocate at the new size and replay every stroke
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), CoreError> {
        if self.brush.is_stroking() {
            self.end_stroke();
        }
        self.surface.allocate(width, height)?;
        self.config.width = width;
        self.config.height = height;
        self.replay_ledger();
        Ok(())
    }

    /// Clear every buffer and replay the ledger at the current size
    pub fn redraw_all(&mut self) -> Result<(), CoreError> {
        self.resize(self.surface.width(), self.surface.height())
    }

    fn replay_ledger(&mut self) {
        tracing::info!("Replaying {} strokes", self.ledger.len());
        for stroke in self.ledger.iter() {
            self.brush.replay(&mut self.surface, stroke);
        }
    }

    /// Wipe one region back to its background and forget its strokes
    pub fn clear_region(&mut self, region: Region) {
        if self.brush.is_stroking() {
            self.end_stroke();
        }
        self.surface.clear_region(region);
        let removed = self.ledger.remove_region(region);
        tracing::debug!("Cleared {:?}, dropped {} strokes", region, removed);
    }

    /// Forget every stroke and reset all buffers
    pub fn clear_all(&mut self) -> Result<(), CoreError> {
        if self.brush.is_stroking() {
            self.end_stroke();
        }
        self.ledger.clear();
        self.surface
            .allocate(self.surface.width(), self.surface.height())
    }

    /// Pick up textures that finished loading since the last call.
    /// Returns whether anything changed (and the drawing was replayed).
    pub fn sync_assets(&mut self) -> Result<bool, CoreError> {
        let generation = self.assets.generation();
        if generation == self.assets_generation {
            return Ok(false);
        }
        self.surface.set_background(self.assets.background.get());
        self.brush.set_tip(Some(self.assets.brush_tip.get()));
        self.assets_generation = generation;
        tracing::info!("Assets updated (generation {}), redrawing", generation);
        self.redraw_all()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests;
