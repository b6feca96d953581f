//! Brush engine - stamps strokes into the layer surface
//!
//! A stroke goes `Idle → Stamping → Sealed`. While stamping, every appended
//! point triggers an incremental update:
//!
//! 1. pick the curve segments whose four control points are now known,
//! 2. flip the surface and carry the previous result forward,
//! 3. sample the canvas under the brush and let the current colors drift
//!    toward it (pickup) and back toward the selected color (return),
//! 4. stamp the new segments into both mix models, clipped to the region.
//!
//! Replaying a sealed stroke runs the exact same updates, so a replay after a
//! resize is pixel-identical to the live drawing.

use std::sync::Arc;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use super::interpolation::{
    catmull_rom_segments, flatten_segments, StampWalker, DEFAULT_STEPS_PER_SEGMENT,
    MIN_CURVE_POINTS,
};
use super::ledger::Stroke;
use super::mask::{stamp_angle, BrushMask, Footprint};
use super::pigment::{blend_pixel, mix_rgb, MixModel};
use super::{Color, Point};
use crate::surface::{LayerSurface, PixelBuffer, Region};

/// Brush settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrushSettings {
    /// Brush diameter in pixels
    pub size: f32,
    /// Per-stamp coverage multiplier (0.0 - 1.0)
    pub flow: f32,
    /// Spacing between stamps (as fraction of size)
    pub spacing: f32,
    /// Hardness (0.0 - 1.0), affects edge falloff
    pub hardness: f32,
    /// How strongly the brush takes on the color under it (0.0 - 1.0)
    pub pickup_amount: f32,
    /// How quickly the brush returns to the selected color (0.0 - 1.0)
    pub return_rate: f32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            size: 24.0,
            flow: 0.35,
            spacing: 0.2,
            hardness: 0.8,
            pickup_amount: 0.15,
            return_rate: 0.1,
        }
    }
}

impl BrushSettings {
    /// Arc-length distance between stamp centers
    pub fn stamp_spacing(&self) -> f32 {
        self.size * self.spacing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokePhase {
    #[default]
    Idle,
    Stamping,
    Sealed,
}

/// Settings that shape how any stroke is rendered, fixed for an engine's lifetime
#[derive(Debug, Clone)]
pub struct StrokeRenderer {
    pub steps_per_segment: usize,
    /// Half-width of the pickup sampling square
    pub pickup_radius: u32,
    pub pickup_alpha_threshold: f32,
    pub tip: Option<Arc<GrayImage>>,
}

impl Default for StrokeRenderer {
    fn default() -> Self {
        Self {
            steps_per_segment: DEFAULT_STEPS_PER_SEGMENT,
            pickup_radius: 2,
            pickup_alpha_threshold: 0.02,
            tip: None,
        }
    }
}

/// An in-flight stroke plus the state that must persist between updates
struct ActiveStroke {
    stroke: Stroke,
    walker: StampWalker,
    mask: BrushMask,
}

impl ActiveStroke {
    fn new(stroke: Stroke, tip: Option<&Arc<GrayImage>>) -> Self {
        let mut mask = BrushMask::new(stroke.settings.size, stroke.settings.hardness);
        if let Some(tip) = tip {
            mask = mask.with_tip(Arc::clone(tip));
        }
        Self {
            walker: StampWalker::new(stroke.settings.stamp_spacing()),
            mask,
            stroke,
        }
    }
}

impl StrokeRenderer {
    /// Render whatever part of the stroke is ready. With `flush` the final
    /// segment is drawn too, using the last point as its own phantom
    /// neighbour. Returns the number of stamps placed.
    fn render_pending(
        &self,
        active: &mut ActiveStroke,
        current: &mut [Color; 2],
        surface: &mut LayerSurface,
        flush: bool,
    ) -> usize {
        let n = active.stroke.len();
        if n < MIN_CURVE_POINTS {
            return 0;
        }

        // Segment k is final once point k + 2 exists
        let last_segment = if flush { n - 2 } else { n - 3 };
        let first_segment = active.stroke.drawn_count;
        if first_segment > last_segment {
            return 0;
        }

        // One point of lead-in keeps the seam's control points real
        let start = first_segment.saturating_sub(1);
        let segments = catmull_rom_segments(&active.stroke.points[start..], self.steps_per_segment);
        let polyline = flatten_segments(
            &segments[first_segment - start..=last_segment - start],
            active.stroke.points[last_segment + 1],
        );

        surface.advance();
        surface.carry_forward();

        let region = active.stroke.region;
        let probe = active.stroke.points[n - 1];
        let selected = active.stroke.colors[n - 1];
        for model in MixModel::ALL {
            let sampled = surface.sample_average(
                probe,
                self.pickup_radius,
                self.pickup_alpha_threshold,
                model,
                region,
            );
            current[model.index()] = drift_color(
                current[model.index()],
                sampled,
                selected,
                &active.stroke.settings,
                model,
            );
        }

        let mut stamps = Vec::new();
        active.walker.walk(&polyline, &mut stamps);

        let clip = *surface.region_rect(region);
        let flow = active.stroke.settings.flow;
        for stamp in &stamps {
            let angle = stamp_angle(active.stroke.seed, stamp.index);
            let Some(footprint) = active.mask.footprint(stamp.position, angle, &clip) else {
                continue;
            };
            for model in MixModel::ALL {
                apply_footprint(
                    surface.write_target(model, region),
                    &footprint,
                    current[model.index()].rgb(),
                    flow,
                    model,
                );
            }
        }

        active.stroke.drawn_count = last_segment + 1;
        tracing::trace!(
            "Stroke {} rendered segments {}..={} ({} stamps)",
            active.stroke.seed,
            first_segment,
            last_segment,
            stamps.len()
        );
        stamps.len()
    }
}

/// Pickup then return, once per update
fn drift_color(
    current: Color,
    sampled: Option<Color>,
    selected: Color,
    settings: &BrushSettings,
    model: MixModel,
) -> Color {
    let mut rgb = current.rgb();
    if let Some(sampled) = sampled {
        rgb = mix_rgb(rgb, sampled.rgb(), settings.pickup_amount, model);
    }
    rgb = mix_rgb(rgb, selected.rgb(), settings.return_rate, model);
    selected.with_rgb(rgb)
}

fn apply_footprint(
    buffer: &mut PixelBuffer,
    footprint: &Footprint,
    rgb: [f32; 3],
    flow: f32,
    model: MixModel,
) {
    for (y, row) in footprint.rows() {
        for (col, &mask) in row.iter().enumerate() {
            let coverage = mask * flow;
            if coverage <= 0.0 {
                continue;
            }
            if let Some(px) = buffer.pixel_mut(footprint.left + col as u32, y) {
                *px = blend_pixel(*px, rgb, coverage, model);
            }
        }
    }
}

/// The main brush engine that processes strokes
pub struct BrushEngine {
    settings: BrushSettings,
    selected: Color,
    /// Color being deposited right now, indexed by [`MixModel::index`]
    current: [Color; 2],
    phase: StrokePhase,
    active: Option<ActiveStroke>,
    renderer: StrokeRenderer,
}

impl BrushEngine {
    /// Create a new brush engine with default settings
    pub fn new() -> Self {
        Self::with_settings(BrushSettings::default(), Color::BLACK)
    }

    /// Create with custom settings
    pub fn with_settings(settings: BrushSettings, selected: Color) -> Self {
        Self {
            settings,
            selected,
            current: [selected; 2],
            phase: StrokePhase::Idle,
            active: None,
            renderer: StrokeRenderer::default(),
        }
    }

    pub fn with_renderer(mut self, renderer: StrokeRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Install a brush tip texture for strokes started from now on
    pub fn set_tip(&mut self, tip: Option<Arc<GrayImage>>) {
        self.renderer.tip = tip;
    }

    pub fn settings(&self) -> &BrushSettings {
        &self.settings
    }

    pub fn set_size(&mut self, px: f32) {
        if px.is_finite() {
            self.settings.size = px.max(1.0);
        }
    }

    pub fn set_flow(&mut self, flow: f32) {
        if flow.is_finite() {
            self.settings.flow = flow.clamp(0.0, 1.0);
        }
    }

    pub fn set_spacing(&mut self, fraction: f32) {
        if fraction.is_finite() {
            self.settings.spacing = fraction.max(0.01);
        }
    }

    pub fn set_hardness(&mut self, hardness: f32) {
        if hardness.is_finite() {
            self.settings.hardness = hardness.clamp(0.0, 1.0);
        }
    }

    pub fn set_pickup_amount(&mut self, amount: f32) {
        if amount.is_finite() {
            self.settings.pickup_amount = amount.clamp(0.0, 1.0);
        }
    }

    pub fn set_return_rate(&mut self, rate: f32) {
        if rate.is_finite() {
            self.settings.return_rate = rate.clamp(0.0, 1.0);
        }
    }

    pub fn selected_color(&self) -> Color {
        self.selected
    }

    /// Takes effect immediately: the next recorded point carries this color
    pub fn set_selected_color(&mut self, color: Color) {
        self.selected = color.clamped();
    }

    /// Color the brush is depositing under `model`
    pub fn current_color(&self, model: MixModel) -> Color {
        self.current[model.index()]
    }

    pub fn phase(&self) -> StrokePhase {
        self.phase
    }

    pub fn is_stroking(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.active.as_ref().map(|a| &a.stroke)
    }

    /// Start a stroke; both current colors reset to the selected color
    pub fn begin_stroke(&mut self, start: Point, region: Region, seed: u64) {
        if self.active.is_some() {
            tracing::warn!("Beginning a stroke while another is in flight; dropping the old one");
        }
        let stroke = Stroke::new(start, self.selected, region, self.settings.clone(), seed);
        self.current = [self.selected; 2];
        self.active = Some(ActiveStroke::new(stroke, self.renderer.tip.as_ref()));
        self.phase = StrokePhase::Stamping;
        tracing::debug!("Stroke {} started in {:?} at ({}, {})", seed, region, start.x, start.y);
    }

    /// Append a point and composite whatever became ready.
    /// Returns the number of stamps placed; no-op without an active stroke.
    pub fn extend_stroke(&mut self, surface: &mut LayerSurface, point: Point) -> usize {
        let Some(active) = self.active.as_mut() else {
            return 0;
        };
        active.stroke.push(point, self.selected);
        self.renderer
            .render_pending(active, &mut self.current, surface, false)
    }

    /// Draw the tail of the stroke and hand it over for the ledger
    pub fn end_stroke(&mut self, surface: &mut LayerSurface) -> Option<Stroke> {
        let mut active = self.active.take()?;
        self.renderer
            .render_pending(&mut active, &mut self.current, surface, true);
        self.phase = StrokePhase::Sealed;
        tracing::debug!(
            "Stroke {} sealed with {} points",
            active.stroke.seed,
            active.stroke.len()
        );
        Some(active.stroke)
    }

    /// Render a sealed stroke again through the same incremental path
    pub fn replay(&mut self, surface: &mut LayerSurface, stroke: &Stroke) {
        let (Some(&start), Some(&first_color)) = (stroke.points.first(), stroke.colors.first())
        else {
            return;
        };

        let working = Stroke::new(
            start,
            first_color,
            stroke.region,
            stroke.settings.clone(),
            stroke.seed,
        );
        let mut active = ActiveStroke::new(working, self.renderer.tip.as_ref());
        let mut current = [first_color; 2];

        for (point, color) in stroke.points.iter().zip(&stroke.colors).skip(1) {
            active.stroke.push(*point, *color);
            self.renderer
                .render_pending(&mut active, &mut current, surface, false);
        }
        self.renderer
            .render_pending(&mut active, &mut current, surface, true);
        self.current = current;
    }
}

impl Default for BrushEngine {
    fn default() -> Self {
        Self::new()
    }
}
