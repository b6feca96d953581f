//! Engine configuration, loaded from JSON and validated before use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::brush::{BrushSettings, Color};
use crate::core::errors::CoreError;

/// Largest edge accepted for any layer buffer.
pub const DEFAULT_MAX_DIMENSION: u32 = 16384;

/// Largest pickup neighborhood half-width accepted.
pub const MAX_PICKUP_RADIUS: u32 = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub width: u32,
    pub height: u32,
    pub max_dimension: u32,
    /// Share of the surface width given to the palette strip on the right.
    pub palette_fraction: f32,
    pub brush: BrushSettings,
    pub selected_color: Color,
    /// Catmull-Rom samples per input segment.
    pub steps_per_segment: usize,
    /// Half-width of the square neighborhood averaged for pickup.
    pub pickup_radius: u32,
    /// Pixels at or below this alpha are ignored by pickup.
    pub pickup_alpha_threshold: f32,
    pub background_path: Option<PathBuf>,
    pub brush_tip_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            max_dimension: DEFAULT_MAX_DIMENSION,
            palette_fraction: 0.25,
            brush: BrushSettings::default(),
            selected_color: Color::new(0.2, 0.3, 0.8, 1.0),
            steps_per_segment: crate::brush::DEFAULT_STEPS_PER_SEGMENT,
            pickup_radius: 2,
            pickup_alpha_threshold: 0.02,
            background_path: None,
            brush_tip_path: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        tracing::debug!("Loading engine config from {:?}", path);
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_dimensions(self.width, self.height, self.max_dimension)?;
        if !self.palette_fraction.is_finite() || !(0.0..1.0).contains(&self.palette_fraction) {
            return Err(CoreError::InvalidInput(
                "Palette fraction must be in [0, 1)".to_string(),
            ));
        }
        if self.steps_per_segment == 0 {
            return Err(CoreError::InvalidInput(
                "Steps per segment must be at least 1".to_string(),
            ));
        }
        if self.pickup_radius > MAX_PICKUP_RADIUS {
            return Err(CoreError::InvalidInput(format!(
                "Pickup radius must be at most {}",
                MAX_PICKUP_RADIUS
            )));
        }
        if !self.pickup_alpha_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.pickup_alpha_threshold)
        {
            return Err(CoreError::InvalidInput(
                "Pickup alpha threshold must be in [0, 1]".to_string(),
            ));
        }
        validate_brush_settings(&self.brush)?;
        validate_color(&self.selected_color)
    }
}

pub fn validate_dimensions(width: u32, height: u32, max_dimension: u32) -> Result<(), CoreError> {
    if width == 0 || height == 0 || width > max_dimension || height > max_dimension {
        return Err(CoreError::InvalidDimensions { width, height });
    }
    Ok(())
}

pub fn validate_brush_settings(settings: &BrushSettings) -> Result<(), CoreError> {
    if !settings.size.is_finite() || settings.size <= 0.0 {
        return Err(CoreError::InvalidInput(
            "Brush size must be a positive finite number".to_string(),
        ));
    }
    if !settings.spacing.is_finite() || settings.spacing <= 0.0 {
        return Err(CoreError::InvalidInput(
            "Brush spacing must be a positive finite number".to_string(),
        ));
    }
    let unit_fields = [
        ("flow", settings.flow),
        ("hardness", settings.hardness),
        ("pickup amount", settings.pickup_amount),
        ("return rate", settings.return_rate),
    ];
    for (name, value) in unit_fields {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(CoreError::InvalidInput(format!(
                "Brush {} must be in [0, 1]",
                name
            )));
        }
    }
    Ok(())
}

pub fn validate_color(color: &Color) -> Result<(), CoreError> {
    if color
        .to_array()
        .iter()
        .any(|c| !c.is_finite() || !(0.0..=1.0).contains(c))
    {
        return Err(CoreError::InvalidInput(
            "Color channels must be in [0, 1]".to_string(),
        ));
    }
    Ok(())
}
