//! Command surface - JSON-friendly interface for UI hosts
//!
//! Each [`EngineCommand`] maps onto one [`PaintEngine`] operation. Frames are
//! returned as base64 PNG so they survive a JSON round trip.

use base64::Engine;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::brush::{BrushSettings, Color, MixModel};
use crate::core::errors::CoreError;
use crate::engine::PaintEngine;
use crate::surface::Region;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum EngineCommand {
    BeginStroke { x: f32, y: f32, region: Region },
    ExtendStroke { x: f32, y: f32 },
    EndStroke,
    SetBrushSize { value: f32 },
    SetFlow { value: f32 },
    SetSpacing { value: f32 },
    SetHardness { value: f32 },
    SetPickupAmount { value: f32 },
    SetReturnRate { value: f32 },
    SetSelectedColor { color: Color },
    SetDisplayMode { mode: MixModel },
    PickColor { x: f32, y: f32 },
    Resize { width: u32, height: u32 },
    ClearRegion { region: Region },
    ClearAll,
    RedrawAll,
    Present,
    SyncAssets,
    GetState,
}

/// Snapshot of engine state for diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub width: u32,
    pub height: u32,
    pub display_mode: MixModel,
    pub stroke_count: usize,
    pub stroking: bool,
    pub brush: BrushSettings,
    pub selected_color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CommandResponse {
    Ack,
    Frame { width: u32, height: u32, png: String },
    Color { color: Option<Color> },
    Synced { changed: bool },
    State(EngineState),
}

/// Encode a frame as base64 PNG
pub fn encode_frame(frame: &RgbaImage) -> Result<String, CoreError> {
    let mut png_data = Vec::new();
    frame.write_to(&mut std::io::Cursor::new(&mut png_data), image::ImageFormat::Png)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(&png_data))
}

fn frame_response(frame: RgbaImage) -> Result<CommandResponse, String> {
    Ok(CommandResponse::Frame {
        width: frame.width(),
        height: frame.height(),
        png: encode_frame(&frame)?,
    })
}

/// Run one command against the engine
pub fn dispatch(engine: &mut PaintEngine, command: EngineCommand) -> Result<CommandResponse, String> {
    match command {
        EngineCommand::BeginStroke { x, y, region } => engine.begin_stroke(x, y, region),
        EngineCommand::ExtendStroke { x, y } => engine.extend_stroke(x, y),
        EngineCommand::EndStroke => engine.end_stroke(),
        EngineCommand::SetBrushSize { value } => engine.set_brush_size(value),
        EngineCommand::SetFlow { value } => engine.set_flow(value),
        EngineCommand::SetSpacing { value } => engine.set_spacing(value),
        EngineCommand::SetHardness { value } => engine.set_hardness(value),
        EngineCommand::SetPickupAmount { value } => engine.set_pickup_amount(value),
        EngineCommand::SetReturnRate { value } => engine.set_return_rate(value),
        EngineCommand::SetSelectedColor { color } => engine.set_selected_color(color),
        EngineCommand::SetDisplayMode { mode } => {
            return frame_response(engine.set_display_mode(mode));
        }
        EngineCommand::PickColor { x, y } => {
            return Ok(CommandResponse::Color {
                color: engine.pick_color_at(x, y),
            });
        }
        EngineCommand::Resize { width, height } => {
            tracing::info!("Resizing to {}x{}", width, height);
            engine.resize(width, height)?;
        }
        EngineCommand::ClearRegion { region } => engine.clear_region(region),
        EngineCommand::ClearAll => engine.clear_all()?,
        EngineCommand::RedrawAll => engine.redraw_all()?,
        EngineCommand::Present => return frame_response(engine.present()),
        EngineCommand::SyncAssets => {
            return Ok(CommandResponse::Synced {
                changed: engine.sync_assets()?,
            });
        }
        EngineCommand::GetState => {
            return Ok(CommandResponse::State(EngineState {
                width: engine.surface().width(),
                height: engine.surface().height(),
                display_mode: engine.display_mode(),
                stroke_count: engine.ledger().len(),
                stroking: engine.brush().is_stroking(),
                brush: engine.brush_settings().clone(),
                selected_color: engine.brush().selected_color(),
            }));
        }
    }
    Ok(CommandResponse::Ack)
}

/// Parse a JSON command, run it, and serialize the response
pub fn dispatch_json(engine: &mut PaintEngine, text: &str) -> Result<String, String> {
    let command: EngineCommand = serde_json::from_str(text).map_err(|e| {
        tracing::warn!("Rejected command: {}", e);
        CoreError::from(e)
    })?;
    let response = dispatch(engine, command)?;
    serde_json::to_string(&response).map_err(|e| CoreError::from(e).into())
}
