//! Pigmix - raster painting engine with pigment-style color mixing
//!
//! Strokes are smoothed with Catmull-Rom curves, stamped into ping-pong layer
//! buffers and mixed either in a pigment latent space or linearly. Both
//! results are always kept, so the display mode can be toggled freely, and
//! every stroke is kept in a ledger so the drawing can be replayed at any size.

pub mod assets;
pub mod brush;
pub mod commands;
pub mod core;
pub mod engine;
pub mod surface;

pub use assets::{load_background, load_brush_tip, EngineAssets};
pub use brush::{BrushSettings, Color, MixModel, Point, Stroke, StrokeLedger};
pub use commands::{dispatch, dispatch_json, CommandResponse, EngineCommand};
pub use crate::core::config::EngineConfig;
pub use crate::core::errors::CoreError;
pub use engine::{DisplayMode, PaintEngine};
pub use surface::{LayerSurface, Region};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the tracing subscriber. Later calls are ignored.
pub fn init() {
    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pigmix=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_ok() {
        tracing::info!("Pigmix initializing...");
    }
}

/// Build an engine from config and start loading any textures it names.
///
/// Loading runs in the background; call [`PaintEngine::sync_assets`] to pick
/// the textures up once they are ready.
pub async fn open(config: EngineConfig) -> Result<PaintEngine, CoreError> {
    let assets = EngineAssets::new();
    let background_path = config.background_path.clone();
    let brush_tip_path = config.brush_tip_path.clone();
    let engine = PaintEngine::with_assets(config, assets.clone())?;

    if let Some(path) = background_path {
        let slot = assets.background.clone();
        tokio::spawn(async move {
            let _ = load_background(&slot, path).await;
        });
    }
    if let Some(path) = brush_tip_path {
        let slot = assets.brush_tip.clone();
        tokio::spawn(async move {
            let _ = load_brush_tip(&slot, path).await;
        });
    }
    Ok(engine)
}
