//! Texture assets - background underlay and brush tip
//!
//! Each slot starts with a 1×1 placeholder that is valid to sample, so the
//! engine can draw before any file has been read. Loading happens on the
//! tokio runtime (file read) and its blocking pool (decode); the finished
//! texture is swapped in under a lock and the slot's generation is bumped so
//! the engine can notice and re-render.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use image::{GrayImage, Luma, RgbaImage};
use parking_lot::RwLock;

use crate::core::errors::CoreError;

/// A shared, swappable texture
pub struct TextureSlot<T> {
    texture: Arc<RwLock<Arc<T>>>,
    generation: Arc<AtomicU64>,
}

impl<T> Clone for TextureSlot<T> {
    fn clone(&self) -> Self {
        Self {
            texture: Arc::clone(&self.texture),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<T> TextureSlot<T> {
    pub fn new(placeholder: T) -> Self {
        Self {
            texture: Arc::new(RwLock::new(Arc::new(placeholder))),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn get(&self) -> Arc<T> {
        Arc::clone(&self.texture.read())
    }

    pub fn replace(&self, texture: T) {
        *self.texture.write() = Arc::new(texture);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Bumped on every replacement; 0 means the placeholder is still in place
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

/// Transparent 1×1 underlay
pub fn placeholder_background() -> RgbaImage {
    RgbaImage::new(1, 1)
}

/// Opaque 1×1 tip, which leaves the round brush shape unchanged
pub fn placeholder_tip() -> GrayImage {
    GrayImage::from_pixel(1, 1, Luma([255]))
}

#[derive(Clone)]
pub struct EngineAssets {
    pub background: TextureSlot<RgbaImage>,
    pub brush_tip: TextureSlot<GrayImage>,
}

impl EngineAssets {
    pub fn new() -> Self {
        Self {
            background: TextureSlot::new(placeholder_background()),
            brush_tip: TextureSlot::new(placeholder_tip()),
        }
    }

    /// Combined generation of both slots
    pub fn generation(&self) -> u64 {
        self.background.generation() + self.brush_tip.generation()
    }
}

impl Default for EngineAssets {
    fn default() -> Self {
        Self::new()
    }
}

pub fn decode_background(bytes: &[u8]) -> Result<RgbaImage, CoreError> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

pub fn decode_brush_tip(bytes: &[u8]) -> Result<GrayImage, CoreError> {
    Ok(image::load_from_memory(bytes)?.to_luma8())
}

async fn load_into<T, F>(slot: &TextureSlot<T>, path: &Path, decode: F) -> Result<(), CoreError>
where
    T: Send + 'static,
    F: FnOnce(&[u8]) -> Result<T, CoreError> + Send + 'static,
{
    let bytes = tokio::fs::read(path).await?;
    let texture = tokio::task::spawn_blocking(move || decode(&bytes))
        .await
        .map_err(|e| CoreError::AssetTask(e.to_string()))??;
    slot.replace(texture);
    Ok(())
}

/// Read and decode a background image into its slot
pub async fn load_background(
    slot: &TextureSlot<RgbaImage>,
    path: impl AsRef<Path>,
) -> Result<(), CoreError> {
    let path = path.as_ref();
    tracing::debug!("Loading background {:?}", path);
    load_into(slot, path, decode_background).await.map_err(|e| {
        tracing::error!("Failed to load background {:?}: {}", path, e);
        e
    })
}

/// Read and decode a grayscale brush tip into its slot
pub async fn load_brush_tip(
    slot: &TextureSlot<GrayImage>,
    path: impl AsRef<Path>,
) -> Result<(), CoreError> {
    let path = path.as_ref();
    tracing::debug!("Loading brush tip {:?}", path);
    load_into(slot, path, decode_brush_tip).await.map_err(|e| {
        tracing::error!("Failed to load brush tip {:?}: {}", path, e);
        e
    })
}
