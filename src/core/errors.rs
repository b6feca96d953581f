use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid surface size {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Failed to allocate a {width}x{height} layer buffer")]
    Allocation { width: u32, height: u32 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Asset task failed: {0}")]
    AssetTask(String),
}

impl From<CoreError> for String {
    fn from(err: CoreError) -> Self {
        err.to_string()
    }
}
