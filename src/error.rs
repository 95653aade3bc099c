// Error types module

use std::path::PathBuf;
use thiserror::Error;

/// Errors that fail a watermarking invocation.
///
/// Font fallback and audio re-mux problems are not represented here: both
/// degrade the output instead of failing it and are reported through logs.
#[derive(Error, Debug)]
pub enum WatermarkError {
    /// Input image or video could not be opened or parsed
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Writing the output failed
    #[error("Failed to encode {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Text could not be rendered
    #[error("Failed to render watermark text: {0}")]
    Render(String),

    /// Invalid configuration
    #[error("Watermark configuration error: {0}")]
    Config(String),

    /// Input kind or extension is not accepted
    #[error("Unsupported media: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatermarkError {
    pub fn decode(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn encode(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Encode {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WatermarkError>;
