// Watermarker library: text watermarks for photos, videos and video notes

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod video; // ffmpeg-backed frame pipeline plumbing
pub mod watermark;

pub use config::Config;
pub use error::WatermarkError;
pub use pipeline::{MediaKind, Watermarker};
