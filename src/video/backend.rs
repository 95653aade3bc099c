//! Backend trait for video decoding, encoding and audio muxing

use std::path::Path;
use thiserror::Error;

use super::frame::Frame;
use crate::error::WatermarkError;

/// Stream properties of a probed video.
///
/// `width` and `height` are display dimensions: a stream tagged with a
/// quarter-turn rotation reports them swapped, matching the decoded frames.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Frame rate as passed back to the encoder, e.g. `"30000/1001"`
    pub frame_rate: String,
    pub fps: f64,
    /// Reported or estimated frame count; 0 when unknown
    pub frame_count: u64,
    pub has_audio: bool,
    /// Display rotation in degrees, normalized to `0..360`
    pub rotation: i32,
}

/// Error from the audio re-mux step.
///
/// The pipeline never surfaces it: a failed mux falls back to the silent,
/// frame-only output.
#[derive(Error, Debug)]
pub enum MuxError {
    #[error("Input has no audio stream")]
    NoAudio,

    #[error("Audio mux failed: {0}")]
    Failed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Sequential reader of decoded RGB frames.
pub trait FrameSource: Send {
    /// Next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, WatermarkError>;

    /// Release the decoder and report any decoding failure it recorded.
    fn close(self: Box<Self>) -> Result<(), WatermarkError>;
}

/// Sequential writer of RGB frames into a frame-only video file.
pub trait FrameSink: Send {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), WatermarkError>;

    /// Flush and close the encoder; the output file is complete afterwards.
    fn finish(self: Box<Self>) -> Result<(), WatermarkError>;
}

/// Abstraction over the video toolchain to support multiple backends
pub trait VideoBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Read stream properties of `input`
    fn probe(&self, input: &Path) -> Result<VideoInfo, WatermarkError>;

    /// Start decoding `input` into frames of `info.width x info.height`
    fn open_source(
        &self,
        input: &Path,
        info: &VideoInfo,
    ) -> Result<Box<dyn FrameSource>, WatermarkError>;

    /// Start encoding a frame-only video at `output`
    fn open_sink(
        &self,
        output: &Path,
        width: u32,
        height: u32,
        frame_rate: &str,
    ) -> Result<Box<dyn FrameSink>, WatermarkError>;

    /// Combine the video stream of `video` with the audio of `audio_source`
    /// into `output`
    fn mux_audio(&self, video: &Path, audio_source: &Path, output: &Path) -> Result<(), MuxError>;
}
