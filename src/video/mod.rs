//! Video toolchain abstraction.
//!
//! The frame pipeline talks to a [`VideoBackend`] for probing, decoding,
//! encoding and audio muxing:
//!
//! - [`FfmpegBackend`]: production backend driving `ffmpeg`/`ffprobe`
//! - [`MockVideoBackend`]: synthetic frames with per-stage failure injection

pub mod backend;
pub mod ffmpeg;
pub mod frame;
pub mod mock_backend;
pub mod probe;

pub use backend::{FrameSink, FrameSource, MuxError, VideoBackend, VideoInfo};
pub use ffmpeg::FfmpegBackend;
pub use frame::{center_crop_square, fit_frame, output_dimensions, Frame};
pub use mock_backend::{FailureStage, MockRecord, MockVideoBackend};
pub use probe::{parse_frame_rate, parse_probe_output};
