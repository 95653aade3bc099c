//! Mock video backend for testing (synthetic frames, real output files)

use parking_lot::RwLock;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::backend::{FrameSink, FrameSource, MuxError, VideoBackend, VideoInfo};
use super::frame::Frame;
use crate::error::WatermarkError;

/// Stage at which the mock backend should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Probe,
    OpenSource,
    OpenSink,
    /// Decoding fails once `after` frames have been read
    Decode { after: u64 },
    /// Encoding fails once `after` frames have been written
    Encode { after: u64 },
    Finish,
    Mux,
}

/// What the pipeline did with the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockRecord {
    pub frames_read: u64,
    pub frames_written: u64,
    pub sink_dimensions: Option<(u32, u32)>,
    pub sink_frame_rate: Option<String>,
    pub sources_closed: u32,
    pub sinks_finished: u32,
    pub mux_calls: u32,
}

/// Mock backend that decodes synthetic gradient frames and writes small
/// marker files, so tests can follow the file lifecycle without ffmpeg.
#[derive(Clone)]
pub struct MockVideoBackend {
    info: VideoInfo,
    /// Frames actually produced, which may differ from `info.frame_count`
    frames: u64,
    failure: Arc<RwLock<Option<FailureStage>>>,
    record: Arc<RwLock<MockRecord>>,
    written: Arc<RwLock<Vec<Frame>>>,
}

impl MockVideoBackend {
    pub fn new(width: u32, height: u32, frames: u64, has_audio: bool) -> Self {
        Self {
            info: VideoInfo {
                width,
                height,
                frame_rate: "30/1".to_string(),
                fps: 30.0,
                frame_count: frames,
                has_audio,
                rotation: 0,
            },
            frames,
            failure: Arc::new(RwLock::new(None)),
            record: Arc::new(RwLock::new(MockRecord::default())),
            written: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Report `count` frames from probing while decoding the real number.
    pub fn with_reported_frame_count(mut self, count: u64) -> Self {
        self.info.frame_count = count;
        self
    }

    /// Fail at `stage` on the next run
    pub fn fail_at(&self, stage: FailureStage) {
        *self.failure.write() = Some(stage);
    }

    pub fn record(&self) -> MockRecord {
        self.record.read().clone()
    }

    /// Every frame handed to a sink, in write order.
    pub fn written_frames(&self) -> Vec<Frame> {
        self.written.read().clone()
    }

    fn failure(&self) -> Option<FailureStage> {
        *self.failure.read()
    }
}

/// Marker written by the mock encoder and muxer.
fn write_marker(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(text.as_bytes())?;
    file.flush()
}

impl VideoBackend for MockVideoBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn probe(&self, input: &Path) -> Result<VideoInfo, WatermarkError> {
        if self.failure() == Some(FailureStage::Probe) {
            return Err(WatermarkError::decode(input, "Simulated probe failure"));
        }
        if !input.exists() {
            return Err(WatermarkError::decode(input, "No such file"));
        }
        Ok(self.info.clone())
    }

    fn open_source(
        &self,
        input: &Path,
        info: &VideoInfo,
    ) -> Result<Box<dyn FrameSource>, WatermarkError> {
        if self.failure() == Some(FailureStage::OpenSource) {
            return Err(WatermarkError::decode(input, "Simulated open failure"));
        }
        let fail_after = match self.failure() {
            Some(FailureStage::Decode { after }) => Some(after),
            _ => None,
        };

        Ok(Box::new(MockFrameSource {
            width: info.width,
            height: info.height,
            remaining: self.frames,
            index: 0,
            fail_after,
            path: input.to_path_buf(),
            record: Arc::clone(&self.record),
        }))
    }

    fn open_sink(
        &self,
        output: &Path,
        width: u32,
        height: u32,
        frame_rate: &str,
    ) -> Result<Box<dyn FrameSink>, WatermarkError> {
        if self.failure() == Some(FailureStage::OpenSink) {
            return Err(WatermarkError::encode(output, "Simulated open failure"));
        }

        // A real encoder creates its output before the first frame arrives
        let file = File::create(output)?;
        {
            let mut record = self.record.write();
            record.sink_dimensions = Some((width, height));
            record.sink_frame_rate = Some(frame_rate.to_string());
        }

        Ok(Box::new(MockFrameSink {
            file,
            width,
            height,
            written: 0,
            failure: self.failure(),
            path: output.to_path_buf(),
            record: Arc::clone(&self.record),
            frames: Arc::clone(&self.written),
        }))
    }

    fn mux_audio(&self, video: &Path, _audio_source: &Path, output: &Path) -> Result<(), MuxError> {
        self.record.write().mux_calls += 1;

        if self.failure() == Some(FailureStage::Mux) {
            // Leave a partial file behind like an interrupted muxer would
            write_marker(output, "partial")?;
            return Err(MuxError::Failed("Simulated mux failure".to_string()));
        }
        if !self.info.has_audio {
            return Err(MuxError::NoAudio);
        }

        let mut contents = std::fs::read_to_string(video)?;
        contents.push_str("audio\n");
        write_marker(output, &contents)?;
        Ok(())
    }
}

struct MockFrameSource {
    width: u32,
    height: u32,
    remaining: u64,
    index: u64,
    fail_after: Option<u64>,
    path: PathBuf,
    record: Arc<RwLock<MockRecord>>,
}

impl FrameSource for MockFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, WatermarkError> {
        if self.fail_after == Some(self.index) {
            return Err(WatermarkError::decode(&self.path, "Simulated decode failure"));
        }
        if self.remaining == 0 {
            return Ok(None);
        }

        let shade = (self.index % 256) as u8;
        let frame = Frame::from_fn(self.width, self.height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, shade])
        });

        self.remaining -= 1;
        self.index += 1;
        self.record.write().frames_read += 1;
        Ok(Some(frame))
    }

    fn close(self: Box<Self>) -> Result<(), WatermarkError> {
        self.record.write().sources_closed += 1;
        Ok(())
    }
}

struct MockFrameSink {
    file: File,
    width: u32,
    height: u32,
    written: u64,
    failure: Option<FailureStage>,
    path: PathBuf,
    record: Arc<RwLock<MockRecord>>,
    frames: Arc<RwLock<Vec<Frame>>>,
}

impl FrameSink for MockFrameSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), WatermarkError> {
        if self.failure == Some(FailureStage::Encode { after: self.written }) {
            return Err(WatermarkError::encode(&self.path, "Simulated encode failure"));
        }
        if frame.dimensions() != (self.width, self.height) {
            return Err(WatermarkError::encode(&self.path, "Frame size mismatch"));
        }

        writeln!(self.file, "frame {} {}x{}", self.written, frame.width(), frame.height())?;
        self.written += 1;
        self.record.write().frames_written += 1;
        self.frames.write().push(frame.clone());
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<(), WatermarkError> {
        if self.failure == Some(FailureStage::Finish) {
            return Err(WatermarkError::encode(&self.path, "Simulated finish failure"));
        }
        self.file.flush()?;
        self.record.write().sinks_finished += 1;
        Ok(())
    }
}
