//! Video backend driving the `ffmpeg` and `ffprobe` executables.
//!
//! Frames travel as raw `rgb24` over pipes: the decoder writes them to its
//! stdout and the encoder reads them from its stdin. Child processes are
//! owned by their reader or writer and are killed and reaped on drop, so an
//! early return never leaves a running process behind.

use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Output, Stdio};
use std::thread::JoinHandle;

use super::backend::{FrameSink, FrameSource, MuxError, VideoBackend, VideoInfo};
use super::frame::Frame;
use super::probe::parse_probe_output;
use crate::error::WatermarkError;

/// Audio codec arguments tried in order when muxing.
const AUDIO_CODEC_ATTEMPTS: &[&[&str]] = &[&["-c:a", "copy"], &["-c:a", "aac", "-b:a", "192k"]];

/// Production backend built on the ffmpeg command-line tools.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use explicit executable paths instead of looking them up on `PATH`.
    pub fn with_binaries(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Whether both executables can be started.
    pub fn is_available(&self) -> bool {
        [&self.ffmpeg, &self.ffprobe].iter().all(|bin| {
            Command::new(bin)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|s| s.success())
                .unwrap_or(false)
        })
    }

    fn run_mux(&self, video: &Path, audio_source: &Path, output: &Path, codec: &[&str]) -> Result<Output, std::io::Error> {
        Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-y"])
            .arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio_source)
            .args(["-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy"])
            .args(codec)
            // Keep every video frame even when the audio track ends early
            .args(["-movflags", "+faststart"])
            .arg(output)
            .stdin(Stdio::null())
            .output()
    }
}

/// Map a spawn failure to a readable message.
fn spawn_error(bin: &Path, error: std::io::Error) -> String {
    if error.kind() == ErrorKind::NotFound {
        format!("{} was not found on PATH", bin.display())
    } else {
        format!("Failed to spawn {}: {}", bin.display(), error)
    }
}

/// Collect a child's stderr on a helper thread so a chatty process can never
/// block on a full pipe.
fn drain_stderr(child: &mut Child) -> Option<JoinHandle<String>> {
    let mut stderr = child.stderr.take()?;
    Some(std::thread::spawn(move || {
        let mut text = String::new();
        let _ = stderr.read_to_string(&mut text);
        text
    }))
}

fn join_stderr(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Kill and reap a child that is still running.
fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Fill `buf` from `reader`, returning how many bytes were read before EOF.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl VideoBackend for FfmpegBackend {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn probe(&self, input: &Path) -> Result<VideoInfo, WatermarkError> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(input)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| WatermarkError::decode(input, spawn_error(&self.ffprobe, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WatermarkError::decode(
                input,
                format!("ffprobe failed: {}", stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_probe_output(&stdout, input)
    }

    fn open_source(
        &self,
        input: &Path,
        info: &VideoInfo,
    ) -> Result<Box<dyn FrameSource>, WatermarkError> {
        let mut child = Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin"])
            .arg("-i")
            .arg(input)
            .args([
                "-map",
                "0:v:0",
                "-vsync",
                "passthrough",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "-",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| WatermarkError::decode(input, spawn_error(&self.ffmpeg, e)))?;

        let stderr = drain_stderr(&mut child);
        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                terminate(&mut child);
                return Err(WatermarkError::decode(input, "Failed to capture ffmpeg stdout"));
            }
        };

        tracing::debug!(
            input = %input.display(),
            width = info.width,
            height = info.height,
            "Started ffmpeg decoder"
        );

        Ok(Box::new(FfmpegFrameReader {
            child: Some(child),
            stdout: Some(stdout),
            stderr,
            width: info.width,
            height: info.height,
            path: input.to_path_buf(),
        }))
    }

    fn open_sink(
        &self,
        output: &Path,
        width: u32,
        height: u32,
        frame_rate: &str,
    ) -> Result<Box<dyn FrameSink>, WatermarkError> {
        let mut child = Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24"])
            .arg("-s:v")
            .arg(format!("{}x{}", width, height))
            .arg("-r")
            .arg(frame_rate)
            .args(["-i", "-", "-an"])
            .args([
                "-c:v",
                "libx264",
                "-preset",
                "veryfast",
                "-crf",
                "18",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ])
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| WatermarkError::encode(output, spawn_error(&self.ffmpeg, e)))?;

        let stderr = drain_stderr(&mut child);
        let stdin = match child.stdin.take() {
            Some(stdin) => stdin,
            None => {
                terminate(&mut child);
                return Err(WatermarkError::encode(output, "Failed to capture ffmpeg stdin"));
            }
        };

        tracing::debug!(
            output = %output.display(),
            width,
            height,
            frame_rate,
            "Started ffmpeg encoder"
        );

        Ok(Box::new(FfmpegFrameWriter {
            child: Some(child),
            stdin: Some(stdin),
            stderr,
            width,
            height,
            path: output.to_path_buf(),
        }))
    }

    fn mux_audio(&self, video: &Path, audio_source: &Path, output: &Path) -> Result<(), MuxError> {
        let mut last_error = String::new();

        for codec in AUDIO_CODEC_ATTEMPTS {
            let result = self.run_mux(video, audio_source, output, codec)?;
            if result.status.success() {
                tracing::debug!(output = %output.display(), codec = codec[1], "Muxed audio");
                return Ok(());
            }

            last_error = String::from_utf8_lossy(&result.stderr).trim().to_string();
            tracing::debug!(codec = codec[1], error = %last_error, "Audio mux attempt failed");

            // Drop the partial file before the next attempt
            match std::fs::remove_file(output) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(MuxError::Io(e)),
            }
        }

        Err(MuxError::Failed(last_error))
    }
}

/// Decoder process streaming raw frames.
struct FfmpegFrameReader {
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    path: PathBuf,
}

impl FrameSource for FfmpegFrameReader {
    fn next_frame(&mut self) -> Result<Option<Frame>, WatermarkError> {
        let stdout = match self.stdout.as_mut() {
            Some(stdout) => stdout,
            None => return Ok(None),
        };

        let mut buf = vec![0u8; self.width as usize * self.height as usize * 3];
        let filled = read_full(stdout, &mut buf)
            .map_err(|e| WatermarkError::decode(&self.path, format!("Failed to read frame: {}", e)))?;

        if filled < buf.len() {
            if filled > 0 {
                tracing::warn!(
                    path = %self.path.display(),
                    bytes = filled,
                    "Dropping truncated trailing frame"
                );
            }
            self.stdout = None;
            return Ok(None);
        }

        Frame::from_raw(self.width, self.height, buf)
            .map(Some)
            .ok_or_else(|| WatermarkError::decode(&self.path, "Frame buffer size mismatch"))
    }

    fn close(mut self: Box<Self>) -> Result<(), WatermarkError> {
        drop(self.stdout.take());

        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child
            .wait()
            .map_err(|e| WatermarkError::decode(&self.path, format!("Failed waiting for ffmpeg: {}", e)))?;
        let stderr = join_stderr(self.stderr.take());

        if !status.success() {
            return Err(WatermarkError::decode(
                &self.path,
                format!("ffmpeg decoder failed with status {}: {}", status, stderr),
            ));
        }
        Ok(())
    }
}

impl Drop for FfmpegFrameReader {
    fn drop(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            terminate(&mut child);
        }
    }
}

/// Encoder process consuming raw frames.
struct FfmpegFrameWriter {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    path: PathBuf,
}

impl FfmpegFrameWriter {
    /// Stop the encoder after a failed write and turn its stderr into an error.
    fn abort(&mut self, context: String) -> WatermarkError {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            terminate(&mut child);
        }
        let stderr = join_stderr(self.stderr.take());
        WatermarkError::encode(&self.path, format!("{}: {}", context, stderr))
    }
}

impl FrameSink for FfmpegFrameWriter {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), WatermarkError> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(WatermarkError::encode(
                &self.path,
                format!(
                    "Frame size mismatch: expected {}x{}, got {}x{}",
                    self.width,
                    self.height,
                    frame.width(),
                    frame.height()
                ),
            ));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| WatermarkError::encode(&self.path, "Encoder already closed"))?;

        if let Err(e) = stdin.write_all(frame.as_raw()) {
            return Err(self.abort(format!("Failed to write frame to ffmpeg: {}", e)));
        }
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<(), WatermarkError> {
        if let Some(mut stdin) = self.stdin.take() {
            if let Err(e) = stdin.flush() {
                return Err(self.abort(format!("Failed to flush ffmpeg stdin: {}", e)));
            }
        }

        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child
            .wait()
            .map_err(|e| WatermarkError::encode(&self.path, format!("Failed waiting for ffmpeg: {}", e)))?;
        let stderr = join_stderr(self.stderr.take());

        if !status.success() {
            return Err(WatermarkError::encode(
                &self.path,
                format!("ffmpeg encoder failed with status {}: {}", status, stderr),
            ));
        }
        Ok(())
    }
}

impl Drop for FfmpegFrameWriter {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            terminate(&mut child);
        }
    }
}
