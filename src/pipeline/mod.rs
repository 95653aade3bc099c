//! Watermarking pipelines and their entry point.
//!
//! [`Watermarker`] owns the validated configuration, the font resolver and the
//! video backend, and dispatches each invocation to the image or video
//! pipeline by [`MediaKind`]. Invocations are independent and may run on
//! several threads at once.

use clap::ValueEnum;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

pub mod artifacts;
pub mod photo;
pub mod video;

pub use artifacts::{move_file, sanitize_id, unique_ids, ArtifactPaths, TempArtifacts};

use crate::config::Config;
use crate::error::{Result, WatermarkError};
use crate::video::{FfmpegBackend, VideoBackend};
use crate::watermark::FontResolver;

/// Kind of media being watermarked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    Photo,
    Video,
    /// Round video message; frames are cropped to a centered square
    VideoNote,
}

impl MediaKind {
    /// Extension of staged inputs and of outputs
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Photo => "jpg",
            MediaKind::Video | MediaKind::VideoNote => "mp4",
        }
    }

    pub fn is_video(&self) -> bool {
        !matches!(self, MediaKind::Photo)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Photo => write!(f, "photo"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::VideoNote => write!(f, "video-note"),
        }
    }
}

/// Entry point of the watermark engine.
#[derive(Clone)]
pub struct Watermarker {
    config: Arc<Config>,
    fonts: FontResolver,
    backend: Arc<dyn VideoBackend>,
}

impl fmt::Debug for Watermarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watermarker")
            .field("config", &self.config)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl Watermarker {
    /// Validate `config` and use the ffmpeg backend for videos.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_backend(config, Arc::new(FfmpegBackend::new()))
    }

    pub fn with_backend(config: Config, backend: Arc<dyn VideoBackend>) -> Result<Self> {
        config.validate().map_err(WatermarkError::Config)?;
        let fonts = FontResolver::new(&config.watermark.fonts);

        Ok(Self {
            config: Arc::new(config),
            fonts,
            backend,
        })
    }

    /// Replace the font resolver, e.g. to change its search directories.
    pub fn with_fonts(mut self, fonts: FontResolver) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Paths used when watermarking the staged input `id`.
    pub fn paths(&self, id: &str, kind: MediaKind) -> ArtifactPaths {
        ArtifactPaths::new(&self.config.storage, id, kind)
    }

    /// Watermark the input staged at `<work_dir>/<id>.<ext>`.
    ///
    /// Returns the output path, the only file the invocation leaves behind.
    /// The input is left untouched.
    pub fn process(&self, kind: MediaKind, id: &str) -> Result<PathBuf> {
        self.process_with_rng(kind, id, &mut rand::thread_rng())
    }

    /// Like [`Watermarker::process`] with an explicit source of randomness
    /// for image placement.
    pub fn process_with_rng<R: Rng + ?Sized>(
        &self,
        kind: MediaKind,
        id: &str,
        rng: &mut R,
    ) -> Result<PathBuf> {
        let paths = self.paths(id, kind);
        self.run(kind, &paths, rng)
    }

    /// Watermark a file at an arbitrary location, naming the output after the
    /// file stem.
    pub fn process_path(&self, kind: MediaKind, input: &Path) -> Result<PathBuf> {
        let id = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        self.process_path_as(kind, input, id)
    }

    /// Watermark a file at an arbitrary location under the identifier `id`.
    ///
    /// The input is read in place and never moved or deleted. Callers running
    /// several invocations at once must give each a distinct `id`, see
    /// [`unique_ids`].
    pub fn process_path_as(&self, kind: MediaKind, input: &Path, id: &str) -> Result<PathBuf> {
        if !self.config.storage.is_allowed(input) {
            return Err(WatermarkError::Unsupported(format!(
                "{} is not an accepted format",
                input.display()
            )));
        }

        let paths = self.paths(id, kind).with_input(input);
        self.run(kind, &paths, &mut rand::thread_rng())
    }

    fn run<R: Rng + ?Sized>(&self, kind: MediaKind, paths: &ArtifactPaths, rng: &mut R) -> Result<PathBuf> {
        let started = Instant::now();
        tracing::debug!(id = %paths.id, %kind, input = %paths.input.display(), "Processing media");

        let result = match kind {
            MediaKind::Photo => photo::process_image(&self.config.watermark, &self.fonts, paths, rng),
            MediaKind::Video | MediaKind::VideoNote => video::process_video(
                self.backend.as_ref(),
                &self.config.watermark,
                &self.fonts,
                paths,
                kind == MediaKind::VideoNote,
            ),
        };

        match &result {
            Ok(output) => tracing::info!(
                id = %paths.id,
                %kind,
                output = %output.display(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Watermarking complete"
            ),
            Err(e) => tracing::error!(
                id = %paths.id,
                %kind,
                error = %e,
                "Watermarking failed"
            ),
        }

        result
    }
}
