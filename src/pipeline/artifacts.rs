//! Per-invocation file paths and temp file cleanup.
//!
//! Every invocation derives its paths from one identifier. A
//! [`TempArtifacts`] guard owns the paths that must not outlive the
//! invocation and removes them on drop, so early returns and `?` clean up
//! the same way as the success path. Only the path handed to
//! [`TempArtifacts::keep`] survives.

use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::MediaKind;
use crate::config::StorageConfig;
use crate::constants::OUTPUT_PREFIX;

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
///
/// An identifier that ends up empty becomes `media`.
pub fn sanitize_id(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "media".to_string()
    } else {
        cleaned
    }
}

/// One identifier per input, distinct across the whole batch.
///
/// The identifier is the sanitized file stem. Inputs whose stems collide
/// (`a/IMG.jpg` and `b/IMG.jpg`, or `x.jpg` and `x.png`) get their position
/// in `inputs` appended, so concurrent invocations never share a path.
pub fn unique_ids<P: AsRef<Path>>(inputs: &[P]) -> Vec<String> {
    let stems: Vec<String> = inputs
        .iter()
        .map(|p| {
            let stem = p.as_ref().file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            sanitize_id(stem)
        })
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for stem in &stems {
        *counts.entry(stem.as_str()).or_default() += 1;
    }

    let mut used = HashSet::with_capacity(stems.len());
    stems
        .iter()
        .enumerate()
        .map(|(index, stem)| {
            let mut id = if counts[stem.as_str()] > 1 {
                format!("{}_{}", stem, index)
            } else {
                stem.clone()
            };
            while !used.insert(id.clone()) {
                id = format!("{}_{}", id, index);
            }
            id
        })
        .collect()
}

/// Paths used by one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub id: String,
    /// `<work_dir>/<id>.<ext>`
    pub input: PathBuf,
    /// `<work_dir>/watermarked_<id>.<ext>`
    pub output: PathBuf,
    /// `<temp_dir>/watermarked_<id>_temp.mp4`, frame-only video
    pub intermediate: PathBuf,
    /// `<temp_dir>/watermarked_<id>_final_temp.mp4`, video with audio
    pub final_temp: PathBuf,
}

impl ArtifactPaths {
    pub fn new(storage: &StorageConfig, id: &str, kind: MediaKind) -> Self {
        let id = sanitize_id(id);
        let ext = kind.extension();
        let stem = format!("{}{}", OUTPUT_PREFIX, id);

        Self {
            input: storage.work_dir.join(format!("{}.{}", id, ext)),
            output: storage.work_dir.join(format!("{}.{}", stem, ext)),
            intermediate: storage.temp_dir.join(format!("{}_temp.mp4", stem)),
            final_temp: storage.temp_dir.join(format!("{}_final_temp.mp4", stem)),
            id,
        }
    }

    /// Read the input from `input` instead of the staged location.
    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = input.into();
        self
    }

    /// Every path the engine may create for this invocation.
    pub fn produced(&self) -> [&Path; 3] {
        [&self.output, &self.intermediate, &self.final_temp]
    }
}

/// Scope guard deleting tracked files on drop.
#[derive(Debug, Default)]
pub struct TempArtifacts {
    tracked: Vec<PathBuf>,
}

impl TempArtifacts {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            tracked: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.tracked.push(path.into());
    }

    /// Stop tracking `path`; it survives the guard.
    pub fn keep(&mut self, path: &Path) {
        self.tracked.retain(|p| p != path);
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.tracked
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        for path in self.tracked.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed temp artifact"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to remove temp artifact"
                ),
            }
        }
    }
}

/// Move `from` to `to`, replacing `to`.
///
/// Falls back to copy and delete when a rename is not possible, e.g. across
/// filesystems.
pub fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(to) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    if let Err(e) = std::fs::rename(from, to) {
        tracing::debug!(
            from = %from.display(),
            to = %to.display(),
            error = %e,
            "Rename failed, copying instead"
        );
        std::fs::copy(from, to)?;
        std::fs::remove_file(from)?;
    }
    Ok(())
}
