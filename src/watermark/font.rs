//! Font resolution with an embedded fallback.
//!
//! Candidates are tried in configuration order. A candidate given as a bare
//! file name is looked up as-is first and then in the platform font
//! directories. When nothing loads, the embedded DejaVu Sans Mono is used and
//! a warning is logged; resolution itself never fails.

use ab_glyph::{FontArc, PxScale};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::constants::FONT_SEARCH_DIRS;

static EMBEDDED_FONT: OnceLock<FontArc> = OnceLock::new();

/// Embedded font data (DejaVu Sans Mono, free license).
const EMBEDDED_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSansMono.ttf");

/// Get the embedded font, initializing it lazily.
pub fn embedded_font() -> FontArc {
    EMBEDDED_FONT
        .get_or_init(|| {
            FontArc::try_from_slice(EMBEDDED_FONT_DATA)
                .expect("Failed to load embedded font - this is a bug")
        })
        .clone()
}

/// Where a resolved font came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    File(PathBuf),
    Embedded,
}

/// A font bound to a pixel size.
#[derive(Clone)]
pub struct SizedFont {
    pub font: FontArc,
    pub scale: PxScale,
    pub source: FontSource,
}

impl std::fmt::Debug for SizedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizedFont")
            .field("px", &self.scale.y)
            .field("source", &self.source)
            .finish()
    }
}

impl SizedFont {
    /// Same font at another pixel size.
    pub fn rescaled(&self, px: f32) -> Self {
        Self {
            font: self.font.clone(),
            scale: PxScale::from(px),
            source: self.source.clone(),
        }
    }

    pub fn px(&self) -> f32 {
        self.scale.y
    }
}

/// Ordered font candidate search.
#[derive(Debug, Clone)]
pub struct FontResolver {
    candidates: Vec<PathBuf>,
    search_dirs: Vec<PathBuf>,
}

impl FontResolver {
    pub fn new<S: AsRef<str>>(candidates: &[S]) -> Self {
        Self {
            candidates: candidates
                .iter()
                .map(|c| PathBuf::from(c.as_ref()))
                .collect(),
            search_dirs: FONT_SEARCH_DIRS.iter().map(PathBuf::from).collect(),
        }
    }

    /// Replace the directories searched for bare file names.
    pub fn with_search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = dirs;
        self
    }

    /// Resolve the first loadable candidate at `px` pixels.
    pub fn resolve(&self, px: f32) -> SizedFont {
        for candidate in &self.candidates {
            for path in self.locations(candidate) {
                if let Some(font) = load_font(&path) {
                    tracing::debug!(font = %path.display(), px, "Resolved watermark font");
                    return SizedFont {
                        font,
                        scale: PxScale::from(px),
                        source: FontSource::File(path),
                    };
                }
            }
        }

        tracing::warn!(
            candidates = self.candidates.len(),
            "No configured font could be loaded, using embedded fallback font"
        );
        SizedFont {
            font: embedded_font(),
            scale: PxScale::from(px),
            source: FontSource::Embedded,
        }
    }

    fn locations(&self, candidate: &Path) -> Vec<PathBuf> {
        let mut paths = vec![candidate.to_path_buf()];
        let is_bare_name = candidate.parent().map_or(true, |p| p.as_os_str().is_empty());
        if is_bare_name {
            paths.extend(self.search_dirs.iter().map(|dir| dir.join(candidate)));
        }
        paths
    }
}

fn load_font(path: &Path) -> Option<FontArc> {
    let data = std::fs::read(path).ok()?;
    match FontArc::try_from_vec(data) {
        Ok(font) => Some(font),
        Err(e) => {
            tracing::debug!(font = %path.display(), error = %e, "Skipping unparsable font");
            None
        }
    }
}
