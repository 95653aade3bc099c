//! Storage configuration types.
//!
//! Where inputs are staged and outputs written, and which file extensions are
//! accepted at all.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_ALLOWED_FORMATS, DEFAULT_TEMP_DIR, DEFAULT_WORK_DIR};

fn default_work_dir() -> PathBuf {
    PathBuf::from(DEFAULT_WORK_DIR)
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TEMP_DIR)
}

fn default_allowed_formats() -> Vec<String> {
    DEFAULT_ALLOWED_FORMATS
        .iter()
        .map(|f| f.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding staged inputs and watermarked outputs (default: downloads)
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Scratch directory (default: temp)
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Accepted file extensions, with leading dot
    #[serde(default = "default_allowed_formats")]
    pub allowed_formats: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            temp_dir: default_temp_dir(),
            allowed_formats: default_allowed_formats(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.work_dir.as_os_str().is_empty() {
            return Err("Storage work_dir cannot be empty".to_string());
        }

        for format in &self.allowed_formats {
            if !format.starts_with('.') {
                return Err(format!(
                    "Allowed format '{}' must start with '.'",
                    format
                ));
            }
        }

        Ok(())
    }

    /// Create the working directories if they do not exist yet.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [&self.work_dir, &self.temp_dir] {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }

    /// Whether the file extension of `path` is accepted (case-insensitive).
    pub fn is_allowed(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = format!(".{}", ext.to_ascii_lowercase());
        self.allowed_formats
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&ext))
    }
}
