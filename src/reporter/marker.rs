//! Completion marker
//!
//! Written once the attempt loop has finished. While it exists the reporter
//! does nothing, so a supervisor restarting it within the same boot cannot
//! cause repeat submissions. It belongs on a tmpfs (e.g. `/run`) so a reboot
//! clears it.

use crate::common::{now_local, Result};
use crate::common::utils::STORAGE_TIME_FORMAT;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CompletionMarker {
    path: PathBuf,
}

impl CompletionMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_set(&self) -> bool {
        self.path.exists()
    }

    /// Create the marker (and its parent directories), recording when.
    pub fn set(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(
            &self.path,
            format!("{}\n", now_local().format(STORAGE_TIME_FORMAT)),
        )?;
        Ok(())
    }
}
