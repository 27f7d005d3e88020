// src/staging.rs - Scoped temporary storage for uploaded video
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;

/// Uploaded media written to the temp dir. The file is removed when the
/// guard drops, whichever way the pipeline exits.
#[derive(Debug)]
pub struct StagedVideo {
    path: PathBuf,
}

impl StagedVideo {
    pub fn write_in(dir: impl AsRef<Path>, content: &[u8], extension: &str) -> Result<Self> {
        let path = dir
            .as_ref()
            .join(format!("form_analyzer_{}.{}", uuid::Uuid::new_v4(), extension));

        // Guard exists before the write so a failed write is still cleaned up.
        let staged = Self { path };
        fs::write(&staged.path, content)?;
        debug!("Staged {} bytes at {}", content.len(), staged.path.display());
        Ok(staged)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedVideo {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!("Failed to remove staged video {}: {}", self.path.display(), e);
            }
        }
    }
}
