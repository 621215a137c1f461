//! Per-request scratch files.
//!
//! A [`ConversionJob`] owns every path a single conversion touches. Dropping
//! it deletes them, on success, error and unwind alike.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug)]
pub struct ConversionJob {
    id: Uuid,
    dir: PathBuf,
    input: PathBuf,
    output: PathBuf,
}

impl ConversionJob {
    /// `safe_filename` must already be sanitized; it is joined onto `dir` as is.
    pub fn new(dir: &Path, safe_filename: &str) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            dir: dir.to_path_buf(),
            input: dir.join(format!("{id}_{safe_filename}")),
            output: dir.join(format!("{id}.pdf")),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn write_input(&self, bytes: &[u8]) -> Result<()> {
        std::fs::write(&self.input, bytes)
            .with_context(|| format!("writing upload to {}", self.input.display()))
    }

    fn cleanup(&self) {
        for path in [&self.input, &self.output] {
            if path.exists() {
                let _ = std::fs::remove_file(path);
            }
        }

        // Renderer leftovers: the un-moved `<id>_<stem>.pdf`, `.~lock.<id>_...#`.
        let needle = self.id.to_string();
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            if !entry.file_name().to_string_lossy().contains(&needle) {
                continue;
            }
            let path = entry.path();
            let _ = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
        }
        debug!(job_id = %self.id, "job files cleaned up");
    }
}

impl Drop for ConversionJob {
    fn drop(&mut self) {
        self.cleanup();
    }
}
