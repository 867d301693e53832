use crate::domain::error::{AppError, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem area holding one retained raw upload per live dataset.
#[derive(Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_root(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }
        Ok(())
    }

    /// Write the raw upload under a timestamp-prefixed name so repeated
    /// uploads of the same filename never collide.
    pub fn save(
        &self,
        original_name: &str,
        bytes: &[u8],
        uploaded_at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        self.ensure_root()?;

        let stored_name = format!(
            "{}_{}",
            uploaded_at.format("%Y%m%d_%H%M%S"),
            sanitize_filename(original_name)
        );
        let path = self.root.join(stored_name);

        fs::write(&path, bytes)
            .map_err(|e| AppError::IoError(format!("Failed to save upload: {}", e)))?;

        Ok(path)
    }

    /// Remove a retained file. Idempotent: a file that is already gone is
    /// not an error.
    pub fn remove(&self, path: &str) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::IoError(format!(
                "Failed to remove upload file {}: {}",
                path, e
            ))),
        }
    }
}

/// Keep only the final path component of a client-supplied filename.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    if base.is_empty() {
        "upload.csv".to_string()
    } else {
        base.to_string()
    }
}
