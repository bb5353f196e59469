//! Temporary native-format file produced by the system speech command

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::Result;

/// Owns a temporary audio file until it is discarded or persisted.
///
/// The file lives next to the requested output so a persist is a plain
/// rename on the same filesystem. Dropping the guard deletes the file.
#[derive(Debug)]
pub struct IntermediateArtifact {
    path: PathBuf,
    extension: String,
    armed: bool,
}

impl IntermediateArtifact {
    /// Reserve a unique path beside `target` carrying `extension`.
    /// Nothing is created on disk.
    pub fn allocate(target: &Path, extension: &str) -> Self {
        let dir = target.parent().unwrap_or_else(|| Path::new(""));
        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "speech".to_string());
        let name = format!(".{}-{}.{}", stem, Uuid::new_v4().simple(), extension);

        Self {
            path: dir.join(name),
            extension: extension.to_string(),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Native container extension, without the dot
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Size of the file, or `None` when it is missing or empty
    pub fn produced_size(&self) -> Option<u64> {
        std::fs::metadata(&self.path)
            .ok()
            .map(|m| m.len())
            .filter(|len| *len > 0)
    }

    /// Move the file to `dest`, handing ownership to the caller.
    /// If the rename fails the guard is dropped and the file deleted.
    pub fn persist(mut self, dest: &Path) -> Result<PathBuf> {
        std::fs::rename(&self.path, dest)?;
        self.armed = false;
        debug!("Persisted {} as {}", self.path.display(), dest.display());
        Ok(dest.to_path_buf())
    }

    /// Delete the file now
    pub fn discard(mut self) {
        self.remove();
        self.armed = false;
    }

    fn remove(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for IntermediateArtifact {
    fn drop(&mut self) {
        if self.armed {
            self.remove();
        }
    }
}
