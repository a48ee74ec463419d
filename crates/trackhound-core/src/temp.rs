//! Temporary artifact naming and cleanup

use chrono::Local;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Allocates unique artifact paths under one directory and owns their deletion.
#[derive(Debug, Clone)]
pub struct TempArtifactManager {
    root: PathBuf,
}

impl TempArtifactManager {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for a new artifact: `<prefix>_<timestamp>_<uuid>.<ext>`.
    ///
    /// The file is not created.
    pub fn allocate(&self, prefix: &str, extension: &str) -> PathBuf {
        let extension = extension.trim_start_matches('.');
        let name = format!(
            "{}_{}_{}.{}",
            prefix,
            Local::now().format("%Y%m%d%H%M%S"),
            Uuid::new_v4().simple(),
            extension
        );
        self.root.join(name)
    }

    /// Reserve an artifact path that is deleted on drop unless persisted.
    ///
    /// Creates the root directory if it does not exist yet.
    pub fn pending(&self, prefix: &str, extension: &str) -> io::Result<PendingArtifact> {
        self.ensure_root()?;
        Ok(PendingArtifact {
            path: self.allocate(prefix, extension),
            armed: true,
        })
    }

    /// Scratch directory for work that may leave partial files behind.
    ///
    /// Removed with its contents when the returned guard is dropped.
    pub fn scratch_dir(&self, prefix: &str) -> io::Result<tempfile::TempDir> {
        self.ensure_root()?;
        tempfile::Builder::new()
            .prefix(&format!("{}_", prefix))
            .tempdir_in(&self.root)
    }

    /// Create the root directory and any missing parents
    pub fn ensure_root(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    /// Delete an artifact. A missing file is not an error.
    pub async fn release(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!("Released artifact: {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete {}: {}", path.display(), e),
        }
    }
}

/// An artifact being written.
///
/// Dropping it removes whatever was written, including when the surrounding
/// future is cancelled mid-transfer.
#[derive(Debug)]
pub struct PendingArtifact {
    path: PathBuf,
    armed: bool,
}

impl PendingArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file and hand its path to the caller.
    pub fn persist(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for PendingArtifact {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Discarded partial artifact: {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete {}: {}", self.path.display(), e),
        }
    }
}

impl Default for TempArtifactManager {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_unique_and_prefixed() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempArtifactManager::new(dir.path().to_path_buf());

        let a = manager.allocate("ytdlp", "mp3");
        let b = manager.allocate("ytdlp", ".mp3");
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(dir.path()));

        let name = b.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("ytdlp_"));
        assert!(name.ends_with(".mp3"));
        assert!(!name.contains(".."));
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempArtifactManager::new(dir.path().to_path_buf());
        let path = manager.allocate("scrape", "mp3");
        tokio::fs::write(&path, b"audio").await.unwrap();

        manager.release(&path).await;
        assert!(!path.exists());
        manager.release(&path).await;
        manager.release(&dir.path().join("never-existed.mp3")).await;
    }

    #[test]
    fn test_pending_artifact_is_removed_unless_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempArtifactManager::new(dir.path().to_path_buf());

        let dropped = manager.pending("scrape", "mp3").unwrap();
        let dropped_path = dropped.path().to_path_buf();
        std::fs::write(&dropped_path, b"partial").unwrap();
        drop(dropped);
        assert!(!dropped_path.exists());

        let kept = manager.pending("scrape", "mp3").unwrap();
        std::fs::write(kept.path(), b"complete").unwrap();
        let kept_path = kept.persist();
        assert!(kept_path.exists());

        // never written
        drop(manager.pending("scrape", "mp3").unwrap());
    }

    #[test]
    fn test_pending_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("trackhound").join("artifacts");
        let manager = TempArtifactManager::new(root.clone());

        let artifact = manager.pending("scrape", "mp3").unwrap();
        assert!(root.is_dir());
        std::fs::write(artifact.path(), b"audio").unwrap();
        assert_eq!(artifact.path().parent(), Some(root.as_path()));
    }

    #[test]
    fn test_scratch_dir_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let manager = TempArtifactManager::new(dir.path().join("nested"));
        let scratch = manager.scratch_dir("ytdlp").unwrap();
        let scratch_path = scratch.path().to_path_buf();
        std::fs::write(scratch_path.join("partial.webm.part"), b"x").unwrap();

        drop(scratch);
        assert!(!scratch_path.exists());
    }
}
