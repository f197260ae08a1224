use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

/// File mechanics used by the install and uninstall steps.
pub trait FileSystem: Send + Sync {
    /// Deletes `path`. A file that is already gone counts as removed.
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn copy(&self, src: &Path, dest: &Path) -> Result<()>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFileSystem;

impl FileSystem for SystemFileSystem {
    fn remove_file(&self, path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "file already removed");
                Ok(())
            }
            Err(err) => Err(err).with_context(|| format!("removing file {}", path.display())),
        }
    }

    fn copy(&self, src: &Path, dest: &Path) -> Result<()> {
        std::fs::copy(src, dest)
            .map(|_| ())
            .with_context(|| format!("copying {} to {}", src.display(), dest.display()))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path).with_context(|| format!("creating {}", path.display()))
    }
}

pub type SharedFileSystem = Arc<dyn FileSystem>;
