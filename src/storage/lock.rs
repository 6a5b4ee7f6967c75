//! Single-writer lease on a team directory.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::StorageError;

/// Held for the whole extract → store → recompute span of a mutating run.
/// Released on drop.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
}

impl StoreLock {
    /// Take the lock, failing fast if another run holds it.
    pub fn acquire(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(mut file) => {
                writeln!(file, "pid={}", std::process::id())?;
                writeln!(file, "acquired={}", chrono::Utc::now().to_rfc3339())?;
                debug!("Acquired lock {:?}", path);
                Ok(Self {
                    path: path.to_path_buf(),
                })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StorageError::Locked(path.to_path_buf()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Released lock {:?}", self.path),
            Err(e) => warn!("Failed to release lock {:?}: {}", self.path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_is_exclusive_and_released() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("team").join(".ledger.lock");

        let lock = StoreLock::acquire(&path).unwrap();
        assert!(path.exists());
        assert_eq!(lock.path(), path.as_path());

        let second = StoreLock::acquire(&path);
        assert!(matches!(second, Err(StorageError::Locked(_))));

        drop(lock);
        assert!(!path.exists());
        assert!(StoreLock::acquire(&path).is_ok());
    }
}
