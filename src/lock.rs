// src/lock.rs

//! System-wide exclusive lock for conversion runs
//!
//! Boot variable writes are not safe to interleave: two runs could race on
//! boot number assignment or remove each other's freshly written entries.
//! A run holds this lock from before the first enumeration until it exits.
//!
//! # Example
//!
//! ```ignore
//! use efiswap::lock::ConversionLock;
//!
//! let _lock = ConversionLock::try_acquire("/run/efiswap.lock")?
//!     .ok_or("another conversion is running")?;
//!
//! // ... reconcile boot entries ...
//!
//! // Lock automatically released on drop
//! ```

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default lock file location
pub const DEFAULT_LOCK_PATH: &str = "/run/efiswap.lock";

/// Exclusive `flock` held for the lifetime of the value
pub struct ConversionLock {
    /// Kept open to hold the lock
    file: File,
    path: PathBuf,
}

impl ConversionLock {
    /// Try to acquire the lock without blocking
    ///
    /// Returns:
    /// - `Ok(Some(lock))` if the lock was acquired
    /// - `Ok(None)` if another process holds it
    /// - `Err` on I/O errors
    pub fn try_acquire<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                info!("Acquired conversion lock at {:?}", path);
                Ok(Some(Self { file, path }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                debug!("Conversion lock already held at {:?}", path);
                Ok(None)
            }
            Err(e) => Err(Error::IoError(format!(
                "Failed to try-acquire conversion lock: {}",
                e
            ))),
        }
    }

    /// Acquire the lock or fail with `Error::LockHeld`
    pub fn acquire_or_fail<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        Self::try_acquire(path)?.ok_or_else(|| {
            Error::LockHeld(format!(
                "another conversion is running (lock file {})",
                path.display()
            ))
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ConversionLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        debug!("Released conversion lock at {:?}", self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_is_exclusive() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("run/efiswap.lock");

        let first = ConversionLock::try_acquire(&path).unwrap();
        assert!(first.is_some());

        // flock is per open file description, so a second open conflicts
        assert!(ConversionLock::try_acquire(&path).unwrap().is_none());
        assert!(matches!(
            ConversionLock::acquire_or_fail(&path),
            Err(Error::LockHeld(_))
        ));

        drop(first);
        assert!(ConversionLock::try_acquire(&path).unwrap().is_some());
    }
}
