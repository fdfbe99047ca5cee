// src/filesystem/mod.rs

//! Filesystem operations used during boot entry reconciliation
//!
//! Only two operations are needed: checking whether a distro's EFI
//! directory exists and removing it recursively. They sit behind
//! [`DirectoryOps`] so removal failures can be exercised without root.

use std::io;
use std::path::Path;
use tracing::debug;

/// Directory existence check and recursive removal
pub trait DirectoryOps {
    fn exists(&self, path: &Path) -> bool;

    /// Remove `path` and everything below it
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFs;

impl DirectoryOps for HostFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        debug!("Removing directory tree {}", path.display());
        std::fs::remove_dir_all(path)
    }
}

impl<T: DirectoryOps + ?Sized> DirectoryOps for &T {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        (**self).remove_dir_all(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_fs_removes_tree() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("EFI/centos");
        std::fs::create_dir_all(dir.join("fonts")).unwrap();
        std::fs::write(dir.join("shimx64.efi"), b"shim").unwrap();

        assert!(HostFs.exists(&dir));
        HostFs.remove_dir_all(&dir).unwrap();
        assert!(!HostFs.exists(&dir));
        assert!(HostFs.exists(&temp.path().join("EFI")));
    }

    #[test]
    fn test_host_fs_missing_directory_errors() {
        let temp = tempfile::tempdir().unwrap();
        let err = HostFs.remove_dir_all(&temp.path().join("missing")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
