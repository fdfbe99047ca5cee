// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use efiswap::{
    BootEntry, BootNumber, DevicePath, DirectoryOps, DistroCatalog, DistroInfo, EfiLayout,
    HostFs, MemoryBootStore,
};
use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Catalog with two test distributions plus one sharing distroA's directory
pub fn test_catalog() -> DistroCatalog {
    DistroCatalog::empty()
        .with("distroa", DistroInfo::new("Distro A Linux", "distroa"))
        .with("distrob", DistroInfo::new("Distro B Linux", "distrob"))
        .with("distroa-clone", DistroInfo::new("Distro A Clone", "distroa"))
}

/// A temporary EFI system partition
pub struct Esp {
    pub dir: TempDir,
}

impl Esp {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// `<esp>/EFI/<name>`
    pub fn efi_dir(&self, name: &str) -> PathBuf {
        self.root().join("EFI").join(name)
    }

    /// Create `<esp>/EFI/<dir>/<file>`
    pub fn with_binary(self, dir: &str, file: &str) -> Self {
        let path = self.efi_dir(dir);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join(file), b"MZ").unwrap();
        self
    }

    pub fn layout(&self) -> EfiLayout {
        EfiLayout::new(self.root(), test_catalog())
    }
}

pub fn device_path(dir: &str, file: &str) -> DevicePath {
    DevicePath::new(format!("\\EFI\\{}\\{}", dir, file)).unwrap()
}

/// The entry distroA was booted from
pub fn source_entry(number: u16) -> BootEntry {
    BootEntry::new(
        BootNumber(number),
        "Distro A Linux",
        MemoryBootStore::locator_for(&device_path("distroa", "shimx64.efi")),
    )
    .with_active(true)
}

/// Store holding the distroA entry as the current boot entry
pub fn source_store() -> MemoryBootStore {
    MemoryBootStore::new()
        .with_entry(source_entry(1))
        .with_current(BootNumber(1))
}

/// Filesystem wrapper that records removals and can refuse them
#[derive(Default)]
pub struct RecordingFs {
    pub removed: RefCell<Vec<PathBuf>>,
    pub deny: Option<PathBuf>,
}

impl RecordingFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail removal of `path` with a permission error
    pub fn denying(path: impl Into<PathBuf>) -> Self {
        Self {
            removed: RefCell::new(Vec::new()),
            deny: Some(path.into()),
        }
    }

    pub fn removal_count(&self) -> usize {
        self.removed.borrow().len()
    }
}

impl DirectoryOps for RecordingFs {
    fn exists(&self, path: &Path) -> bool {
        HostFs.exists(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        if self.deny.as_deref() == Some(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "Permission denied (os error 13)",
            ));
        }
        HostFs.remove_dir_all(path)?;
        self.removed.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}
