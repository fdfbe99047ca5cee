// src/efi/mod.rs

//! UEFI boot entries and the firmware boot store
//!
//! The firmware NVRAM boot variables are a system-wide shared resource that
//! firmware itself may rewrite at any time (some implementations create or
//! drop entries for directories under `\EFI`). Everything here works on
//! immutable [`BootSnapshot`]s; callers take a fresh one after every write.
//!
//! - [`BootStore`]: enumerate / add / remove / find
//! - [`EfibootmgrStore`]: production store backed by `efibootmgr`
//! - [`MemoryBootStore`]: in-memory store for tests and dry runs
//! - [`EfiLayout`]: distro EFI directories and device path conversion

mod efibootmgr;
mod entry;
mod memory;
mod path;

pub use efibootmgr::{parse_efibootmgr_output, EfibootmgrStore};
pub use entry::{BootEntry, BootNumber, BootSnapshot, DevicePath};
pub use memory::{FirmwareEffect, MemoryBootStore};
pub use path::{DistroEfiLayout, EfiLayout, DEFAULT_CANDIDATES, DEFAULT_ESP_MOUNT};

use crate::error::Result;

/// Access to the firmware boot variable store
pub trait BootStore {
    /// Take a fresh snapshot of all boot entries
    ///
    /// Fails with `Error::FirmwareQueryError` when the store is unreadable.
    fn enumerate(&self) -> Result<BootSnapshot>;

    /// Create a boot entry and return it with its assigned boot number
    ///
    /// Fails with `Error::FirmwareWriteError`.
    fn add(&mut self, label: &str, device_path: &DevicePath) -> Result<BootEntry>;

    /// Delete a boot entry
    ///
    /// Fails with `Error::FirmwareWriteError`.
    fn remove(&mut self, boot_number: BootNumber) -> Result<()>;

    /// Find an entry in `snapshot` booting `device_path` under `label`
    fn find(
        &self,
        snapshot: &BootSnapshot,
        device_path: &DevicePath,
        label: &str,
    ) -> Option<BootEntry> {
        snapshot.find(device_path, label).cloned()
    }
}
