// src/firmware.rs

//! Firmware mode detection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Directory the kernel exposes when booted through UEFI
pub const EFI_SYSFS_PATH: &str = "/sys/firmware/efi";

/// How the running system was booted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirmwareMode {
    Efi,
    Bios,
}

impl FirmwareMode {
    /// Detect the firmware mode of the running system
    pub fn detect() -> Self {
        Self::detect_at(Path::new(EFI_SYSFS_PATH))
    }

    /// Detect using an alternate sysfs location
    pub fn detect_at(efi_sysfs: &Path) -> Self {
        if efi_sysfs.is_dir() {
            Self::Efi
        } else {
            Self::Bios
        }
    }

    pub fn is_efi(&self) -> bool {
        matches!(self, Self::Efi)
    }
}

impl fmt::Display for FirmwareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Efi => write!(f, "efi"),
            Self::Bios => write!(f, "bios"),
        }
    }
}
