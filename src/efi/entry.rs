// src/efi/entry.rs

//! Boot entry data model

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Firmware-assigned boot entry handle (`BootXXXX`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BootNumber(pub u16);

impl BootNumber {
    /// Name of the backing NVRAM variable, e.g. `Boot0003`
    pub fn variable_name(&self) -> String {
        format!("Boot{}", self)
    }
}

impl fmt::Display for BootNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

impl FromStr for BootNumber {
    type Err = Error;

    /// Parse the hexadecimal form used by efibootmgr (`0003`, `Boot0003`)
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let digits = s.strip_prefix("Boot").unwrap_or(s);
        if digits.is_empty() || digits.len() > 4 {
            return Err(Error::ParseError(format!("Invalid boot number '{}'", s)));
        }
        u16::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| Error::ParseError(format!("Invalid boot number '{}'", s)))
    }
}

/// Firmware file path of a boot binary, e.g. `\EFI\redhat\shimx64.efi`
///
/// Always rooted at the EFI system partition and backslash separated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DevicePath(String);

impl DevicePath {
    /// Wrap an already encoded device path
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if !path.starts_with('\\') {
            return Err(Error::PathError(format!(
                "Device path '{}' is not rooted at the EFI system partition",
                path
            )));
        }
        if path.contains('/') {
            return Err(Error::PathError(format!(
                "Device path '{}' contains a '/' separator",
                path
            )));
        }
        Ok(Self(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the file path part of a full firmware locator
    ///
    /// Handles both the `HD(...)/File(\EFI\...)` form and the bare
    /// `HD(...)/\EFI\...` form printed by newer efibootmgr releases.
    pub fn from_locator(locator: &str) -> Option<Self> {
        let raw = if let Some(start) = locator.find("File(") {
            let rest = &locator[start + "File(".len()..];
            &rest[..rest.find(')').unwrap_or(rest.len())]
        } else if let Some(start) = locator.find(")/\\") {
            let rest = &locator[start + 2..];
            rest.split_whitespace().next().unwrap_or("")
        } else if locator.starts_with('\\') {
            locator.split_whitespace().next().unwrap_or("")
        } else {
            return None;
        };

        Self::new(raw).ok()
    }

    /// Whether a firmware locator refers to this file
    ///
    /// FAT is case-insensitive, so the comparison is too.
    pub fn matches_locator(&self, locator: &str) -> bool {
        Self::from_locator(locator)
            .map(|found| found.0.eq_ignore_ascii_case(&self.0))
            .unwrap_or(false)
    }
}

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One firmware boot variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootEntry {
    pub boot_number: BootNumber,
    pub label: String,
    /// Opaque firmware locator of the boot binary
    pub binary_device_path: String,
    pub active: Option<bool>,
}

impl BootEntry {
    pub fn new(boot_number: BootNumber, label: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            boot_number,
            label: label.into(),
            binary_device_path: locator.into(),
            active: None,
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Whether this entry boots `path` under `label`
    pub fn points_at(&self, path: &DevicePath, label: &str) -> bool {
        self.label == label && path.matches_locator(&self.binary_device_path)
    }

    /// Whether `other` still describes the same firmware record
    ///
    /// Used before destructive operations: a boot number alone says nothing
    /// once firmware or another tool has rewritten the variable behind it.
    pub fn same_record(&self, other: &BootEntry) -> bool {
        self.boot_number == other.boot_number
            && self.label == other.label
            && self.binary_device_path == other.binary_device_path
            && self.active == other.active
    }
}

impl fmt::Display for BootEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.active {
            Some(true) => "*",
            _ => "",
        };
        write!(
            f,
            "{}{} {} ({})",
            self.boot_number.variable_name(),
            marker,
            self.label,
            self.binary_device_path
        )
    }
}

/// Point-in-time enumeration of the firmware boot entries
///
/// Any add or remove makes a snapshot stale; take a new one instead of
/// patching an old one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootSnapshot {
    entries: BTreeMap<BootNumber, BootEntry>,
    current_boot_number: Option<BootNumber>,
    boot_order: Vec<BootNumber>,
}

impl BootSnapshot {
    pub fn new(
        entries: impl IntoIterator<Item = BootEntry>,
        current_boot_number: Option<BootNumber>,
    ) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.boot_number, e)).collect(),
            current_boot_number,
            boot_order: Vec::new(),
        }
    }

    pub fn with_boot_order(mut self, order: Vec<BootNumber>) -> Self {
        self.boot_order = order;
        self
    }

    pub fn get(&self, number: BootNumber) -> Option<&BootEntry> {
        self.entries.get(&number)
    }

    pub fn entries(&self) -> impl Iterator<Item = &BootEntry> {
        self.entries.values()
    }

    pub fn current_boot_number(&self) -> Option<BootNumber> {
        self.current_boot_number
    }

    /// The entry the running session booted from, if still present
    pub fn current_entry(&self) -> Option<&BootEntry> {
        self.current_boot_number.and_then(|n| self.entries.get(&n))
    }

    pub fn boot_order(&self) -> &[BootNumber] {
        &self.boot_order
    }

    /// First entry booting `path` under `label`
    pub fn find(&self, path: &DevicePath, label: &str) -> Option<&BootEntry> {
        self.entries().find(|e| e.points_at(path, label))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_number_parse_and_display() {
        assert_eq!("0003".parse::<BootNumber>().unwrap(), BootNumber(3));
        assert_eq!("Boot001A".parse::<BootNumber>().unwrap(), BootNumber(0x1a));
        assert_eq!(BootNumber(0x1a).to_string(), "001A");
        assert_eq!(BootNumber(2).variable_name(), "Boot0002");
        assert!("zz".parse::<BootNumber>().is_err());
        assert!("12345".parse::<BootNumber>().is_err());
        assert!("".parse::<BootNumber>().is_err());
    }

    #[test]
    fn test_device_path_rejects_unrooted() {
        assert!(DevicePath::new("EFI\\redhat\\shimx64.efi").is_err());
        assert!(DevicePath::new("/boot/efi/EFI/redhat/shimx64.efi").is_err());
        assert!(DevicePath::new("\\EFI\\redhat\\shimx64.efi").is_ok());
    }

    #[test]
    fn test_locator_file_form() {
        let locator = "HD(1,GPT,0a1b2c3d-0000-0000-0000-000000000000,0x800,0x12c000)/File(\\EFI\\redhat\\shimx64.efi)";
        let path = DevicePath::from_locator(locator).unwrap();
        assert_eq!(path.as_str(), "\\EFI\\redhat\\shimx64.efi");
    }

    #[test]
    fn test_locator_bare_form() {
        let locator = "HD(1,GPT,0a1b2c3d-0000-0000-0000-000000000000,0x800,0x12c000)/\\EFI\\fedora\\shimx64.efi";
        let path = DevicePath::new("\\EFI\\fedora\\shimx64.efi").unwrap();
        assert!(path.matches_locator(locator));
    }

    #[test]
    fn test_locator_case_insensitive() {
        let path = DevicePath::new("\\EFI\\almalinux\\shimx64.efi").unwrap();
        assert!(path.matches_locator("HD(1)/File(\\EFI\\AlmaLinux\\SHIMX64.EFI)"));
        assert!(!path.matches_locator("HD(1)/File(\\EFI\\almalinux\\grubx64.efi)"));
        assert!(!path.matches_locator("PciRoot(0x0)/Pci(0x1,0x1)/Ata(0,0,0)"));
    }

    #[test]
    fn test_same_record_detects_changes() {
        let original = BootEntry::new(BootNumber(1), "CentOS Stream", "HD(1)/File(\\EFI\\centos\\shimx64.efi)")
            .with_active(true);
        assert!(original.same_record(&original.clone()));

        let relabeled = BootEntry {
            label: "AlmaLinux".to_string(),
            ..original.clone()
        };
        assert!(!original.same_record(&relabeled));

        let deactivated = original.clone().with_active(false);
        assert!(!original.same_record(&deactivated));
    }

    #[test]
    fn test_snapshot_find_and_current() {
        let a = BootEntry::new(BootNumber(1), "CentOS Stream", "HD(1)/File(\\EFI\\centos\\shimx64.efi)");
        let b = BootEntry::new(BootNumber(2), "AlmaLinux", "HD(1)/File(\\EFI\\almalinux\\shimx64.efi)");
        let snapshot = BootSnapshot::new([a.clone(), b.clone()], Some(BootNumber(1)));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.current_entry(), Some(&a));

        let path = DevicePath::new("\\EFI\\almalinux\\shimx64.efi").unwrap();
        assert_eq!(snapshot.find(&path, "AlmaLinux"), Some(&b));
        assert_eq!(snapshot.find(&path, "CentOS Stream"), None);
    }
}
