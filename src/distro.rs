// src/distro.rs

//! Distribution identity
//!
//! Maps distribution identifiers (the `ID=` field of os-release) to the
//! display name used for boot entry labels and to the directory name each
//! distribution uses under `<ESP>/EFI/`.
//!
//! Several distributions share an EFI directory (Oracle Linux installs into
//! `EFI/redhat`), which the reconciler must treat as "nothing to remove".

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Default location of the os-release file
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Fallback os-release location used by some minimal images
pub const OS_RELEASE_FALLBACK_PATH: &str = "/usr/lib/os-release";

/// A distribution identifier such as `rhel` or `almalinux`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistroId(String);

impl DistroId {
    /// Create an identifier, normalizing to lowercase
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DistroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DistroId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Boot-relevant facts about one distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistroInfo {
    /// Human readable name, used as the boot entry label
    pub pretty_name: String,
    /// Directory name under `<ESP>/EFI/`
    pub efi_dir: String,
}

impl DistroInfo {
    pub fn new(pretty_name: impl Into<String>, efi_dir: impl Into<String>) -> Self {
        Self {
            pretty_name: pretty_name.into(),
            efi_dir: efi_dir.into(),
        }
    }
}

/// Lookup table of known distributions
#[derive(Debug, Clone)]
pub struct DistroCatalog {
    entries: BTreeMap<DistroId, DistroInfo>,
}

impl Default for DistroCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DistroCatalog {
    /// Catalog with the distributions supported out of the box
    pub fn builtin() -> Self {
        let known = [
            ("rhel", "Red Hat Enterprise Linux", "redhat"),
            ("centos", "CentOS Stream", "centos"),
            ("almalinux", "AlmaLinux", "almalinux"),
            ("rocky", "Rocky Linux", "rocky"),
            ("ol", "Oracle Linux", "redhat"),
            ("fedora", "Fedora Linux", "fedora"),
        ];

        let entries = known
            .iter()
            .map(|(id, name, dir)| (DistroId::new(id), DistroInfo::new(*name, *dir)))
            .collect();

        Self { entries }
    }

    /// Catalog with no entries
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace a distribution
    pub fn insert(&mut self, id: DistroId, info: DistroInfo) {
        debug!("Registering distro {} (EFI directory '{}')", id, info.efi_dir);
        self.entries.insert(id, info);
    }

    pub fn with(mut self, id: impl Into<DistroId>, info: DistroInfo) -> Self {
        self.insert(id.into(), info);
        self
    }

    /// Look up a distribution
    pub fn get(&self, id: &DistroId) -> Result<&DistroInfo> {
        self.entries
            .get(id)
            .ok_or_else(|| Error::NotFoundError(format!("Unknown distribution '{}'", id)))
    }

    /// Display name for a distribution, used as the boot entry label
    pub fn pretty_name(&self, id: &DistroId) -> Result<&str> {
        self.get(id).map(|info| info.pretty_name.as_str())
    }

    /// Directory name under `<ESP>/EFI/`
    pub fn efi_dir_name(&self, id: &DistroId) -> Result<&str> {
        self.get(id).map(|info| info.efi_dir.as_str())
    }

    pub fn ids(&self) -> impl Iterator<Item = &DistroId> {
        self.entries.keys()
    }
}

/// Read the running distribution's `ID` from os-release
pub fn detect_current() -> Result<DistroId> {
    let path = [OS_RELEASE_PATH, OS_RELEASE_FALLBACK_PATH]
        .into_iter()
        .map(Path::new)
        .find(|p| p.exists())
        .ok_or_else(|| Error::NotFoundError("No os-release file found".to_string()))?;

    read_os_release_id(path)
}

/// Read the `ID` field of an os-release file
pub fn read_os_release_id(path: &Path) -> Result<DistroId> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
    parse_os_release_id(&content)
}

/// Extract the `ID` field from os-release content
pub fn parse_os_release_id(content: &str) -> Result<DistroId> {
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        if let Some(value) = line.strip_prefix("ID=") {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if value.is_empty() {
                break;
            }
            return Ok(DistroId::new(value));
        }
    }

    Err(Error::ParseError("os-release has no ID field".to_string()))
}
