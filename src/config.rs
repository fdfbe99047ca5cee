// src/config.rs

//! Configuration file
//!
//! # Example efiswap.toml
//!
//! ```toml
//! [efi]
//! esp_mount = "/boot/efi"
//! candidates = ["shimx64.efi", "grubx64.efi"]
//! efibootmgr = "/usr/sbin/efibootmgr"
//!
//! [report]
//! path = "/var/log/efiswap/report.jsonl"
//!
//! [lock]
//! path = "/run/efiswap.lock"
//!
//! [distro.eurolinux]
//! pretty_name = "EuroLinux"
//! efi_dir = "eurolinux"
//! ```
//!
//! Every section is optional; a missing file yields the defaults.

use crate::distro::{DistroCatalog, DistroId, DistroInfo};
use crate::efi::{EfiLayout, DEFAULT_CANDIDATES, DEFAULT_ESP_MOUNT};
use crate::lock::DEFAULT_LOCK_PATH;
use crate::report::DEFAULT_REPORT_PATH;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default path of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/efiswap/efiswap.toml";

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub efi: EfiConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub lock: LockConfig,

    /// Extra or overridden distributions, keyed by os-release ID
    #[serde(default)]
    pub distro: BTreeMap<String, DistroInfo>,
}

/// `[efi]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EfiConfig {
    /// Where the EFI system partition is mounted
    #[serde(default = "default_esp_mount")]
    pub esp_mount: PathBuf,

    /// Boot binary names, highest priority first
    #[serde(default = "default_candidates")]
    pub candidates: Vec<String>,

    /// Explicit efibootmgr binary; looked up on PATH when unset
    #[serde(default)]
    pub efibootmgr: Option<PathBuf>,
}

fn default_esp_mount() -> PathBuf {
    PathBuf::from(DEFAULT_ESP_MOUNT)
}

fn default_candidates() -> Vec<String> {
    DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect()
}

impl Default for EfiConfig {
    fn default() -> Self {
        Self {
            esp_mount: default_esp_mount(),
            candidates: default_candidates(),
            efibootmgr: None,
        }
    }
}

/// `[report]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    #[serde(default = "default_report_path")]
    pub path: PathBuf,
}

fn default_report_path() -> PathBuf {
    PathBuf::from(DEFAULT_REPORT_PATH)
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            path: default_report_path(),
        }
    }
}

/// `[lock]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockConfig {
    #[serde(default = "default_lock_path")]
    pub path: PathBuf,
}

fn default_lock_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOCK_PATH)
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            path: default_lock_path(),
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Whether `name` is a single normal path component
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}

impl Config {
    /// Load from `path`, or from the default location when `None`
    ///
    /// A missing default file is not an error; a missing explicit file is.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    debug!("No config at {}, using defaults", DEFAULT_CONFIG_PATH);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        debug!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.efi.esp_mount.is_absolute() {
            return Err(invalid("efi.esp_mount", "must be an absolute path"));
        }

        if self.efi.candidates.is_empty() {
            return Err(invalid("efi.candidates", "at least one boot binary is required"));
        }
        for name in &self.efi.candidates {
            if !is_plain_name(name) {
                return Err(invalid(
                    "efi.candidates",
                    format!("'{}' is not a plain file name", name),
                ));
            }
        }

        for (id, info) in &self.distro {
            if !is_plain_name(&info.efi_dir) {
                return Err(invalid(
                    &format!("distro.{}.efi_dir", id),
                    format!("'{}' is not a single directory name", info.efi_dir),
                ));
            }
            if info.pretty_name.trim().is_empty() {
                return Err(invalid(&format!("distro.{}.pretty_name", id), "must not be empty"));
            }
        }

        Ok(())
    }

    /// Built-in distributions merged with the `[distro.*]` sections
    pub fn catalog(&self) -> DistroCatalog {
        let mut catalog = DistroCatalog::builtin();
        for (id, info) in &self.distro {
            catalog.insert(DistroId::new(id), info.clone());
        }
        catalog
    }

    /// Path resolver for the configured ESP
    pub fn layout(&self) -> EfiLayout {
        EfiLayout::new(&self.efi.esp_mount, self.catalog())
            .with_candidates(self.efi.candidates.clone())
    }
}
