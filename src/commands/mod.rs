// src/commands/mod.rs
//! Command handlers for the efiswap CLI

mod convert;
mod entries;
mod resolve;

pub use convert::{cmd_convert, ConvertOptions};
pub use entries::cmd_entries;
pub use resolve::cmd_resolve;

use anyhow::{Context, Result};
use efiswap::{Config, EfibootmgrStore};
use std::path::Path;

/// Load the configuration, applying an ESP mount override
pub(crate) fn load_config(path: Option<&Path>, esp_mount: Option<&Path>) -> Result<Config> {
    let mut config = Config::load(path).context("Failed to load configuration")?;
    if let Some(mount) = esp_mount {
        config.efi.esp_mount = mount.to_path_buf();
        config
            .validate()
            .context("Invalid --esp-mount")?;
    }
    Ok(config)
}

/// Build the efibootmgr-backed store
pub(crate) fn open_store(config: &Config) -> Result<EfibootmgrStore> {
    let esp = config.efi.esp_mount.clone();
    match &config.efi.efibootmgr {
        Some(binary) => Ok(EfibootmgrStore::with_binary(binary, esp)),
        None => EfibootmgrStore::locate(esp).context("Cannot manage UEFI boot entries"),
    }
}
