// src/commands/entries.rs
//! Boot entry listing command

use super::{load_config, open_store};
use anyhow::Result;
use efiswap::{BootStore, FirmwareMode};
use std::path::Path;

pub fn cmd_entries(config: Option<&Path>, json: bool) -> Result<()> {
    let firmware = FirmwareMode::detect();
    if !firmware.is_efi() {
        anyhow::bail!("System is not booted through UEFI");
    }

    let config = load_config(config, None)?;
    let store = open_store(&config)?;
    let snapshot = store.enumerate()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    if snapshot.is_empty() {
        println!("No boot entries");
        return Ok(());
    }

    for entry in snapshot.entries() {
        let current = if Some(entry.boot_number) == snapshot.current_boot_number() {
            " [current]"
        } else {
            ""
        };
        println!("{}{}", entry, current);
    }

    if !snapshot.boot_order().is_empty() {
        let order: Vec<String> = snapshot.boot_order().iter().map(|n| n.to_string()).collect();
        println!("Boot order: {}", order.join(","));
    }

    Ok(())
}
