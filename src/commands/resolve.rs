// src/commands/resolve.rs
//! Boot binary resolution command

use super::load_config;
use anyhow::Result;
use efiswap::DistroId;
use std::path::Path;

pub fn cmd_resolve(config: Option<&Path>, distro: &str, esp_mount: Option<&Path>) -> Result<()> {
    let config = load_config(config, esp_mount)?;
    let layout = config.layout();
    let distro = DistroId::new(distro);

    let pretty_name = layout.catalog().pretty_name(&distro)?;
    let efi_dir = layout.efi_directory_for(&distro)?;

    println!("Distribution: {} ({})", pretty_name, distro);
    println!("  EFI directory: {}", efi_dir.display());
    println!("  Candidates: {}", layout.candidates().join(", "));

    match layout.resolve_target_binary(&distro)? {
        Some(path) => println!("  Boot binary: {}", path),
        None => println!("  Boot binary: none found"),
    }

    Ok(())
}
