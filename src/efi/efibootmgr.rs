// src/efi/efibootmgr.rs

//! Boot store backed by the `efibootmgr` tool
//!
//! Reads entries from `efibootmgr -v`, creates them with
//! `efibootmgr --create` against the disk and partition holding the mounted
//! EFI system partition, and deletes them with `--delete-bootnum`.

use super::entry::{BootEntry, BootNumber, BootSnapshot, DevicePath};
use super::BootStore;
use crate::error::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Device path node types that start the locator when no tab separates it
/// from the label (output of older efibootmgr releases)
const LOCATOR_MARKERS: &[&str] = &[
    "HD(",
    "PciRoot(",
    "File(",
    "VenHw(",
    "VenMedia(",
    "FvVol(",
    "FvFile(",
    "BBS(",
    "Uri(",
    "MAC(",
];

fn boot_line_regex() -> &'static Regex {
    static BOOT_LINE_RE: OnceLock<Regex> = OnceLock::new();
    BOOT_LINE_RE.get_or_init(|| {
        Regex::new(r"^Boot([0-9A-Fa-f]{4})(\*?)\s+(.*)$").expect("valid boot entry regex")
    })
}

/// Split the remainder of a `BootXXXX` line into label and locator
fn split_label_locator(rest: &str) -> (String, String) {
    if let Some((label, locator)) = rest.split_once('\t') {
        return (label.trim().to_string(), locator.trim().to_string());
    }

    let start = LOCATOR_MARKERS
        .iter()
        .filter_map(|marker| rest.find(marker))
        .min();

    match start {
        Some(idx) => (rest[..idx].trim().to_string(), rest[idx..].trim().to_string()),
        None => (rest.trim().to_string(), String::new()),
    }
}

/// Parse the output of `efibootmgr -v`
pub fn parse_efibootmgr_output(output: &str) -> Result<BootSnapshot> {
    let mut entries = Vec::new();
    let mut current = None;
    let mut order = Vec::new();

    for line in output.lines() {
        let line = line.trim_end();

        if let Some(value) = line.strip_prefix("BootCurrent:") {
            current = Some(value.parse::<BootNumber>()?);
        } else if let Some(value) = line.strip_prefix("BootOrder:") {
            order = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse::<BootNumber>)
                .collect::<Result<Vec<_>>>()?;
        } else if let Some(caps) = boot_line_regex().captures(line) {
            let number = caps[1].parse::<BootNumber>()?;
            let active = &caps[2] == "*";
            let (label, locator) = split_label_locator(&caps[3]);
            entries.push(BootEntry::new(number, label, locator).with_active(active));
        }
    }

    debug!("Parsed {} boot entries (current: {:?})", entries.len(), current);
    Ok(BootSnapshot::new(entries, current).with_boot_order(order))
}

/// Firmware boot store driving `efibootmgr`
#[derive(Debug, Clone)]
pub struct EfibootmgrStore {
    binary: PathBuf,
    esp_mount: PathBuf,
}

impl EfibootmgrStore {
    /// Use the `efibootmgr` found on `PATH`
    pub fn locate(esp_mount: impl Into<PathBuf>) -> Result<Self> {
        let binary = which::which("efibootmgr").map_err(|e| {
            Error::NotFoundError(format!("efibootmgr not found: {}. Is efibootmgr installed?", e))
        })?;
        Ok(Self::with_binary(binary, esp_mount))
    }

    /// Use a specific `efibootmgr` binary
    pub fn with_binary(binary: impl Into<PathBuf>, esp_mount: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            esp_mount: esp_mount.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn run(&self, args: &[&str]) -> std::result::Result<String, String> {
        debug!("Running {} {}", self.binary.display(), args.join(" "));

        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|e| format!("Failed to run {}: {}", self.binary.display(), e))?;

        if !output.status.success() {
            return Err(format!(
                "efibootmgr {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Disk and partition number holding the mounted ESP
    fn esp_device(&self) -> std::result::Result<(String, u32), String> {
        let mount = self.esp_mount.to_string_lossy().into_owned();
        let source = run_tool("findmnt", &["-n", "-o", "SOURCE", "--target", mount.as_str()])?;
        let source = source.trim();
        if source.is_empty() {
            return Err(format!("No filesystem found for {}", mount));
        }

        let device_name = Path::new(source)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("Unexpected ESP device '{}'", source))?;

        let partition_file = Path::new("/sys/class/block").join(device_name).join("partition");
        let partition = std::fs::read_to_string(&partition_file)
            .map_err(|e| format!("Failed to read {}: {}", partition_file.display(), e))?
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("Invalid partition number for {}: {}", source, e))?;

        let parent = run_tool("lsblk", &["-n", "-d", "-o", "PKNAME", source])?;
        let parent = parent.trim();
        if parent.is_empty() {
            return Err(format!("Could not determine the disk holding {}", source));
        }

        Ok((format!("/dev/{}", parent), partition))
    }

    /// Find an entry just written by `--create`
    ///
    /// The new number is only knowable from a fresh listing.
    fn created_entry(&self, label: &str, device_path: &DevicePath) -> Result<BootEntry> {
        let snapshot = self
            .enumerate()
            .map_err(|e| Error::FirmwareWriteError(format!("Entry created but not readable: {}", e)))?;

        self.find(&snapshot, device_path, label).ok_or_else(|| {
            Error::FirmwareWriteError(format!(
                "Entry '{}' for {} missing after creation",
                label, device_path
            ))
        })
    }
}

/// Arguments of `efibootmgr --create` for one loader
fn create_args<'a>(
    disk: &'a str,
    partition: &'a str,
    label: &'a str,
    device_path: &'a DevicePath,
) -> [&'a str; 9] {
    [
        "--create",
        "--disk",
        disk,
        "--part",
        partition,
        "--loader",
        device_path.as_str(),
        "--label",
        label,
    ]
}

fn run_tool(tool: &str, args: &[&str]) -> std::result::Result<String, String> {
    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|e| format!("Failed to run {}: {}", tool, e))?;

    if !output.status.success() {
        return Err(format!(
            "{} {} failed: {}",
            tool,
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

impl BootStore for EfibootmgrStore {
    fn enumerate(&self) -> Result<BootSnapshot> {
        let stdout = self.run(&["-v"]).map_err(Error::FirmwareQueryError)?;
        parse_efibootmgr_output(&stdout).map_err(|e| Error::FirmwareQueryError(e.to_string()))
    }

    fn add(&mut self, label: &str, device_path: &DevicePath) -> Result<BootEntry> {
        let (disk, partition) = self.esp_device().map_err(Error::FirmwareWriteError)?;
        let partition = partition.to_string();

        info!(
            "Creating UEFI boot entry '{}' for {} on {} partition {}",
            label, device_path, disk, partition
        );
        let args = create_args(&disk, &partition, label, device_path);
        self.run(&args).map_err(Error::FirmwareWriteError)?;

        self.created_entry(label, device_path)
    }

    fn remove(&mut self, boot_number: BootNumber) -> Result<()> {
        info!("Removing UEFI boot entry {}", boot_number.variable_name());
        let number = boot_number.to_string();
        self.run(&["--delete-bootnum", "--bootnum", number.as_str()])
            .map_err(Error::FirmwareWriteError)?;
        Ok(())
    }
}
