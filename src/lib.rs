// src/lib.rs

//! efiswap
//!
//! Moves the UEFI boot configuration of a machine from one distribution to
//! another during an in-place conversion (for example CentOS Stream to
//! AlmaLinux) without leaving it unbootable.
//!
//! # Architecture
//!
//! - Firmware boot entries are reached through the [`efi::BootStore`] trait;
//!   `efibootmgr` in production, an in-memory store in tests
//! - Snapshots are immutable and re-read after every firmware write
//! - Only a missing target boot binary or a failed target entry write abort
//!   the run; cleanup failures become reports

pub mod config;
pub mod distro;
pub mod efi;
mod error;
pub mod filesystem;
pub mod firmware;
pub mod lock;
pub mod reconcile;
pub mod report;

pub use config::{Config, ConfigError, DEFAULT_CONFIG_PATH};
pub use distro::{DistroCatalog, DistroId, DistroInfo};
pub use efi::{
    BootEntry, BootNumber, BootSnapshot, BootStore, DevicePath, EfiLayout, EfibootmgrStore,
    MemoryBootStore,
};
pub use error::{Error, Result};
pub use filesystem::{DirectoryOps, HostFs};
pub use firmware::FirmwareMode;
pub use lock::ConversionLock;
pub use reconcile::{
    CleanupOutcome, ConversionError, ConversionRequest, ReconcileReport, ReconcileState,
    Reconciler,
};
pub use report::{JsonFileSink, LogSink, MemorySink, Report, ReportSink, Severity};
