// src/reconcile/outcome.rs

//! Reconciliation states, outcomes and fatal errors

use crate::distro::DistroId;
use crate::efi::BootEntry;
use crate::error::Error;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Reconciliation state machine phases
///
/// ```text
/// NotApplicable
/// TargetEntryPending -> TargetEntryReady -> SourceDirectoryPending -> SourceEntryPending -> Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReconcileState {
    /// Same distro or not EFI-booted; nothing was touched
    NotApplicable,
    /// Looking for the target boot binary
    TargetEntryPending,
    /// Creating or reusing the target boot entry
    TargetEntryReady,
    /// Removing the source EFI directory
    SourceDirectoryPending,
    /// Removing the source boot entry
    SourceEntryPending,
    /// Finished, possibly with reported cleanup failures
    Done,
}

impl ReconcileState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NotApplicable | Self::Done)
    }
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotApplicable => "not-applicable",
            Self::TargetEntryPending => "target-entry-pending",
            Self::TargetEntryReady => "target-entry-ready",
            Self::SourceDirectoryPending => "source-directory-pending",
            Self::SourceEntryPending => "source-entry-pending",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Why nothing had to be done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotApplicableReason {
    SameDistro,
    NotEfiBooted,
}

/// Why a cleanup step was skipped without a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The source EFI directory does not exist
    DirectoryMissing,
    /// Source and target share one EFI directory
    SharedDirectory,
    /// The running session's boot entry is unknown
    NoCurrentEntry,
    /// The source entry disappeared after the target entry was written
    EntryVanished,
    /// The boot number now holds a different record
    EntryChanged,
    /// The current boot entry is the target entry itself
    IsTargetEntry,
}

/// Result of a best-effort cleanup step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CleanupOutcome {
    Completed,
    Skipped(SkipReason),
    /// Failed and reported; the run still completes
    Failed(String),
}

impl CleanupOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// The boot entry the target distro will boot from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetEntry {
    pub entry: BootEntry,
    /// False when an identical entry already existed
    pub created: bool,
}

/// Summary of one reconciliation run
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub state: ReconcileState,
    /// Every state entered, in order
    pub visited: Vec<ReconcileState>,
    pub not_applicable: Option<NotApplicableReason>,
    pub target_entry: Option<TargetEntry>,
    pub source_directory: Option<CleanupOutcome>,
    pub source_entry: Option<CleanupOutcome>,
    /// Number of reports handed to the sink
    pub diagnostics: usize,
}

impl ReconcileReport {
    pub fn not_applicable(reason: NotApplicableReason) -> Self {
        Self {
            state: ReconcileState::NotApplicable,
            visited: vec![ReconcileState::NotApplicable],
            not_applicable: Some(reason),
            target_entry: None,
            source_directory: None,
            source_entry: None,
            diagnostics: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == ReconcileState::Done
    }
}

/// Which kind of fatal failure stopped the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalClass {
    /// No usable boot binary for the target
    TargetPath,
    /// The target boot entry could not be established
    TargetWrite,
}

/// Failures that abort the conversion
///
/// The source entry and directory are left in place so the machine can
/// still boot the old system.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Unable to detect any UEFI binary file for {distro} in {}", directory.display())]
    BootPathMissing { distro: DistroId, directory: PathBuf },

    #[error("Cannot determine the UEFI boot path for {distro}: {source}")]
    InvalidBootPath {
        distro: DistroId,
        #[source]
        source: Error,
    },

    #[error("Failed to read UEFI boot entries before adding the target entry: {0}")]
    FirmwareQuery(#[source] Error),

    #[error("Failed to add UEFI boot entry for the target system: {0}")]
    FirmwareWrite(#[source] Error),
}

impl ConversionError {
    pub fn class(&self) -> FatalClass {
        match self {
            Self::BootPathMissing { .. } | Self::InvalidBootPath { .. } => FatalClass::TargetPath,
            Self::FirmwareQuery(_) | Self::FirmwareWrite(_) => FatalClass::TargetWrite,
        }
    }
}
