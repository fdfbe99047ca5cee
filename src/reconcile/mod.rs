// src/reconcile/mod.rs

//! Boot entry reconciliation
//!
//! Moves the firmware boot configuration from the source distribution to
//! the target distribution in an order that always leaves something
//! bootable:
//!
//! 1. Skip entirely when source and target are the same or the machine is
//!    not EFI-booted.
//! 2. Find the target boot binary (fatal if missing).
//! 3. Create the target boot entry, or reuse an identical one (fatal on
//!    failure; the source entry and directory stay as a fallback).
//! 4. Remove the source EFI directory (reported on failure).
//! 5. Re-read the boot entries and remove the entry the system booted from,
//!    but only if it is still the exact record seen in step 3 (reported on
//!    failure).
//!
//! Firmware may add or drop entries on its own when EFI directories or boot
//! variables change, so step 5 never reuses the snapshot from step 3 for
//! anything but comparison.

mod outcome;

pub use outcome::{
    CleanupOutcome, ConversionError, FatalClass, NotApplicableReason, ReconcileReport,
    ReconcileState, SkipReason, TargetEntry,
};

use crate::distro::DistroId;
use crate::efi::{BootNumber, BootSnapshot, BootStore, EfiLayout};
use crate::filesystem::DirectoryOps;
use crate::firmware::FirmwareMode;
use crate::report::{Group, Report, ReportSink, Severity};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// Which distribution is being converted into which
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub source: DistroId,
    pub target: DistroId,
}

impl ConversionRequest {
    pub fn new(source: impl Into<DistroId>, target: impl Into<DistroId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Why no boot entry changes are needed, if any
    pub fn not_applicable(&self, firmware: FirmwareMode) -> Option<NotApplicableReason> {
        if self.source == self.target {
            Some(NotApplicableReason::SameDistro)
        } else if !firmware.is_efi() {
            Some(NotApplicableReason::NotEfiBooted)
        } else {
            None
        }
    }
}

/// Drives one reconciliation run against a boot store, filesystem and sink
pub struct Reconciler<S, F, R> {
    store: S,
    fs: F,
    sink: R,
    layout: EfiLayout,
}

/// Per-run bookkeeping
struct Run {
    visited: Vec<ReconcileState>,
    diagnostics: usize,
}

impl Run {
    fn enter(&mut self, state: ReconcileState) {
        debug!("Boot entry reconciliation: {}", state);
        self.visited.push(state);
    }
}

impl<S: BootStore, F: DirectoryOps, R: ReportSink> Reconciler<S, F, R> {
    pub fn new(store: S, fs: F, sink: R, layout: EfiLayout) -> Self {
        Self {
            store,
            fs,
            sink,
            layout,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn sink(&self) -> &R {
        &self.sink
    }

    pub fn layout(&self) -> &EfiLayout {
        &self.layout
    }

    pub fn into_parts(self) -> (S, F, R) {
        (self.store, self.fs, self.sink)
    }

    /// Run the reconciliation to a terminal state
    pub fn run(
        &mut self,
        request: &ConversionRequest,
        firmware: FirmwareMode,
    ) -> Result<ReconcileReport, ConversionError> {
        if let Some(reason) = request.not_applicable(firmware) {
            match reason {
                NotApplicableReason::SameDistro => debug!(
                    "Source and target distro are both '{}', no boot entry changes needed",
                    request.source
                ),
                NotApplicableReason::NotEfiBooted => {
                    debug!("System is not booted through UEFI, skipping boot entry changes")
                }
            }
            return Ok(ReconcileReport::not_applicable(reason));
        }

        let mut run = Run {
            visited: Vec::new(),
            diagnostics: 0,
        };

        run.enter(ReconcileState::TargetEntryPending);
        let (original, target_entry) = self.ensure_target_entry(&request.target)?;

        run.enter(ReconcileState::TargetEntryReady);
        info!(
            "Target boot entry {} ({})",
            target_entry.entry,
            if target_entry.created { "created" } else { "already present" }
        );

        run.enter(ReconcileState::SourceDirectoryPending);
        let source_directory = self.remove_source_directory(request, &mut run);

        run.enter(ReconcileState::SourceEntryPending);
        let source_entry = self.remove_source_entry(&original, &target_entry, &mut run);

        run.enter(ReconcileState::Done);
        Ok(ReconcileReport {
            state: ReconcileState::Done,
            visited: run.visited,
            not_applicable: None,
            target_entry: Some(target_entry),
            source_directory: Some(source_directory),
            source_entry: Some(source_entry),
            diagnostics: run.diagnostics,
        })
    }

    /// Steps 2 and 3: find the target binary and make sure an entry boots it
    ///
    /// Returns the snapshot taken before any write along with the entry.
    fn ensure_target_entry(
        &mut self,
        target: &DistroId,
    ) -> Result<(BootSnapshot, TargetEntry), ConversionError> {
        let invalid = |source: crate::error::Error| ConversionError::InvalidBootPath {
            distro: target.clone(),
            source,
        };

        let device_path = match self.layout.resolve_target_binary(target).map_err(invalid)? {
            Some(path) => path,
            None => {
                let directory = self.layout.efi_directory_for(target).map_err(invalid)?;
                return Err(ConversionError::BootPathMissing {
                    distro: target.clone(),
                    directory,
                });
            }
        };

        let label = self
            .layout
            .catalog()
            .pretty_name(target)
            .map_err(invalid)?
            .to_string();

        let original = self
            .store
            .enumerate()
            .map_err(ConversionError::FirmwareQuery)?;

        if let Some(entry) = self.store.find(&original, &device_path, &label) {
            debug!("The '{}' UEFI boot entry is already present", label);
            return Ok((
                original,
                TargetEntry {
                    entry,
                    created: false,
                },
            ));
        }

        info!("Adding UEFI boot entry '{}' for {}", label, device_path);
        let entry = self
            .store
            .add(&label, &device_path)
            .map_err(ConversionError::FirmwareWrite)?;

        Ok((
            original,
            TargetEntry {
                entry,
                created: true,
            },
        ))
    }

    /// Step 4: delete the source distro's EFI directory
    fn remove_source_directory(
        &self,
        request: &ConversionRequest,
        run: &mut Run,
    ) -> CleanupOutcome {
        let source_dir = match self.layout.efi_directory_for(&request.source) {
            Ok(dir) => dir,
            Err(e) => {
                error!("Cannot determine the source EFI directory: {}", e);
                self.emit(
                    run,
                    Report::new(
                        "Failed to remove source system EFI directory",
                        format!(
                            "The EFI directory of '{}' could not be determined: {}. \
                             Remove the directory manually if present.",
                            request.source, e
                        ),
                        Severity::Low,
                    )
                    .with_group(Group::Boot),
                );
                return CleanupOutcome::Failed(e.to_string());
            }
        };

        if !self.fs.exists(&source_dir) {
            debug!(
                "Source distro EFI directory at {} does not exist, skipping removal",
                source_dir.display()
            );
            return CleanupOutcome::Skipped(SkipReason::DirectoryMissing);
        }

        // The target succeeded in step 3, so its directory resolves
        let shared = self
            .layout
            .efi_directory_for(&request.target)
            .map(|target_dir| target_dir == source_dir)
            .unwrap_or(false);
        if shared {
            debug!(
                "Source and target distros use the same '{}' EFI directory",
                source_dir.display()
            );
            return CleanupOutcome::Skipped(SkipReason::SharedDirectory);
        }

        match self.fs.remove_dir_all(&source_dir) {
            Ok(()) => {
                info!("Deleted source system EFI directory at {}", source_dir.display());
                CleanupOutcome::Completed
            }
            Err(e) => {
                error!(
                    "Failed to remove the source system EFI directory at {}: {}",
                    source_dir.display(),
                    e
                );
                self.emit(
                    run,
                    Report::new(
                        "Failed to remove source system EFI directory",
                        format!(
                            "Removal of the source system EFI directory at {} failed: {}. \
                             Remove the directory manually if present.",
                            source_dir.display(),
                            e
                        ),
                        Severity::Low,
                    )
                    .with_group(Group::Boot)
                    .with_group(Group::Filesystem)
                    .with_resource(source_dir.display().to_string())
                    .with_remediation(format!("rm -rf {}", source_dir.display())),
                );
                CleanupOutcome::Failed(e.to_string())
            }
        }
    }

    /// Step 5: delete the entry the system booted from, if still unchanged
    fn remove_source_entry(
        &mut self,
        original: &BootSnapshot,
        target: &TargetEntry,
        run: &mut Run,
    ) -> CleanupOutcome {
        let Some(number) = original.current_boot_number() else {
            debug!("The current boot entry is unknown, skipping source entry removal");
            return CleanupOutcome::Skipped(SkipReason::NoCurrentEntry);
        };

        if number == target.entry.boot_number {
            debug!(
                "The current boot entry {} is the target entry, keeping it",
                number.variable_name()
            );
            return CleanupOutcome::Skipped(SkipReason::IsTargetEntry);
        }

        let fresh = match self.store.enumerate() {
            Ok(snapshot) => snapshot,
            Err(e) => return self.entry_removal_failed(run, number, e.to_string()),
        };

        let Some(current) = fresh.get(number) else {
            debug!(
                "The currently booted source distro EFI boot entry has been already \
                 removed since the target entry has been added, skipping removal"
            );
            return CleanupOutcome::Skipped(SkipReason::EntryVanished);
        };

        let unchanged = original
            .get(number)
            .is_some_and(|recorded| recorded.same_record(current));
        if !unchanged {
            debug!(
                "The boot entry with current bootnum has changed since the target \
                 distro entry has been added, skipping removal"
            );
            return CleanupOutcome::Skipped(SkipReason::EntryChanged);
        }

        match self.store.remove(number) {
            Ok(()) => {
                info!("Removed source distro UEFI boot entry {}", current);
                CleanupOutcome::Completed
            }
            Err(e) => self.entry_removal_failed(run, number, e.to_string()),
        }
    }

    fn entry_removal_failed(
        &self,
        run: &mut Run,
        number: BootNumber,
        reason: String,
    ) -> CleanupOutcome {
        error!("Failed to remove source distro EFI boot entry: {}", reason);
        // Some firmware (OVMF among others) drops entries whose binary is
        // gone, so a leftover entry is only worth a low severity note.
        self.emit(
            run,
            Report::new(
                "Failed to remove source system EFI boot entry",
                format!(
                    "Removal of the source system UEFI boot entry failed: {}. \
                     Check UEFI boot entries and manually remove it if it's still present.",
                    reason
                ),
                Severity::Low,
            )
            .with_group(Group::Boot)
            .with_group(Group::Firmware)
            .with_resource(number.variable_name())
            .with_remediation(format!("efibootmgr --delete-bootnum --bootnum {}", number)),
        );
        CleanupOutcome::Failed(reason)
    }

    fn emit(&self, run: &mut Run, report: Report) {
        run.diagnostics += 1;
        self.sink.report(report);
    }
}
