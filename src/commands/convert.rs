// src/commands/convert.rs
//! Boot entry conversion command

use super::{load_config, open_store};
use anyhow::{Context, Result};
use efiswap::reconcile::{CleanupOutcome, NotApplicableReason};
use efiswap::{
    distro, Config, ConversionLock, ConversionRequest, DistroId, FirmwareMode, HostFs, JsonFileSink,
    ReconcileReport, Reconciler,
};
use std::path::PathBuf;
use tracing::info;

/// Options for `efiswap convert`
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub config: Option<PathBuf>,
    pub source: Option<String>,
    pub target: String,
    pub esp_mount: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub json: bool,
}

pub fn cmd_convert(opts: ConvertOptions) -> Result<()> {
    let mut config = load_config(opts.config.as_deref(), opts.esp_mount.as_deref())?;
    if let Some(report) = &opts.report {
        config.report.path = report.clone();
    }

    let source = match &opts.source {
        Some(id) => DistroId::new(id),
        None => distro::detect_current().context("Cannot determine the source distribution")?,
    };
    let request = ConversionRequest::new(source, DistroId::new(&opts.target));

    let firmware = FirmwareMode::detect();

    // Nothing to change means nothing to lock or query either
    if let Some(reason) = request.not_applicable(firmware) {
        return print_report(&ReconcileReport::not_applicable(reason), &config, opts.json);
    }

    let _lock = ConversionLock::acquire_or_fail(&config.lock.path)
        .with_context(|| format!("Failed to take the conversion lock {}", config.lock.path.display()))?;

    info!(
        "Converting boot configuration from {} to {} ({} firmware)",
        request.source, request.target, firmware
    );

    let store = open_store(&config)?;
    let sink = JsonFileSink::new(&config.report.path);
    let mut reconciler = Reconciler::new(store, HostFs, sink, config.layout());

    let report = reconciler
        .run(&request, firmware)
        .context("UEFI boot entry conversion failed")?;

    print_report(&report, &config, opts.json)
}

fn print_report(report: &ReconcileReport, config: &Config, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_summary(report, &config.report.path);
    }
    Ok(())
}

fn describe(outcome: Option<&CleanupOutcome>) -> String {
    match outcome {
        Some(CleanupOutcome::Completed) => "removed".to_string(),
        Some(CleanupOutcome::Skipped(reason)) => format!("skipped ({:?})", reason),
        Some(CleanupOutcome::Failed(reason)) => format!("failed: {}", reason),
        None => "not attempted".to_string(),
    }
}

fn print_summary(report: &ReconcileReport, report_path: &std::path::Path) {
    if let Some(reason) = report.not_applicable {
        match reason {
            NotApplicableReason::SameDistro => {
                println!("Source and target distribution are the same, nothing to do")
            }
            NotApplicableReason::NotEfiBooted => {
                println!("System is not booted through UEFI, nothing to do")
            }
        }
        return;
    }

    if let Some(target) = &report.target_entry {
        let action = if target.created { "Created" } else { "Reused" };
        println!("{} boot entry: {}", action, target.entry);
    }
    println!(
        "  Source EFI directory: {}",
        describe(report.source_directory.as_ref())
    );
    println!(
        "  Source boot entry: {}",
        describe(report.source_entry.as_ref())
    );

    if report.diagnostics > 0 {
        println!(
            "{} issue(s) need manual follow-up, see {}",
            report.diagnostics,
            report_path.display()
        );
    }
}
