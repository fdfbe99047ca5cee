// src/report.rs

//! Post-run diagnostic reports
//!
//! Non-fatal problems (a leftover EFI directory, a stale boot entry) are not
//! errors of the conversion; they are handed to a [`ReportSink`] so an
//! administrator can follow up manually. Sinks never fail the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Default location of the JSON lines report file
pub const DEFAULT_REPORT_PATH: &str = "/var/log/efiswap/report.jsonl";

/// How urgently a report needs attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
}

/// Topic tags attached to a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Boot,
    Filesystem,
    Firmware,
}

/// A human readable finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub summary: String,
    pub severity: Severity,
    pub groups: Vec<Group>,
    /// Path or firmware variable the report is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl Report {
    pub fn new(title: impl Into<String>, summary: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            severity,
            groups: Vec::new(),
            related_resource: None,
            remediation: None,
        }
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.related_resource = Some(resource.into());
        self
    }

    pub fn with_remediation(mut self, hint: impl Into<String>) -> Self {
        self.remediation = Some(hint.into());
        self
    }
}

/// Receiver of diagnostic reports
pub trait ReportSink {
    /// Record a report; must not fail the caller
    fn report(&self, report: Report);
}

impl<T: ReportSink + ?Sized> ReportSink for &T {
    fn report(&self, report: Report) {
        (**self).report(report)
    }
}

fn log_report(report: &Report) {
    match report.severity {
        Severity::Info => info!("{}: {}", report.title, report.summary),
        Severity::Low | Severity::Medium => warn!("{}: {}", report.title, report.summary),
        Severity::High => error!("{}: {}", report.title, report.summary),
    }
}

/// Emits reports to the log only
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn report(&self, report: Report) {
        log_report(&report);
    }
}

/// Keeps reports in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: RefCell<Vec<Report>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.reports.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.borrow().is_empty()
    }
}

impl ReportSink for MemorySink {
    fn report(&self, report: Report) {
        log_report(&report);
        self.reports.borrow_mut().push(report);
    }
}

#[derive(Serialize)]
struct ReportLine<'a> {
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    report: &'a Report,
}

/// Appends reports as JSON lines to a file
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, report: &Report) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let line = ReportLine {
            timestamp: Utc::now(),
            report,
        };
        let json = serde_json::to_string(&line)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", json)
    }
}

impl ReportSink for JsonFileSink {
    fn report(&self, report: Report) {
        log_report(&report);
        if let Err(e) = self.append(&report) {
            error!(
                "Failed to write report '{}' to {}: {}",
                report.title,
                self.path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        Report::new("Leftover directory", "Remove it manually", Severity::Low)
            .with_group(Group::Boot)
            .with_resource("/boot/efi/EFI/centos")
    }

    #[test]
    fn test_memory_sink_collects() {
        let sink = MemorySink::new();
        sink.report(sample());
        sink.report(Report::new("Second", "Details", Severity::Info));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.reports()[0].severity, Severity::Low);
    }

    #[test]
    fn test_json_sink_appends_lines() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("logs/report.jsonl");
        let sink = JsonFileSink::new(&path);

        sink.report(sample());
        sink.report(sample().with_remediation("rm -rf /boot/efi/EFI/centos"));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["severity"], "low");
        assert_eq!(first["groups"][0], "boot");
        assert_eq!(first["related_resource"], "/boot/efi/EFI/centos");
        assert!(first.get("remediation").is_none());
        assert!(first["timestamp"].is_string());

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert!(second["remediation"].is_string());
    }

    #[test]
    fn test_json_sink_failure_is_swallowed() {
        let temp = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending
        let sink = JsonFileSink::new(temp.path());
        sink.report(sample());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::High);
        assert!(Severity::Info < Severity::Low);
    }
}
