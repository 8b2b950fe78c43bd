//! Validation result model.
//!
//! Each rule execution ends in exactly one `ValidationResult`; a file's
//! results roll up into a `FileValidationReport` whose status is derived,
//! never set directly.

use serde::{Deserialize, Serialize};

/// How much a failure weighs on the file status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Outcome of one rule. `NotRun` covers fail-fast skips and rules blocked by
/// a load failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Passed,
    Failed,
    NotRun,
}

/// Rolled-up status of a file or a whole job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Passed,
    Warning,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub rule_name: String,
    pub severity: Severity,
    pub verdict: Verdict,
    pub failed_count: u64,
    pub total_count: u64,
    pub sample_failures: Vec<String>,
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn passed(rule_name: impl Into<String>, severity: Severity, total_count: u64) -> Self {
        Self {
            rule_name: rule_name.into(),
            severity,
            verdict: Verdict::Passed,
            failed_count: 0,
            total_count,
            sample_failures: Vec::new(),
            message: None,
        }
    }

    pub fn failed(
        rule_name: impl Into<String>,
        severity: Severity,
        failed_count: u64,
        total_count: u64,
        sample_failures: Vec<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            severity,
            verdict: Verdict::Failed,
            failed_count,
            total_count,
            sample_failures,
            message: Some(message.into()),
        }
    }

    /// A rule that could not execute at all counts as one failure with its
    /// error text as the message.
    pub fn from_error(
        rule_name: impl Into<String>,
        severity: Severity,
        error: impl std::fmt::Display,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            severity,
            verdict: Verdict::Failed,
            failed_count: 1,
            total_count: 0,
            sample_failures: Vec::new(),
            message: Some(error.to_string()),
        }
    }

    pub fn not_run(rule_name: impl Into<String>, severity: Severity) -> Self {
        Self {
            rule_name: rule_name.into(),
            severity,
            verdict: Verdict::NotRun,
            failed_count: 0,
            total_count: 0,
            sample_failures: Vec::new(),
            message: None,
        }
    }

    pub fn is_error_failure(&self) -> bool {
        self.verdict == Verdict::Failed && self.severity == Severity::Error
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileValidationReport {
    pub file_name: String,
    pub status: Status,
    pub results: Vec<ValidationResult>,
}

impl FileValidationReport {
    pub fn new(file_name: impl Into<String>, results: Vec<ValidationResult>) -> Self {
        let status = derive_status(&results);
        Self {
            file_name: file_name.into(),
            status,
            results,
        }
    }
}

/// FAILED if any ERROR rule failed, WARNING if only WARNING or INFO rules
/// failed, PASSED otherwise. NotRun results never affect the status.
pub fn derive_status(results: &[ValidationResult]) -> Status {
    let mut status = Status::Passed;
    for result in results {
        if result.verdict != Verdict::Failed {
            continue;
        }
        match result.severity {
            Severity::Error => return Status::Failed,
            Severity::Warning | Severity::Info => status = Status::Warning,
        }
    }
    status
}

/// Job-level roll-up across files.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub status: Status,
    pub files: Vec<FileValidationReport>,
}

impl ValidationReport {
    pub fn new(files: Vec<FileValidationReport>) -> Self {
        let status = files
            .iter()
            .map(|f| f.status)
            .max()
            .unwrap_or(Status::Passed);
        Self { status, files }
    }
}
