use chrono::Local;
use serde::Serialize;
use serde_json::Error;

use datalens_core::{FileProfile, FileValidationReport, Status, ValidationReport};

use crate::Reporter;

/// Accumulates everything and serializes once in `on_summary`; the run's
/// progress hooks print nothing.
#[derive(Serialize)]
pub struct JsonFormatter {
    version: String,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<Status>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<FileValidationReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    profiles: Vec<FileProfile>,
}

impl JsonFormatter {
    pub fn new(version: String) -> Self {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        Self {
            version,
            timestamp,
            status: None,
            files: Vec::new(),
            profiles: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Reporter for JsonFormatter {
    fn on_start(&self) {}

    fn on_file_start(&self, _current: usize, _total: usize, _name: &str) {}

    fn on_file_report(&mut self, report: &FileValidationReport) {
        self.files.push(report.clone());
    }

    fn on_profile(&mut self, profile: &FileProfile) {
        self.profiles.push(profile.clone());
    }

    fn on_summary(&mut self, report: Option<&ValidationReport>) {
        if let Some(report) = report {
            self.status = Some(report.status);
        }
        match self.to_json() {
            Ok(json) => println!("{}", json),
            Err(error) => eprintln!("failed to serialize report: {}", error),
        }
    }
}

#[cfg(test)]
mod test {
    use datalens_core::{Severity, ValidationResult};

    use super::*;

    #[test]
    fn test_json_output_shape() {
        let mut formatter = JsonFormatter::new("0.1.0".to_string());
        formatter.on_file_report(&FileValidationReport::new(
            "orders.csv",
            vec![ValidationResult::passed("EmptyFileCheck", Severity::Error, 1)],
        ));

        let json = formatter.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], "0.1.0");
        assert_eq!(value["files"][0]["file_name"], "orders.csv");
        assert_eq!(value["files"][0]["status"], "PASSED");
        assert_eq!(value["files"][0]["results"][0]["verdict"], "PASSED");
    }
}
