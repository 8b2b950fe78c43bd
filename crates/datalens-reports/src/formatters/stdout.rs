use datalens_core::{FileProfile, FileValidationReport, Status, ValidationReport, Verdict};

use crate::{utils::numbers::format_numbers, Reporter};

pub struct StdOutFormatter {
    intro: String,
    intro_len: usize,
}

impl StdOutFormatter {
    pub fn new(version: String) -> Self {
        let s = format!("DataLens v{} - Report", version);
        let n = s.len();
        Self {
            intro: s,
            intro_len: n,
        }
    }

    fn status_label(status: Status) -> &'static str {
        match status {
            Status::Passed => "PASSED",
            Status::Warning => "WARNING",
            Status::Failed => "FAILED",
        }
    }

    pub fn print_file_report(&self, report: &FileValidationReport) {
        println!(
            "\n{} - {}",
            report.file_name,
            Self::status_label(report.status)
        );

        let max_len = report
            .results
            .iter()
            .map(|r| r.rule_name.len())
            .max()
            .unwrap_or(0);

        for result in &report.results {
            let dots = ".".repeat(max_len - result.rule_name.len() + 10);
            match result.verdict {
                Verdict::Passed => {
                    println!(
                        "  {} {} passed ({} rows)",
                        result.rule_name,
                        dots,
                        format_numbers(result.total_count)
                    );
                }
                Verdict::Failed => {
                    let percent = if result.total_count > 0 {
                        result.failed_count as f64 / result.total_count as f64 * 100.0
                    } else {
                        0.0
                    };
                    println!(
                        "  {} {} {:>6} ({:.2}%)",
                        result.rule_name,
                        dots,
                        format_numbers(result.failed_count),
                        percent
                    );
                    if let Some(message) = &result.message {
                        println!("      {}", message);
                    }
                    for sample in &result.sample_failures {
                        println!("      - {}", sample);
                    }
                }
                Verdict::NotRun => {
                    println!("  {} {} not run", result.rule_name, dots);
                }
            }
        }
    }

    pub fn print_profile(&self, profile: &FileProfile) {
        println!(
            "\n{} ({} rows) - overall score {:.1}",
            profile.metadata.name,
            format_numbers(profile.row_count),
            profile.overall_score
        );

        let max_len = profile
            .columns
            .iter()
            .map(|c| c.name.len())
            .max()
            .unwrap_or(0);

        for column in &profile.columns {
            let dots = ".".repeat(max_len - column.name.len() + 10);
            println!(
                "  {} {} {} ({:.0}%) score {:.1}, {} distinct, {} null",
                column.name,
                dots,
                column.inferred_type.label(),
                column.type_confidence,
                column.scores.overall,
                format_numbers(column.unique_count),
                format_numbers(column.null_count),
            );
        }

        for correlation in &profile.correlations {
            if correlation.coefficient.abs() >= 0.7 {
                println!(
                    "  {} ~ {} : {:+.2}",
                    correlation.left, correlation.right, correlation.coefficient
                );
            }
        }
    }

    pub fn print_summary(&self, report: &ValidationReport) {
        let passed = report
            .files
            .iter()
            .filter(|f| f.status == Status::Passed)
            .count();
        let warned = report
            .files
            .iter()
            .filter(|f| f.status == Status::Warning)
            .count();
        let failed = report
            .files
            .iter()
            .filter(|f| f.status == Status::Failed)
            .count();

        println!("\n{}", "=".repeat(self.intro_len));
        println!(
            "Result: {} - {} failed, {} warned, {} passed",
            Self::status_label(report.status),
            failed,
            warned,
            passed
        );
    }
}

impl Reporter for StdOutFormatter {
    fn on_start(&self) {
        let i = "=".repeat(self.intro_len);

        println!("{}", self.intro);
        println!("{}", i);
    }

    fn on_file_start(&self, current: usize, total: usize, name: &str) {
        println!("  [{}/{}] {}", current, total, name);
    }

    fn on_file_report(&mut self, report: &FileValidationReport) {
        self.print_file_report(report);
    }

    fn on_profile(&mut self, profile: &FileProfile) {
        self.print_profile(profile);
    }

    fn on_summary(&mut self, report: Option<&ValidationReport>) {
        if let Some(report) = report {
            self.print_summary(report);
        }
    }
}
