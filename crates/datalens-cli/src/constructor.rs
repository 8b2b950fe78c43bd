//! Turns parsed config entries into runnable jobs.

use std::path::Path;
use std::sync::Arc;

use datalens_core::chunk::{CsvSource, ParquetSource, SourceRef};
use datalens_core::dispatch::FileJob;
use datalens_core::rules::RuleSpec;

use crate::errors::CliError;
use crate::parser::{Config, FileConfig};

/// Pick a chunk source by file extension.
pub fn source_for(path: &str, name: &str) -> Result<SourceRef, CliError> {
    let extension = Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("csv") => Ok(Arc::new(CsvSource::new(path).with_name(name))),
        Some("parquet") => Ok(Arc::new(ParquetSource::new(path).with_name(name))),
        _ => Err(CliError::UnknownExtension {
            path: path.to_string(),
        }),
    }
}

pub fn display_name(file: &FileConfig) -> String {
    file.name.clone().unwrap_or_else(|| {
        Path::new(&file.path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.path.clone())
    })
}

pub fn build_jobs(config: &Config) -> Result<Vec<FileJob>, CliError> {
    config
        .files
        .iter()
        .map(|file| {
            let name = display_name(file);
            let source = source_for(&file.path, &name)?;
            let rules: Vec<RuleSpec> = file
                .rules
                .iter()
                .map(|rule| rule.to_spec())
                .collect::<Result<_, _>>()?;
            Ok(FileJob::new(name, source, rules))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_dispatch() {
        assert!(source_for("data/orders.csv", "orders.csv").is_ok());
        assert!(source_for("data/orders.PARQUET", "orders").is_ok());
        assert!(matches!(
            source_for("data/orders.xlsx", "orders"),
            Err(CliError::UnknownExtension { .. })
        ));
    }

    #[test]
    fn test_display_name_defaults_to_file_name() {
        let file = FileConfig {
            path: "data/nested/orders.csv".to_string(),
            name: None,
            rules: Vec::new(),
        };
        assert_eq!(display_name(&file), "orders.csv");
    }

    #[test]
    fn test_jobs_from_config() {
        let config: Config = toml::from_str(
            r#"
            [[file]]
            path = "data/orders.csv"
            name = "orders"

              [[file.rule]]
              type = "EmptyFileCheck"
            "#,
        )
        .unwrap();
        let jobs = build_jobs(&config).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, "orders");
        assert_eq!(jobs[0].rules.len(), 1);
    }
}
