use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use datalens_core::dispatch::{JobOptions, JobRunner};
use datalens_core::profile::Profiler;
use datalens_core::suggest::suggest_rules;
use datalens_core::Status;
use datalens_reports::{JsonFormatter, Reporter, StdOutFormatter};

use crate::constructor::{build_jobs, source_for};
use crate::parser::{specs_to_toml, Config};
use crate::OutputFormat;

fn formatter_for(output: &OutputFormat) -> Box<dyn Reporter> {
    let version = env!("CARGO_PKG_VERSION").to_string();
    match output {
        OutputFormat::Stdout => Box::new(StdOutFormatter::new(version)),
        OutputFormat::Json => Box::new(JsonFormatter::new(version)),
    }
}

pub fn run_validate(
    config_path: &str,
    output: &OutputFormat,
    fail_fast: bool,
) -> Result<Status> {
    let config_str = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path))?;
    let config: Config = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file: {}", config_path))?;

    let jobs = build_jobs(&config)?;
    let runner = JobRunner::new(JobOptions {
        fail_fast: fail_fast || config.fail_fast,
        max_sample_failures: config.max_sample_failures,
    });

    let mut formatter = formatter_for(output);
    formatter.on_start();
    for (i, job) in jobs.iter().enumerate() {
        formatter.on_file_start(i + 1, jobs.len(), &job.name);
    }

    let report = runner.run(&jobs)?;
    for file_report in &report.files {
        formatter.on_file_report(file_report);
    }
    formatter.on_summary(Some(&report));

    Ok(report.status)
}

pub fn run_profile(paths: &[String], output: &OutputFormat) -> Result<()> {
    let mut formatter = formatter_for(output);
    formatter.on_start();

    for (i, path) in paths.iter().enumerate() {
        let name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        formatter.on_file_start(i + 1, paths.len(), &name);

        let source = source_for(path, &name)?;
        let profile = Profiler::default()
            .profile(source.as_ref())
            .with_context(|| format!("Failed to profile '{}'", path))?;
        formatter.on_profile(&profile);
    }

    formatter.on_summary(None);
    Ok(())
}

/// Profile one file and emit a starter rule config for it.
pub fn run_suggest(path: &str, config_out: Option<&PathBuf>) -> Result<()> {
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    let source = source_for(path, &name)?;
    let profile = Profiler::default()
        .profile(source.as_ref())
        .with_context(|| format!("Failed to profile '{}'", path))?;

    let specs = suggest_rules(&profile);
    let rendered = toml::to_string_pretty(&specs_to_toml(path, &specs))
        .context("Failed to render suggested config")?;

    match config_out {
        Some(out) => {
            std::fs::write(out, &rendered)
                .with_context(|| format!("Failed to write '{}'", out.display()))?;
            println!("Wrote {} suggested rules to {}", specs.len(), out.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
