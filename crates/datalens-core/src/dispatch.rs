//! Job execution.
//!
//! A job is a list of files, each with its ordered rule list. The runner
//! resolves every rule type up front (unknown types abort the job), then
//! validates files one at a time: file-phase rules against the metadata,
//! data-phase rules in a single shared pass over the chunks. Per-file and
//! per-rule failures never stop the job; they land in the report.

use std::collections::HashMap;

use crate::chunk::SourceRef;
use crate::errors::{ConfigError, RuleError};
use crate::reference::ReferenceCatalog;
use crate::results::{FileValidationReport, Severity, ValidationReport, ValidationResult};
use crate::rules::registry::{self, Registry, RuleKind};
use crate::rules::{CompiledRule, DataRule, RuleContext, RuleOutcome, RuleSpec};

#[derive(Debug, Clone)]
pub struct JobOptions {
    /// Stop a file's remaining rules after the first ERROR failure.
    pub fail_fast: bool,
    /// Cap on collected failure samples per rule.
    pub max_sample_failures: usize,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            fail_fast: false,
            max_sample_failures: 10,
        }
    }
}

/// One file and its rules, in configured order.
pub struct FileJob {
    pub name: String,
    pub source: SourceRef,
    pub rules: Vec<RuleSpec>,
}

impl FileJob {
    pub fn new(name: impl Into<String>, source: SourceRef, rules: Vec<RuleSpec>) -> Self {
        Self {
            name: name.into(),
            source,
            rules,
        }
    }
}

pub struct JobRunner {
    /// `None` means the shared built-in registry, initialized once.
    registry: Option<Registry>,
    options: JobOptions,
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new(JobOptions::default())
    }
}

impl JobRunner {
    pub fn new(options: JobOptions) -> Self {
        Self {
            registry: None,
            options,
        }
    }

    /// Run with a custom registry instead of the built-in rule set.
    pub fn with_registry(registry: Registry, options: JobOptions) -> Self {
        Self {
            registry: Some(registry),
            options,
        }
    }

    fn registry(&self) -> &Registry {
        self.registry.as_ref().unwrap_or_else(|| registry::builtin())
    }

    pub fn run(&self, jobs: &[FileJob]) -> Result<ValidationReport, ConfigError> {
        if jobs.is_empty() {
            return Err(ConfigError::EmptyJob);
        }
        for job in jobs {
            for spec in &job.rules {
                if !self.registry().contains(&spec.rule_type) {
                    return Err(ConfigError::UnknownRuleType(spec.rule_type.clone()));
                }
            }
        }

        let mut catalog = ReferenceCatalog::new();
        for job in jobs {
            catalog.register(&job.name, job.source.clone());
        }

        let reports = jobs
            .iter()
            .map(|job| self.validate_file(job, &catalog))
            .collect();
        Ok(ValidationReport::new(reports))
    }

    fn validate_file(&self, job: &FileJob, catalog: &ReferenceCatalog) -> FileValidationReport {
        let metadata = match job.source.metadata() {
            Ok(metadata) => metadata,
            Err(error) => {
                // The file never opened: one synthetic load failure, every
                // configured rule reported as not run.
                let mut results =
                    vec![ValidationResult::from_error("LoadCheck", Severity::Error, error)];
                results.extend(
                    job.rules
                        .iter()
                        .map(|spec| ValidationResult::not_run(spec.rule_type.clone(), spec.severity)),
                );
                return FileValidationReport::new(job.name.clone(), results);
            }
        };

        let ctx = RuleContext {
            catalog,
            max_sample_failures: self.options.max_sample_failures,
        };

        let file_specs: Vec<&RuleSpec> = job
            .rules
            .iter()
            .filter(|s| self.registry().kind_of(&s.rule_type) == Some(RuleKind::File))
            .collect();
        let data_specs: Vec<&RuleSpec> = job
            .rules
            .iter()
            .filter(|s| self.registry().kind_of(&s.rule_type) == Some(RuleKind::Data))
            .collect();

        let mut results = Vec::with_capacity(job.rules.len());
        let mut skipping = false;

        for spec in &file_specs {
            if skipping {
                results.push(ValidationResult::not_run(spec.rule_type.clone(), spec.severity));
                continue;
            }
            let result = match self.registry().compile(spec) {
                Ok(CompiledRule::File(rule)) => match rule.check(&metadata) {
                    Ok(outcome) => result_from_outcome(spec, outcome),
                    Err(error) => {
                        ValidationResult::from_error(spec.rule_type.clone(), spec.severity, error)
                    }
                },
                // Registry kind and compiled variant always agree
                Ok(CompiledRule::Data(_)) => unreachable!("file rule compiled as data rule"),
                Err(error) => {
                    ValidationResult::from_error(spec.rule_type.clone(), spec.severity, error)
                }
            };
            if self.options.fail_fast && result.is_error_failure() {
                skipping = true;
            }
            results.push(result);
        }

        if skipping {
            results.extend(
                data_specs
                    .iter()
                    .map(|spec| ValidationResult::not_run(spec.rule_type.clone(), spec.severity)),
            );
            return FileValidationReport::new(job.name.clone(), results);
        }

        results.extend(self.run_data_phase(job, &data_specs, &ctx));
        FileValidationReport::new(job.name.clone(), results)
    }

    /// One streaming pass feeding every compiled data rule, then a finish
    /// round in configured order.
    fn run_data_phase(
        &self,
        job: &FileJob,
        specs: &[&RuleSpec],
        ctx: &RuleContext<'_>,
    ) -> Vec<ValidationResult> {
        // Index in `specs` -> compiled rule; constructor failures become
        // results immediately.
        let mut active: HashMap<usize, Box<dyn DataRule>> = HashMap::new();
        let mut finished: HashMap<usize, ValidationResult> = HashMap::new();

        for (index, spec) in specs.iter().enumerate() {
            match self.registry().compile(spec) {
                Ok(CompiledRule::Data(rule)) => {
                    active.insert(index, rule);
                }
                Ok(CompiledRule::File(_)) => unreachable!("data rule compiled as file rule"),
                Err(error) => {
                    finished.insert(
                        index,
                        ValidationResult::from_error(spec.rule_type.clone(), spec.severity, error),
                    );
                }
            }
        }

        if !active.is_empty() {
            match self.stream(job, specs, &mut active, &mut finished, ctx) {
                Ok(()) => {}
                Err(error) => {
                    // The chunk stream broke; every still-active rule saw
                    // only part of the file and cannot conclude.
                    let message = error.to_string();
                    for (index, rule) in active.drain() {
                        let _ = rule;
                        finished.insert(
                            index,
                            ValidationResult::from_error(
                                specs[index].rule_type.clone(),
                                specs[index].severity,
                                &message,
                            ),
                        );
                    }
                }
            }
        }

        for (index, mut rule) in active.drain() {
            let spec = specs[index];
            let result = match rule.finish(ctx) {
                Ok(outcome) => result_from_outcome(spec, outcome),
                Err(error) => {
                    ValidationResult::from_error(spec.rule_type.clone(), spec.severity, error)
                }
            };
            finished.insert(index, result);
        }

        let mut results: Vec<ValidationResult> = (0..specs.len())
            .map(|index| {
                // Safety: every index ended up in `finished` above
                finished.remove(&index).unwrap()
            })
            .collect();

        if self.options.fail_fast {
            if let Some(first) = results.iter().position(ValidationResult::is_error_failure) {
                for result in results.iter_mut().skip(first + 1) {
                    *result = ValidationResult::not_run(result.rule_name.clone(), result.severity);
                }
            }
        }
        results
    }

    fn stream(
        &self,
        job: &FileJob,
        specs: &[&RuleSpec],
        active: &mut HashMap<usize, Box<dyn DataRule>>,
        finished: &mut HashMap<usize, ValidationResult>,
        ctx: &RuleContext<'_>,
    ) -> Result<(), RuleError> {
        let mut row_offset = 0u64;
        for batch in job.source.chunks()? {
            let batch = batch?;
            let mut failed_indexes = Vec::new();
            for (&index, rule) in active.iter_mut() {
                if let Err(error) = rule.observe(&batch, row_offset, ctx) {
                    finished.insert(
                        index,
                        ValidationResult::from_error(
                            specs[index].rule_type.clone(),
                            specs[index].severity,
                            error,
                        ),
                    );
                    failed_indexes.push(index);
                }
            }
            for index in failed_indexes {
                active.remove(&index);
            }
            if active.is_empty() {
                break;
            }
            row_offset += batch.num_rows() as u64;
        }
        Ok(())
    }
}

fn result_from_outcome(spec: &RuleSpec, outcome: RuleOutcome) -> ValidationResult {
    if outcome.passed {
        ValidationResult::passed(spec.rule_type.clone(), spec.severity, outcome.total_count)
    } else {
        ValidationResult::failed(
            spec.rule_type.clone(),
            spec.severity,
            outcome.failed_count,
            outcome.total_count,
            outcome.sample_failures,
            outcome.message.unwrap_or_default(),
        )
    }
}

/// Convenience for single-file jobs that need no registry or option tuning.
pub fn validate_file(
    name: &str,
    source: SourceRef,
    rules: Vec<RuleSpec>,
) -> Result<ValidationReport, ConfigError> {
    JobRunner::default().run(&[FileJob::new(name, source, rules)])
}
