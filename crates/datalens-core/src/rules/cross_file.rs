//! Rules that relate two files of the same job.
//!
//! Both rules stream the file under validation and probe a memoized
//! `ReferenceIndex` built from the other file, so the reference is read at
//! most once per (file, column) pair no matter how many rules point at it.

use std::collections::HashMap;
use std::sync::Arc;

use arrow_array::RecordBatch;
use xxhash_rust::xxh3::xxh3_64;

use crate::errors::RuleError;
use crate::reference::{column_as_strings, ReferenceIndex};
use crate::rules::{DataRule, RuleContext, RuleOutcome, RuleSpec};
use crate::utils::hasher::PrehashedBuilder;

fn push_sample(samples: &mut Vec<String>, ctx: &RuleContext<'_>, sample: String) {
    if samples.len() < ctx.max_sample_failures {
        samples.push(sample);
    }
}

/// Every key in the validated file must exist in the reference file's key
/// column. Null keys fail unless `allow_null` is set.
pub struct ReferentialIntegrityCheck {
    field: String,
    reference_file: String,
    reference_field: String,
    allow_null: bool,
    index: Option<Arc<ReferenceIndex>>,
    total: u64,
    failed: u64,
    samples: Vec<String>,
}

impl ReferentialIntegrityCheck {
    pub fn from_spec(spec: &RuleSpec) -> Result<Self, RuleError> {
        let field = spec.params.require_str("field")?.to_string();
        let reference_field = match spec.params.get("reference_field") {
            Some(value) => value
                .as_str()
                .ok_or_else(|| RuleError::invalid_parameter("reference_field", "expected a string"))?
                .to_string(),
            None => field.clone(),
        };
        Ok(Self {
            field,
            reference_file: spec.params.require_str("reference_file")?.to_string(),
            reference_field,
            allow_null: spec.params.optional_bool("allow_null")?.unwrap_or(false),
            index: None,
            total: 0,
            failed: 0,
            samples: Vec::new(),
        })
    }

    fn index(&mut self, ctx: &RuleContext<'_>) -> Result<Arc<ReferenceIndex>, RuleError> {
        if let Some(index) = &self.index {
            return Ok(index.clone());
        }
        let index = ctx.catalog.index(&self.reference_file, &self.reference_field)?;
        self.index = Some(index.clone());
        Ok(index)
    }
}

impl DataRule for ReferentialIntegrityCheck {
    fn name(&self) -> &'static str {
        "ReferentialIntegrityCheck"
    }

    fn observe(
        &mut self,
        batch: &RecordBatch,
        row_offset: u64,
        ctx: &RuleContext<'_>,
    ) -> Result<(), RuleError> {
        let index = self.index(ctx)?;
        let values = column_as_strings(batch, &self.field)?;
        for (i, value) in values.iter().enumerate() {
            self.total += 1;
            let row = row_offset + i as u64 + 1;
            match value {
                None => {
                    if !self.allow_null {
                        self.failed += 1;
                        push_sample(
                            &mut self.samples,
                            ctx,
                            format!("row {}: null key in '{}'", row, self.field),
                        );
                    }
                }
                Some(value) => {
                    if !index.contains(value) {
                        self.failed += 1;
                        push_sample(
                            &mut self.samples,
                            ctx,
                            format!("row {}: '{}' not found in {}", row, value, self.reference_file),
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self, _ctx: &RuleContext<'_>) -> Result<RuleOutcome, RuleError> {
        if self.failed == 0 {
            Ok(RuleOutcome::pass(self.total))
        } else {
            Ok(RuleOutcome::fail(
                self.failed,
                self.total,
                std::mem::take(&mut self.samples),
                format!(
                    "{} keys in '{}' missing from {}",
                    self.failed, self.field, self.reference_file
                ),
            ))
        }
    }
}

/// Flags keys whose combined occurrence count across the validated file and
/// another file exceeds one. A key already present in the other file fails on
/// first sight; a key only in this file fails from its second occurrence on.
pub struct CrossFileDuplicateCheck {
    field: String,
    other_file: String,
    other_field: String,
    index: Option<Arc<ReferenceIndex>>,
    seen: HashMap<u64, u64, PrehashedBuilder>,
    total: u64,
    failed: u64,
    samples: Vec<String>,
}

impl CrossFileDuplicateCheck {
    pub fn from_spec(spec: &RuleSpec) -> Result<Self, RuleError> {
        let field = spec.params.require_str("field")?.to_string();
        let other_field = match spec.params.get("other_field") {
            Some(value) => value
                .as_str()
                .ok_or_else(|| RuleError::invalid_parameter("other_field", "expected a string"))?
                .to_string(),
            None => field.clone(),
        };
        Ok(Self {
            field,
            other_file: spec.params.require_str("other_file")?.to_string(),
            other_field,
            index: None,
            seen: HashMap::with_hasher(PrehashedBuilder),
            total: 0,
            failed: 0,
            samples: Vec::new(),
        })
    }
}

impl DataRule for CrossFileDuplicateCheck {
    fn name(&self) -> &'static str {
        "CrossFileDuplicateCheck"
    }

    fn observe(
        &mut self,
        batch: &RecordBatch,
        row_offset: u64,
        ctx: &RuleContext<'_>,
    ) -> Result<(), RuleError> {
        if self.index.is_none() {
            self.index = Some(ctx.catalog.index(&self.other_file, &self.other_field)?);
        }
        // Safety: populated above
        let index = self.index.as_ref().unwrap().clone();

        let values = column_as_strings(batch, &self.field)?;
        for (i, value) in values.iter().enumerate() {
            let Some(value) = value else { continue };
            self.total += 1;
            let local = self.seen.entry(xxh3_64(value.as_bytes())).or_insert(0);
            *local += 1;
            let row = row_offset + i as u64 + 1;
            if index.contains(value) {
                self.failed += 1;
                push_sample(
                    &mut self.samples,
                    ctx,
                    format!("row {}: '{}' also present in {}", row, value, self.other_file),
                );
            } else if *local > 1 {
                self.failed += 1;
                push_sample(
                    &mut self.samples,
                    ctx,
                    format!("row {}: '{}' repeated in this file", row, value),
                );
            }
        }
        Ok(())
    }

    fn finish(&mut self, _ctx: &RuleContext<'_>) -> Result<RuleOutcome, RuleError> {
        if self.failed == 0 {
            Ok(RuleOutcome::pass(self.total))
        } else {
            Ok(RuleOutcome::fail(
                self.failed,
                self.total,
                std::mem::take(&mut self.samples),
                format!(
                    "{} values of '{}' duplicated across this file and {}",
                    self.failed, self.field, self.other_file
                ),
            ))
        }
    }
}
