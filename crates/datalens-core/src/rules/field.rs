//! Single-column streaming rules.
//!
//! Every rule here works on the display form of its column: non-string
//! columns are cast to Utf8 once per batch, so a rule written against a CSV
//! behaves identically against the same data in Parquet.

use std::collections::{HashMap, HashSet};

use arrow_array::RecordBatch;
use chrono::{NaiveDate, NaiveDateTime};
use xxhash_rust::xxh3::xxh3_64;

use crate::errors::RuleError;
use crate::reference::column_as_strings;
use crate::rules::{DataRule, RuleContext, RuleOutcome, RuleSpec};
use crate::utils::hasher::PrehashedBuilder;

fn push_sample(samples: &mut Vec<String>, ctx: &RuleContext<'_>, sample: String) {
    if samples.len() < ctx.max_sample_failures {
        samples.push(sample);
    }
}

/// Fails rows where the field is null or blank.
pub struct MandatoryFieldCheck {
    field: String,
    total: u64,
    failed: u64,
    samples: Vec<String>,
}

impl MandatoryFieldCheck {
    pub fn from_spec(spec: &RuleSpec) -> Result<Self, RuleError> {
        Ok(Self {
            field: spec.params.require_str("field")?.to_string(),
            total: 0,
            failed: 0,
            samples: Vec::new(),
        })
    }
}

impl DataRule for MandatoryFieldCheck {
    fn name(&self) -> &'static str {
        "MandatoryFieldCheck"
    }

    fn observe(
        &mut self,
        batch: &RecordBatch,
        row_offset: u64,
        ctx: &RuleContext<'_>,
    ) -> Result<(), RuleError> {
        let values = column_as_strings(batch, &self.field)?;
        for (i, value) in values.iter().enumerate() {
            self.total += 1;
            let blank = match value {
                None => true,
                Some(v) => v.trim().is_empty(),
            };
            if blank {
                self.failed += 1;
                push_sample(
                    &mut self.samples,
                    ctx,
                    format!("row {}: missing '{}'", row_offset + i as u64 + 1, self.field),
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
                format!("{} of {} rows missing '{}'", self.failed, self.total, self.field),
            ))
        }
    }
}

/// Fails every occurrence of a key beyond its first. Keys are tracked as
/// xxh3 hashes; only the bounded sample list holds raw values.
pub struct UniqueKeyCheck {
    field: String,
    seen: HashMap<u64, u64, PrehashedBuilder>,
    total: u64,
    failed: u64,
    samples: Vec<String>,
}

impl UniqueKeyCheck {
    pub fn from_spec(spec: &RuleSpec) -> Result<Self, RuleError> {
        Ok(Self {
            field: spec.params.require_str("field")?.to_string(),
            seen: HashMap::with_hasher(PrehashedBuilder),
            total: 0,
            failed: 0,
            samples: Vec::new(),
        })
    }
}

impl DataRule for UniqueKeyCheck {
    fn name(&self) -> &'static str {
        "UniqueKeyCheck"
    }

    fn observe(
        &mut self,
        batch: &RecordBatch,
        row_offset: u64,
        ctx: &RuleContext<'_>,
    ) -> Result<(), RuleError> {
        let values = column_as_strings(batch, &self.field)?;
        for (i, value) in values.iter().enumerate() {
            let Some(value) = value else { continue };
            self.total += 1;
            let count = self.seen.entry(xxh3_64(value.as_bytes())).or_insert(0);
            *count += 1;
            if *count > 1 {
                self.failed += 1;
                push_sample(
                    &mut self.samples,
                    ctx,
                    format!("row {}: duplicate '{}'", row_offset + i as u64 + 1, value),
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
                format!("{} duplicate values in '{}'", self.failed, self.field),
            ))
        }
    }
}

/// Fails values outside the configured allow-list. Nulls are not judged;
/// combine with `MandatoryFieldCheck` to forbid them.
pub struct ValidValuesCheck {
    field: String,
    allowed: HashSet<String>,
    total: u64,
    failed: u64,
    samples: Vec<String>,
}

impl ValidValuesCheck {
    pub fn from_spec(spec: &RuleSpec) -> Result<Self, RuleError> {
        let values = spec.params.require_string_list("values")?;
        if values.is_empty() {
            return Err(RuleError::invalid_parameter("values", "list is empty"));
        }
        Ok(Self {
            field: spec.params.require_str("field")?.to_string(),
            allowed: values.into_iter().collect(),
            total: 0,
            failed: 0,
            samples: Vec::new(),
        })
    }
}

impl DataRule for ValidValuesCheck {
    fn name(&self) -> &'static str {
        "ValidValuesCheck"
    }

    fn observe(
        &mut self,
        batch: &RecordBatch,
        row_offset: u64,
        ctx: &RuleContext<'_>,
    ) -> Result<(), RuleError> {
        let values = column_as_strings(batch, &self.field)?;
        for (i, value) in values.iter().enumerate() {
            let Some(value) = value else { continue };
            self.total += 1;
            if !self.allowed.contains(value) {
                self.failed += 1;
                push_sample(
                    &mut self.samples,
                    ctx,
                    format!("row {}: unexpected '{}'", row_offset + i as u64 + 1, value),
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
                format!("{} values outside the allowed set in '{}'", self.failed, self.field),
            ))
        }
    }
}

/// Numeric bounds on a column. Values that do not parse as numbers fail the
/// rule; nulls are skipped.
pub struct RangeCheck {
    field: String,
    min: Option<f64>,
    max: Option<f64>,
    total: u64,
    failed: u64,
    samples: Vec<String>,
}

impl RangeCheck {
    pub fn from_spec(spec: &RuleSpec) -> Result<Self, RuleError> {
        let min = spec.params.optional_f64("min")?;
        let max = spec.params.optional_f64("max")?;
        if min.is_none() && max.is_none() {
            return Err(RuleError::MissingParameter("min or max".to_string()));
        }
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(RuleError::invalid_parameter("min", "min exceeds max"));
            }
        }
        Ok(Self {
            field: spec.params.require_str("field")?.to_string(),
            min,
            max,
            total: 0,
            failed: 0,
            samples: Vec::new(),
        })
    }
}

impl DataRule for RangeCheck {
    fn name(&self) -> &'static str {
        "RangeCheck"
    }

    fn observe(
        &mut self,
        batch: &RecordBatch,
        row_offset: u64,
        ctx: &RuleContext<'_>,
    ) -> Result<(), RuleError> {
        let values = column_as_strings(batch, &self.field)?;
        for (i, value) in values.iter().enumerate() {
            let Some(value) = value else { continue };
            self.total += 1;
            let row = row_offset + i as u64 + 1;
            match value.trim().parse::<f64>() {
                Ok(v) => {
                    let below = self.min.is_some_and(|lo| v < lo);
                    let above = self.max.is_some_and(|hi| v > hi);
                    if below || above {
                        self.failed += 1;
                        push_sample(
                            &mut self.samples,
                            ctx,
                            format!("row {}: {} out of range", row, value),
                        );
                    }
                }
                Err(_) => {
                    self.failed += 1;
                    push_sample(
                        &mut self.samples,
                        ctx,
                        format!("row {}: '{}' is not numeric", row, value),
                    );
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
                format!("{} of {} values out of range in '{}'", self.failed, self.total, self.field),
            ))
        }
    }
}

/// Requires every non-null value to parse under one chrono format string.
pub struct DateFormatCheck {
    field: String,
    format: String,
    with_time: bool,
    total: u64,
    failed: u64,
    samples: Vec<String>,
}

impl DateFormatCheck {
    pub fn from_spec(spec: &RuleSpec) -> Result<Self, RuleError> {
        let format = spec.params.require_str("format")?.to_string();
        if format.is_empty() {
            return Err(RuleError::invalid_parameter("format", "format is empty"));
        }
        Ok(Self {
            field: spec.params.require_str("field")?.to_string(),
            with_time: format.contains("%H"),
            format,
            total: 0,
            failed: 0,
            samples: Vec::new(),
        })
    }

    fn matches(&self, value: &str) -> bool {
        if self.with_time {
            NaiveDateTime::parse_from_str(value, &self.format).is_ok()
        } else {
            NaiveDate::parse_from_str(value, &self.format).is_ok()
        }
    }
}

impl DataRule for DateFormatCheck {
    fn name(&self) -> &'static str {
        "DateFormatCheck"
    }

    fn observe(
        &mut self,
        batch: &RecordBatch,
        row_offset: u64,
        ctx: &RuleContext<'_>,
    ) -> Result<(), RuleError> {
        let values = column_as_strings(batch, &self.field)?;
        for (i, value) in values.iter().enumerate() {
            let Some(value) = value else { continue };
            self.total += 1;
            if !self.matches(value.trim()) {
                self.failed += 1;
                push_sample(
                    &mut self.samples,
                    ctx,
                    format!("row {}: '{}' does not match {}", row_offset + i as u64 + 1, value, self.format),
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
                format!("{} values in '{}' do not match {}", self.failed, self.field, self.format),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::datatypes::{DataType, Field, Schema};
    use arrow_array::{ArrayRef, StringArray};

    use crate::reference::ReferenceCatalog;
    use crate::results::Severity;

    use super::*;

    fn batch(field: &str, values: Vec<Option<&str>>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new(field, DataType::Utf8, true)]));
        RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(values)) as ArrayRef]).unwrap()
    }

    fn run(rule: &mut dyn DataRule, batches: &[RecordBatch]) -> RuleOutcome {
        let catalog = ReferenceCatalog::new();
        let ctx = RuleContext {
            catalog: &catalog,
            max_sample_failures: 10,
        };
        let mut offset = 0;
        for b in batches {
            rule.observe(b, offset, &ctx).unwrap();
            offset += b.num_rows() as u64;
        }
        rule.finish(&ctx).unwrap()
    }

    #[test]
    fn test_mandatory_field_counts_nulls_and_blanks() {
        let spec = RuleSpec::new("MandatoryFieldCheck", Severity::Error).with_param("field", "name");
        let mut rule = MandatoryFieldCheck::from_spec(&spec).unwrap();
        let outcome = run(
            &mut rule,
            &[batch("name", vec![Some("a"), None, Some("  "), Some("b")])],
        );
        assert!(!outcome.passed);
        assert_eq!(outcome.failed_count, 2);
        assert_eq!(outcome.total_count, 4);
        assert_eq!(outcome.sample_failures[0], "row 2: missing 'name'");
    }

    #[test]
    fn test_unique_key_flags_duplicates_across_chunks() {
        let spec = RuleSpec::new("UniqueKeyCheck", Severity::Error).with_param("field", "id");
        let mut rule = UniqueKeyCheck::from_spec(&spec).unwrap();
        let outcome = run(
            &mut rule,
            &[
                batch("id", vec![Some("A"), Some("B")]),
                batch("id", vec![Some("A"), Some("C")]),
            ],
        );
        assert!(!outcome.passed);
        assert_eq!(outcome.failed_count, 1);
        assert_eq!(outcome.sample_failures, vec!["row 3: duplicate 'A'"]);
    }

    #[test]
    fn test_valid_values() {
        let spec = RuleSpec::new("ValidValuesCheck", Severity::Error)
            .with_param("field", "status")
            .with_param("values", vec!["OPEN".to_string(), "CLOSED".to_string()]);
        let mut rule = ValidValuesCheck::from_spec(&spec).unwrap();
        let outcome = run(
            &mut rule,
            &[batch("status", vec![Some("OPEN"), Some("PENDING"), None])],
        );
        assert_eq!(outcome.failed_count, 1);
        assert_eq!(outcome.total_count, 2);
    }

    #[test]
    fn test_range_check_bounds_and_non_numeric() {
        let spec = RuleSpec::new("RangeCheck", Severity::Warning)
            .with_param("field", "amount")
            .with_param("min", 0i64)
            .with_param("max", 100i64);
        let mut rule = RangeCheck::from_spec(&spec).unwrap();
        let outcome = run(
            &mut rule,
            &[batch("amount", vec![Some("50"), Some("-3"), Some("abc"), Some("100")])],
        );
        assert_eq!(outcome.failed_count, 2);
        assert_eq!(outcome.total_count, 4);
    }

    #[test]
    fn test_date_format_check() {
        let spec = RuleSpec::new("DateFormatCheck", Severity::Error)
            .with_param("field", "day")
            .with_param("format", "%Y-%m-%d");
        let mut rule = DateFormatCheck::from_spec(&spec).unwrap();
        let outcome = run(
            &mut rule,
            &[batch("day", vec![Some("2024-01-01"), Some("01/02/2024"), None])],
        );
        assert_eq!(outcome.failed_count, 1);
        assert_eq!(outcome.total_count, 2);
    }

    #[test]
    fn test_sample_list_is_bounded() {
        let spec = RuleSpec::new("MandatoryFieldCheck", Severity::Error).with_param("field", "v");
        let mut rule = MandatoryFieldCheck::from_spec(&spec).unwrap();
        let values: Vec<Option<&str>> = vec![None; 50];
        let outcome = run(&mut rule, &[batch("v", values)]);
        assert_eq!(outcome.failed_count, 50);
        assert_eq!(outcome.sample_failures.len(), 10);
    }

    #[test]
    fn test_missing_column_errors() {
        let spec = RuleSpec::new("MandatoryFieldCheck", Severity::Error).with_param("field", "ghost");
        let mut rule = MandatoryFieldCheck::from_spec(&spec).unwrap();
        let catalog = ReferenceCatalog::new();
        let ctx = RuleContext {
            catalog: &catalog,
            max_sample_failures: 10,
        };
        let result = rule.observe(&batch("name", vec![Some("a")]), 0, &ctx);
        assert!(matches!(result, Err(RuleError::MissingField(f)) if f == "ghost"));
    }
}
