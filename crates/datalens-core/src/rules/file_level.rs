//! Metadata-only rules, executed before any chunk is read.

use crate::chunk::FileMetadata;
use crate::errors::RuleError;
use crate::rules::{FileRule, RuleOutcome, RuleSpec};

/// Fails when the file holds no data rows.
pub struct EmptyFileCheck;

impl EmptyFileCheck {
    pub fn from_spec(_spec: &RuleSpec) -> Result<Self, RuleError> {
        Ok(Self)
    }
}

impl FileRule for EmptyFileCheck {
    fn name(&self) -> &'static str {
        "EmptyFileCheck"
    }

    fn check(&self, metadata: &FileMetadata) -> Result<RuleOutcome, RuleError> {
        let rows = metadata.row_count.value();
        if rows == 0 {
            Ok(RuleOutcome::fail(
                1,
                1,
                Vec::new(),
                format!("File '{}' contains no data rows", metadata.name),
            ))
        } else {
            Ok(RuleOutcome::pass(1))
        }
    }
}

/// Bounds the file's row count. Either bound may be omitted.
pub struct RowCountRangeCheck {
    min: Option<i64>,
    max: Option<i64>,
}

impl RowCountRangeCheck {
    pub fn from_spec(spec: &RuleSpec) -> Result<Self, RuleError> {
        let min = spec.params.optional_i64("min")?;
        let max = spec.params.optional_i64("max")?;
        if min.is_none() && max.is_none() {
            return Err(RuleError::MissingParameter("min or max".to_string()));
        }
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(RuleError::invalid_parameter("min", "min exceeds max"));
            }
        }
        Ok(Self { min, max })
    }
}

impl FileRule for RowCountRangeCheck {
    fn name(&self) -> &'static str {
        "RowCountRangeCheck"
    }

    fn check(&self, metadata: &FileMetadata) -> Result<RuleOutcome, RuleError> {
        let rows = metadata.row_count.value() as i64;
        let too_few = self.min.is_some_and(|lo| rows < lo);
        let too_many = self.max.is_some_and(|hi| rows > hi);
        if too_few || too_many {
            let bound = if too_few {
                format!("below minimum {}", self.min.unwrap_or_default())
            } else {
                format!("above maximum {}", self.max.unwrap_or_default())
            };
            Ok(RuleOutcome::fail(
                1,
                1,
                Vec::new(),
                format!("Row count {} is {}", rows, bound),
            ))
        } else {
            Ok(RuleOutcome::pass(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::chunk::RowCount;
    use crate::results::Severity;

    use super::*;

    fn metadata(rows: u64) -> FileMetadata {
        FileMetadata {
            name: "orders.csv".to_string(),
            size_bytes: if rows == 0 { 0 } else { 1024 },
            row_count: RowCount::Exact(rows),
            column_names: vec!["id".to_string()],
        }
    }

    #[test]
    fn test_empty_file_fails() {
        let rule = EmptyFileCheck;
        let outcome = rule.check(&metadata(0)).unwrap();
        assert!(!outcome.passed);
    }

    #[test]
    fn test_non_empty_file_passes() {
        let rule = EmptyFileCheck;
        assert!(rule.check(&metadata(10)).unwrap().passed);
    }

    #[test]
    fn test_row_count_bounds() {
        let spec = RuleSpec::new("RowCountRangeCheck", Severity::Warning)
            .with_param("min", 5i64)
            .with_param("max", 100i64);
        let rule = RowCountRangeCheck::from_spec(&spec).unwrap();
        assert!(rule.check(&metadata(50)).unwrap().passed);
        assert!(!rule.check(&metadata(3)).unwrap().passed);
        assert!(!rule.check(&metadata(200)).unwrap().passed);
    }

    #[test]
    fn test_single_bound_allowed() {
        let spec = RuleSpec::new("RowCountRangeCheck", Severity::Warning).with_param("min", 1i64);
        let rule = RowCountRangeCheck::from_spec(&spec).unwrap();
        assert!(rule.check(&metadata(1)).unwrap().passed);
    }

    #[test]
    fn test_no_bounds_rejected() {
        let spec = RuleSpec::new("RowCountRangeCheck", Severity::Warning);
        assert!(RowCountRangeCheck::from_spec(&spec).is_err());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let spec = RuleSpec::new("RowCountRangeCheck", Severity::Warning)
            .with_param("min", 10i64)
            .with_param("max", 5i64);
        assert!(matches!(
            RowCountRangeCheck::from_spec(&spec),
            Err(RuleError::InvalidParameter { .. })
        ));
    }
}
