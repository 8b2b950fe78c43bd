//! Rule suggestions derived from a profile.
//!
//! Pure function of the `FileProfile`: the same profile always yields the
//! same specs in the same order, so suggested configs are reproducible.
//! Thresholds are deliberately conservative; suggestions are a starting
//! config for a human to prune, not a verdict.

use crate::profile::{ColumnProfile, FileProfile, ValueType};
use crate::results::Severity;
use crate::rules::RuleSpec;

const MANDATORY_COMPLETENESS: f64 = 95.0;
const UNIQUE_KEY_UNIQUENESS: f64 = 99.0;
const UNIQUE_KEY_MIN_ROWS: u64 = 100;
const VALID_VALUES_UNIQUENESS: f64 = 5.0;
const VALID_VALUES_MAX_DISTINCT: u64 = 20;

/// Suggest a rule list for one profiled file. Columns are visited in file
/// order; each can contribute several rules.
pub fn suggest_rules(profile: &FileProfile) -> Vec<RuleSpec> {
    let mut specs = vec![RuleSpec::new("EmptyFileCheck", Severity::Error)];

    for column in &profile.columns {
        specs.extend(column_rules(column, profile.row_count));
    }

    specs.push(
        RuleSpec::new("RowCountRangeCheck", Severity::Warning)
            .with_param("min", (profile.row_count / 2) as i64)
            .with_param("max", (profile.row_count * 2) as i64),
    );
    specs
}

fn column_rules(column: &ColumnProfile, row_count: u64) -> Vec<RuleSpec> {
    let mut specs = Vec::new();

    if column.scores.completeness > MANDATORY_COMPLETENESS {
        specs.push(
            RuleSpec::new("MandatoryFieldCheck", Severity::Error)
                .with_param("field", column.name.as_str()),
        );
    }

    if column.scores.uniqueness > UNIQUE_KEY_UNIQUENESS && row_count > UNIQUE_KEY_MIN_ROWS {
        specs.push(
            RuleSpec::new("UniqueKeyCheck", Severity::Error)
                .with_param("field", column.name.as_str()),
        );
    }

    // The counter guard ensures every distinct value was captured, so the
    // allow-list cannot be missing legitimate entries.
    if column.scores.uniqueness < VALID_VALUES_UNIQUENESS
        && column.unique_count > 0
        && column.unique_count < VALID_VALUES_MAX_DISTINCT
        && column.unique_count <= column.top_values.len() as u64
    {
        let mut values: Vec<String> = column
            .top_values
            .iter()
            .map(|v| v.value.clone())
            .collect();
        values.sort_unstable();
        specs.push(
            RuleSpec::new("ValidValuesCheck", Severity::Error)
                .with_param("field", column.name.as_str())
                .with_param("values", values),
        );
    }

    if column.is_numeric() {
        if let (Some(min), Some(max)) = (column.min, column.max) {
            specs.push(
                RuleSpec::new("RangeCheck", Severity::Warning)
                    .with_param("field", column.name.as_str())
                    .with_param("min", min)
                    .with_param("max", max),
            );
        }
    }

    if column.inferred_type == ValueType::Date {
        if let Some(format) = &column.date_format {
            specs.push(
                RuleSpec::new("DateFormatCheck", Severity::Error)
                    .with_param("field", column.name.as_str())
                    .with_param("format", format.as_str()),
            );
        }
    }

    specs
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::datatypes::{DataType, Field, Schema};
    use arrow_array::{ArrayRef, RecordBatch, StringArray};

    use crate::chunk::MemorySource;
    use crate::profile::Profiler;

    use super::*;

    fn profile_of(columns: Vec<(&str, Vec<Option<String>>)>) -> crate::profile::FileProfile {
        let schema = Arc::new(Schema::new(
            columns
                .iter()
                .map(|(name, _)| Field::new(*name, DataType::Utf8, true))
                .collect::<Vec<_>>(),
        ));
        let arrays: Vec<ArrayRef> = columns
            .iter()
            .map(|(_, values)| {
                Arc::new(StringArray::from(
                    values.iter().map(|v| v.as_deref()).collect::<Vec<_>>(),
                )) as ArrayRef
            })
            .collect();
        let batch = RecordBatch::try_new(schema, arrays).unwrap();
        Profiler::default()
            .profile(&MemorySource::new("sample.csv", vec![batch]))
            .unwrap()
    }

    fn find<'a>(specs: &'a [RuleSpec], rule_type: &str, field: &str) -> Option<&'a RuleSpec> {
        specs.iter().find(|s| {
            s.rule_type == rule_type
                && s.params.get("field").and_then(|v| v.as_str()) == Some(field)
        })
    }

    #[test]
    fn test_suggestions_for_typical_file() {
        // 200 rows: a unique id, a low-cardinality status, a numeric amount
        let ids: Vec<Option<String>> = (0..200).map(|i| Some(format!("ID{:04}", i))).collect();
        let statuses: Vec<Option<String>> = (0..200)
            .map(|i| Some(if i % 2 == 0 { "OPEN" } else { "CLOSED" }.to_string()))
            .collect();
        let amounts: Vec<Option<String>> = (0..200).map(|i| Some(format!("{}", i * 3))).collect();
        let profile = profile_of(vec![("id", ids), ("status", statuses), ("amount", amounts)]);

        let specs = suggest_rules(&profile);

        assert_eq!(specs[0].rule_type, "EmptyFileCheck");
        assert!(find(&specs, "MandatoryFieldCheck", "id").is_some());
        assert!(find(&specs, "UniqueKeyCheck", "id").is_some());

        let valid = find(&specs, "ValidValuesCheck", "status").unwrap();
        assert_eq!(
            valid.params.require_string_list("values").unwrap(),
            vec!["CLOSED", "OPEN"]
        );

        let range = find(&specs, "RangeCheck", "amount").unwrap();
        assert_eq!(range.params.require_f64("min").unwrap(), 0.0);
        assert_eq!(range.params.require_f64("max").unwrap(), 597.0);

        let row_count = specs.last().unwrap();
        assert_eq!(row_count.rule_type, "RowCountRangeCheck");
        assert_eq!(row_count.params.require_i64("min").unwrap(), 100);
        assert_eq!(row_count.params.require_i64("max").unwrap(), 400);
    }

    #[test]
    fn test_date_column_gets_format_check() {
        let days: Vec<Option<String>> = (1..=28).map(|d| Some(format!("2024-01-{:02}", d))).collect();
        let profile = profile_of(vec![("day", days)]);
        let specs = suggest_rules(&profile);
        let check = find(&specs, "DateFormatCheck", "day").unwrap();
        assert_eq!(check.params.require_str("format").unwrap(), "%Y-%m-%d");
    }

    #[test]
    fn test_sparse_column_suggests_nothing_mandatory() {
        let values: Vec<Option<String>> = (0..100)
            .map(|i| (i % 2 == 0).then(|| format!("v{}", i)))
            .collect();
        let profile = profile_of(vec![("sparse", values)]);
        let specs = suggest_rules(&profile);
        assert!(find(&specs, "MandatoryFieldCheck", "sparse").is_none());
    }

    #[test]
    fn test_small_file_gets_no_unique_key() {
        let ids: Vec<Option<String>> = (0..10).map(|i| Some(format!("ID{}", i))).collect();
        let profile = profile_of(vec![("id", ids)]);
        let specs = suggest_rules(&profile);
        assert!(find(&specs, "UniqueKeyCheck", "id").is_none());
    }

    #[test]
    fn test_suggestions_are_deterministic() {
        let statuses: Vec<Option<String>> = (0..300)
            .map(|i| Some(["A", "B", "C"][i % 3].to_string()))
            .collect();
        let profile = profile_of(vec![("status", statuses)]);
        let first = suggest_rules(&profile);
        let second = suggest_rules(&profile);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_profile_suggests_file_level_checks() {
        let profile = Profiler::default()
            .profile(&MemorySource::new("empty.csv", vec![]))
            .unwrap();
        let specs = suggest_rules(&profile);
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].rule_type, "EmptyFileCheck");
        // The row-count fence is always suggested, pinned to the observed
        // count even when that count is zero
        assert_eq!(specs[1].rule_type, "RowCountRangeCheck");
        assert_eq!(specs[1].params.require_i64("min").unwrap(), 0);
        assert_eq!(specs[1].params.require_i64("max").unwrap(), 0);
    }
}
