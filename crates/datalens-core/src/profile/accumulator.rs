//! Per-column running state, merged across chunks.
//!
//! A `ColumnAccumulator` owns every bounded structure the profile needs:
//! exact counts, the distinct-hash set, Welford numeric stats, the quantile
//! sketch, top-value and pattern counters, and the type histogram. Merging
//! two accumulators for the same column is associative and commutative
//! (within floating-point rounding), which is what permits parallel chunk
//! processing with a reduce step.

use std::collections::HashSet;

use arrow::compute;
use arrow::datatypes::DataType;
use arrow_array::{
    Array, ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
};
use chrono::NaiveDate;
use serde::Serialize;
use xxhash_rust::xxh3::xxh3_64;

use crate::errors::LoadError;
use crate::profile::counter::BoundedCounter;
use crate::profile::infer::{classify, TypeHistogram, ValueType};
use crate::profile::pattern::generalize;
use crate::profile::score::{score_column, QualityScores};
use crate::profile::sketch::QuantileSketch;
use crate::profile::stats::NumericStats;
use crate::profile::ProfileConfig;
use crate::utils::hasher::PrehashedBuilder;

/// Share of one observed type in a column's histogram.
#[derive(Debug, Clone, Serialize)]
pub struct TypeShare {
    pub value_type: ValueType,
    pub count: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: u64,
}

/// Finalized per-column statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub inferred_type: ValueType,
    pub type_confidence: f64,
    pub known_type: bool,
    pub type_breakdown: Vec<TypeShare>,
    pub count: u64,
    pub null_count: u64,
    pub unique_count: u64,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub median: Option<f64>,
    pub quartile_1: Option<f64>,
    pub quartile_3: Option<f64>,
    pub top_values: Vec<ValueCount>,
    pub pattern: Option<String>,
    pub date_format: Option<String>,
    pub scores: QualityScores,
}

impl ColumnProfile {
    pub fn is_numeric(&self) -> bool {
        self.inferred_type.is_numeric()
    }
}

pub struct ColumnAccumulator {
    name: String,
    known_type: Option<ValueType>,
    count: u64,
    null_count: u64,
    distinct: HashSet<u64, PrehashedBuilder>,
    numeric: NumericStats,
    sketch: QuantileSketch,
    top_values: BoundedCounter,
    patterns: BoundedCounter,
    types: TypeHistogram,
}

impl ColumnAccumulator {
    pub fn new(name: impl Into<String>, known_type: Option<ValueType>, config: &ProfileConfig) -> Self {
        Self {
            name: name.into(),
            known_type,
            count: 0,
            null_count: 0,
            distinct: HashSet::with_hasher(PrehashedBuilder),
            numeric: NumericStats::new(),
            sketch: QuantileSketch::with_capacity(config.sketch_capacity),
            top_values: BoundedCounter::with_capacity(config.top_values),
            patterns: BoundedCounter::with_capacity(config.pattern_capacity),
            types: TypeHistogram::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_null(&mut self) {
        self.count += 1;
        self.null_count += 1;
    }

    fn push_numeric(&mut self, value: f64) {
        self.numeric.push(value);
        self.sketch.push(value);
    }

    fn record_common(&mut self, display: &str, hash: u64) {
        self.count += 1;
        self.distinct.insert(hash);
        self.top_values.record(display);
        self.patterns.record(&generalize(display));
    }

    /// Record a raw string value; runs inference unless the type is known.
    pub fn record_str(&mut self, value: &str) {
        self.record_common(value, xxh3_64(value.as_bytes()));
        match self.known_type {
            Some(ValueType::Integer) | Some(ValueType::Float) => {
                if let Ok(v) = value.trim().parse::<f64>() {
                    self.push_numeric(v);
                }
            }
            Some(_) => {}
            None => {
                let (value_type, format) = classify(value);
                self.types.record_classified(value_type, format);
                if value_type.is_numeric() {
                    if let Ok(v) = value.trim().parse::<f64>() {
                        self.push_numeric(v);
                    }
                }
            }
        }
    }

    pub fn record_i64(&mut self, value: i64) {
        self.record_common(&value.to_string(), xxh3_64(&value.to_le_bytes()));
        self.push_numeric(value as f64);
    }

    pub fn record_f64(&mut self, value: f64) {
        self.record_common(&value.to_string(), xxh3_64(&value.to_bits().to_le_bytes()));
        self.push_numeric(value);
    }

    pub fn record_bool(&mut self, value: bool) {
        let display = if value { "true" } else { "false" };
        self.record_common(display, xxh3_64(display.as_bytes()));
    }

    pub fn record_date32(&mut self, days: i32) {
        // Days since the Unix epoch, rendered as ISO for display counters
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        let display = (epoch + chrono::Duration::days(days as i64))
            .format("%Y-%m-%d")
            .to_string();
        self.record_common(&display, xxh3_64(&days.to_le_bytes()));
    }

    /// Combine with a partial accumulator for the same column.
    pub fn merge(&mut self, other: ColumnAccumulator) {
        debug_assert_eq!(self.name, other.name);
        self.count += other.count;
        self.null_count += other.null_count;
        self.distinct.extend(other.distinct);
        self.numeric.merge(&other.numeric);
        self.sketch.merge(&other.sketch);
        self.top_values.merge(&other.top_values);
        self.patterns.merge(&other.patterns);
        self.types.merge(&other.types);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn null_count(&self) -> u64 {
        self.null_count
    }

    pub fn unique_count(&self) -> u64 {
        self.distinct.len() as u64
    }

    pub fn finalize(mut self) -> ColumnProfile {
        let non_null = self.count - self.null_count;
        let unique_count = self.distinct.len() as u64;

        let (inferred_type, type_confidence, known_type) = match self.known_type {
            Some(t) => (t, 100.0, true),
            None => match self.types.majority() {
                Some((t, majority)) => {
                    (t, majority as f64 / self.types.total() as f64 * 100.0, false)
                }
                // Nothing observed: fall back to string, confidence 100 by
                // the empty-column convention
                None => (ValueType::String, 100.0, false),
            },
        };

        let type_breakdown = if known_type {
            vec![TypeShare {
                value_type: inferred_type,
                count: non_null,
                percent: 100.0,
            }]
        } else {
            let total = self.types.total().max(1);
            self.types
                .breakdown()
                .into_iter()
                .map(|(value_type, count)| TypeShare {
                    value_type,
                    count,
                    percent: count as f64 / total as f64 * 100.0,
                })
                .collect()
        };

        let top_pattern = self.patterns.most_common();
        let scores = score_column(
            self.count,
            self.null_count,
            unique_count,
            type_confidence,
            top_pattern.as_ref().map(|(_, c)| *c).unwrap_or(0),
        );

        let numeric_ready = inferred_type.is_numeric() && self.numeric.count() > 0;
        let (mean, std_dev, min, max) = if numeric_ready {
            (
                self.numeric.mean(),
                Some(self.numeric.std_dev()),
                self.numeric.min(),
                self.numeric.max(),
            )
        } else {
            (None, None, None, None)
        };
        let (median, quartile_1, quartile_3) = if numeric_ready {
            (
                self.sketch.quantile(0.5),
                self.sketch.quantile(0.25),
                self.sketch.quantile(0.75),
            )
        } else {
            (None, None, None)
        };

        let date_format = if inferred_type == ValueType::Date && !known_type {
            self.types.dominant_date_format()
        } else {
            None
        };

        ColumnProfile {
            name: self.name,
            inferred_type,
            type_confidence,
            known_type,
            type_breakdown,
            count: self.count,
            null_count: self.null_count,
            unique_count,
            mean,
            std_dev,
            min,
            max,
            median,
            quartile_1,
            quartile_3,
            top_values: {
                let tracked = self.top_values.len();
                self.top_values
                    .top(tracked)
                    .into_iter()
                    .map(|(value, count)| ValueCount { value, count })
                    .collect()
            },
            pattern: top_pattern.map(|(p, _)| p),
            date_format,
            scores,
        }
    }
}

/// A batch column reduced to one of the five canonical shapes the
/// accumulator understands. Exotic Arrow types are cast, string-typed data
/// stays raw for inference.
pub(crate) enum CanonicalArray {
    Strings(StringArray),
    Ints(Int64Array),
    Floats(Float64Array),
    Bools(BooleanArray),
    Dates(Date32Array),
}

impl CanonicalArray {
    /// Numeric view of one slot, used by the correlation accumulator.
    pub fn numeric_at(&self, row: usize) -> Option<f64> {
        match self {
            CanonicalArray::Strings(a) => {
                if a.is_null(row) {
                    None
                } else {
                    a.value(row).trim().parse::<f64>().ok()
                }
            }
            CanonicalArray::Ints(a) => (!a.is_null(row)).then(|| a.value(row) as f64),
            CanonicalArray::Floats(a) => (!a.is_null(row)).then(|| a.value(row)),
            CanonicalArray::Bools(_) | CanonicalArray::Dates(_) => None,
        }
    }
}

/// Map an arrow type onto the known-type slot of the accumulator. Utf8
/// returns None: raw strings go through inference.
pub(crate) fn known_type_of(data_type: &DataType) -> Option<ValueType> {
    match data_type {
        DataType::Boolean => Some(ValueType::Boolean),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => Some(ValueType::Integer),
        DataType::UInt64 | DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            Some(ValueType::Float)
        }
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => Some(ValueType::Date),
        _ => None,
    }
}

pub(crate) fn canonicalize(array: &ArrayRef) -> Result<CanonicalArray, LoadError> {
    // Safety of the downcasts: each follows a cast (or a type match) to the
    // exact target type.
    match array.data_type() {
        DataType::Utf8 => Ok(CanonicalArray::Strings(
            array.as_any().downcast_ref::<StringArray>().unwrap().clone(),
        )),
        DataType::Boolean => Ok(CanonicalArray::Bools(
            array.as_any().downcast_ref::<BooleanArray>().unwrap().clone(),
        )),
        DataType::Int64 => Ok(CanonicalArray::Ints(
            array.as_any().downcast_ref::<Int64Array>().unwrap().clone(),
        )),
        DataType::Float64 => Ok(CanonicalArray::Floats(
            array.as_any().downcast_ref::<Float64Array>().unwrap().clone(),
        )),
        DataType::Date32 => Ok(CanonicalArray::Dates(
            array.as_any().downcast_ref::<Date32Array>().unwrap().clone(),
        )),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => {
            let casted = compute::cast(array, &DataType::Int64)?;
            Ok(CanonicalArray::Ints(
                casted.as_any().downcast_ref::<Int64Array>().unwrap().clone(),
            ))
        }
        DataType::UInt64 | DataType::Float16 | DataType::Float32 => {
            let casted = compute::cast(array, &DataType::Float64)?;
            Ok(CanonicalArray::Floats(
                casted.as_any().downcast_ref::<Float64Array>().unwrap().clone(),
            ))
        }
        DataType::Date64 | DataType::Timestamp(_, _) => {
            let casted = compute::cast(array, &DataType::Date32)?;
            Ok(CanonicalArray::Dates(
                casted.as_any().downcast_ref::<Date32Array>().unwrap().clone(),
            ))
        }
        _ => {
            let casted = compute::cast(array, &DataType::Utf8)?;
            Ok(CanonicalArray::Strings(
                casted.as_any().downcast_ref::<StringArray>().unwrap().clone(),
            ))
        }
    }
}

pub(crate) fn feed(accumulator: &mut ColumnAccumulator, canonical: &CanonicalArray) {
    match canonical {
        CanonicalArray::Strings(a) => {
            for value in a.iter() {
                match value {
                    // CSV readers surface blank fields as empty strings
                    Some(v) if !v.trim().is_empty() => accumulator.record_str(v),
                    _ => accumulator.record_null(),
                }
            }
        }
        CanonicalArray::Ints(a) => {
            for value in a.iter() {
                match value {
                    Some(v) => accumulator.record_i64(v),
                    None => accumulator.record_null(),
                }
            }
        }
        CanonicalArray::Floats(a) => {
            for value in a.iter() {
                match value {
                    Some(v) => accumulator.record_f64(v),
                    None => accumulator.record_null(),
                }
            }
        }
        CanonicalArray::Bools(a) => {
            for value in a.iter() {
                match value {
                    Some(v) => accumulator.record_bool(v),
                    None => accumulator.record_null(),
                }
            }
        }
        CanonicalArray::Dates(a) => {
            for value in a.iter() {
                match value {
                    Some(v) => accumulator.record_date32(v),
                    None => accumulator.record_null(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProfileConfig {
        ProfileConfig::default()
    }

    #[test]
    fn test_counts_and_uniques() {
        let mut acc = ColumnAccumulator::new("id", None, &config());
        for v in ["1", "2", "4", "5", "6", "7", "8", "10"] {
            acc.record_str(v);
        }
        acc.record_null();
        acc.record_null();
        assert_eq!(acc.count(), 10);
        assert_eq!(acc.null_count(), 2);
        assert_eq!(acc.unique_count(), 8);
    }

    #[test]
    fn test_scenario_a_scores() {
        // [1,2,null,4,5,6,7,8,null,10]
        let mut acc = ColumnAccumulator::new("values", None, &config());
        for v in ["1", "2", "4", "5", "6", "7", "8", "10"] {
            acc.record_str(v);
        }
        acc.record_null();
        acc.record_null();
        let profile = acc.finalize();
        assert_eq!(profile.scores.completeness, 80.0);
        assert_eq!(profile.scores.uniqueness, 80.0);
        assert_eq!(profile.inferred_type, ValueType::Integer);
        assert_eq!(profile.type_confidence, 100.0);
    }

    #[test]
    fn test_merge_matches_single_pass() {
        // Scenario B: [1,2,3] then [4,5]
        let mut left = ColumnAccumulator::new("v", None, &config());
        for v in ["1", "2", "3"] {
            left.record_str(v);
        }
        let mut right = ColumnAccumulator::new("v", None, &config());
        for v in ["4", "5"] {
            right.record_str(v);
        }
        left.merge(right);

        let mut single = ColumnAccumulator::new("v", None, &config());
        for v in ["1", "2", "3", "4", "5"] {
            single.record_str(v);
        }

        let merged = left.finalize();
        let direct = single.finalize();
        assert_eq!(merged.count, 5);
        assert_eq!(merged.mean, Some(3.0));
        assert_eq!(merged.min, Some(1.0));
        assert_eq!(merged.max, Some(5.0));
        assert_eq!(merged.count, direct.count);
        assert_eq!(merged.unique_count, direct.unique_count);
        assert_eq!(merged.mean, direct.mean);
    }

    #[test]
    fn test_known_type_bypasses_inference() {
        let mut acc = ColumnAccumulator::new("amount", Some(ValueType::Integer), &config());
        acc.record_i64(10);
        acc.record_i64(20);
        let profile = acc.finalize();
        assert!(profile.known_type);
        assert_eq!(profile.type_confidence, 100.0);
        assert_eq!(profile.inferred_type, ValueType::Integer);
        assert_eq!(profile.mean, Some(15.0));
    }

    #[test]
    fn test_mixed_types_reported_in_breakdown() {
        let mut acc = ColumnAccumulator::new("mixed", None, &config());
        for v in ["1", "2", "3", "x"] {
            acc.record_str(v);
        }
        let profile = acc.finalize();
        assert_eq!(profile.inferred_type, ValueType::Integer);
        assert_eq!(profile.type_confidence, 75.0);
        assert_eq!(profile.type_breakdown.len(), 2);
    }

    #[test]
    fn test_pattern_consistency() {
        let mut acc = ColumnAccumulator::new("code", None, &config());
        for v in ["AB-1234", "CD-5678", "EF-9012", "oddball"] {
            acc.record_str(v);
        }
        let profile = acc.finalize();
        assert_eq!(profile.pattern.as_deref(), Some("AA-9999"));
        assert_eq!(profile.scores.consistency, 75.0);
    }

    #[test]
    fn test_date_column_detects_format() {
        let mut acc = ColumnAccumulator::new("day", None, &config());
        for v in ["2024-01-01", "2024-02-15", "2024-03-30"] {
            acc.record_str(v);
        }
        let profile = acc.finalize();
        assert_eq!(profile.inferred_type, ValueType::Date);
        assert_eq!(profile.date_format.as_deref(), Some("%Y-%m-%d"));
    }

    #[test]
    fn test_empty_column_convention() {
        let acc = ColumnAccumulator::new("ghost", None, &config());
        let profile = acc.finalize();
        assert_eq!(profile.scores.completeness, 100.0);
        assert_eq!(profile.scores.overall, 100.0);
        assert_eq!(profile.inferred_type, ValueType::String);
    }
}
