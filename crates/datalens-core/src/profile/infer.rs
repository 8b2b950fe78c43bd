//! Type inference over observed string values.
//!
//! Every non-null value is classified by ordered tests: boolean, integer,
//! float, then date-format probing, with string as the fallback. A histogram
//! of matches drives the inferred type; columns with a declared or native
//! type bypass inference entirely and report confidence 100.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::profile::counter::BoundedCounter;

/// Date formats probed in order. First match wins and is recorded for
/// dominant-format detection.
pub const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Boolean,
    Integer,
    Float,
    Date,
    String,
}

impl ValueType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Float)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Date => "date",
            ValueType::String => "string",
        }
    }

    fn index(&self) -> usize {
        match self {
            ValueType::Boolean => 0,
            ValueType::Integer => 1,
            ValueType::Float => 2,
            ValueType::Date => 3,
            ValueType::String => 4,
        }
    }

    const ALL: [ValueType; 5] = [
        ValueType::Boolean,
        ValueType::Integer,
        ValueType::Float,
        ValueType::Date,
        ValueType::String,
    ];
}

/// Classification of one value. Carries the matched date format so the
/// histogram can track format dominance.
pub fn classify(value: &str) -> (ValueType, Option<&'static str>) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return (ValueType::String, None);
    }
    if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false") {
        return (ValueType::Boolean, None);
    }
    if trimmed.parse::<i64>().is_ok() {
        return (ValueType::Integer, None);
    }
    if trimmed.parse::<f64>().is_ok() {
        return (ValueType::Float, None);
    }
    for format in DATE_FORMATS.iter().copied() {
        let matched = if format.contains("%H") {
            NaiveDateTime::parse_from_str(trimmed, format).is_ok()
        } else {
            NaiveDate::parse_from_str(trimmed, format).is_ok()
        };
        if matched {
            return (ValueType::Date, Some(format));
        }
    }
    (ValueType::String, None)
}

/// Histogram of type matches for one column.
#[derive(Debug, Clone)]
pub struct TypeHistogram {
    counts: [u64; 5],
    date_formats: BoundedCounter,
}

impl Default for TypeHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeHistogram {
    pub fn new() -> Self {
        Self {
            counts: [0; 5],
            date_formats: BoundedCounter::with_capacity(DATE_FORMATS.len()),
        }
    }

    pub fn record(&mut self, value: &str) {
        let (value_type, format) = classify(value);
        self.record_classified(value_type, format);
    }

    /// Record a value that was already classified by the caller.
    pub fn record_classified(&mut self, value_type: ValueType, format: Option<&'static str>) {
        self.counts[value_type.index()] += 1;
        if let Some(format) = format {
            self.date_formats.record(format);
        }
    }

    pub fn merge(&mut self, other: &TypeHistogram) {
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
        self.date_formats.merge(&other.date_formats);
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Majority type and its count. Ties resolve in test order (boolean
    /// before integer before float before date before string) so the result
    /// is deterministic.
    pub fn majority(&self) -> Option<(ValueType, u64)> {
        if self.total() == 0 {
            return None;
        }
        let mut best = ValueType::Boolean;
        let mut best_count = 0u64;
        for value_type in ValueType::ALL {
            let count = self.counts[value_type.index()];
            if count > best_count {
                best = value_type;
                best_count = count;
            }
        }
        Some((best, best_count))
    }

    /// Non-zero entries as (type, count), in test order.
    pub fn breakdown(&self) -> Vec<(ValueType, u64)> {
        ValueType::ALL
            .into_iter()
            .filter_map(|t| {
                let count = self.counts[t.index()];
                (count > 0).then_some((t, count))
            })
            .collect()
    }

    /// The most frequent matched date format, if it covers at least half the
    /// date-classified values.
    pub fn dominant_date_format(&self) -> Option<String> {
        let date_total = self.counts[ValueType::Date.index()];
        if date_total == 0 {
            return None;
        }
        let (format, count) = self.date_formats.most_common()?;
        (count * 2 >= date_total).then_some(format)
    }
}
