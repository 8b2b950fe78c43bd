//! Cross-file reference catalog.
//!
//! The catalog owns every chunk source the job registered and memoizes one
//! `ReferenceIndex` per (file, column) pair, so N rules referencing the same
//! key column trigger exactly one pass over the reference file.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::compute;
use arrow::datatypes::DataType;
use arrow_array::{Array, RecordBatch, StringArray};
use dashmap::DashMap;
use xxhash_rust::xxh3::xxh3_64;

use crate::chunk::SourceRef;
use crate::errors::RuleError;
use crate::utils::hasher::PrehashedBuilder;

/// Hash index over one key column of one file. Values are stored as xxh3
/// hashes with occurrence counts, never as raw strings, so the index stays
/// bounded by distinct-value count.
pub struct ReferenceIndex {
    counts: HashMap<u64, u64, PrehashedBuilder>,
    total: u64,
}

impl ReferenceIndex {
    fn new() -> Self {
        Self {
            counts: HashMap::with_hasher(PrehashedBuilder),
            total: 0,
        }
    }

    fn record(&mut self, value: &str) {
        *self.counts.entry(xxh3_64(value.as_bytes())).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn contains(&self, value: &str) -> bool {
        self.counts.contains_key(&xxh3_64(value.as_bytes()))
    }

    pub fn occurrences(&self, value: &str) -> u64 {
        self.counts
            .get(&xxh3_64(value.as_bytes()))
            .copied()
            .unwrap_or(0)
    }

    pub fn distinct(&self) -> u64 {
        self.counts.len() as u64
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Pull one named column out of a batch as strings. Non-string columns are
/// cast so keys compare by display form on both sides of a reference.
pub(crate) fn column_as_strings(
    batch: &RecordBatch,
    field: &str,
) -> Result<StringArray, RuleError> {
    let index = batch
        .schema()
        .index_of(field)
        .map_err(|_| RuleError::MissingField(field.to_string()))?;
    let column = batch.column(index);
    if column.data_type() == &DataType::Utf8 {
        // Safety: data type checked above
        return Ok(column
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap()
            .clone());
    }
    let casted = compute::cast(column, &DataType::Utf8).map_err(|e| RuleError::Load(e.into()))?;
    // Safety: cast target is Utf8
    Ok(casted
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap()
        .clone())
}

/// Registry of job sources plus memoized per-key indexes. Shared across
/// rules; DashMap keeps concurrent builds safe.
pub struct ReferenceCatalog {
    sources: HashMap<String, SourceRef>,
    indexes: DashMap<(String, String), Arc<ReferenceIndex>>,
}

impl Default for ReferenceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceCatalog {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
            indexes: DashMap::new(),
        }
    }

    pub fn register(&mut self, name: impl Into<String>, source: SourceRef) {
        self.sources.insert(name.into(), source);
    }

    pub fn source(&self, name: &str) -> Result<&SourceRef, RuleError> {
        self.sources
            .get(name)
            .ok_or_else(|| RuleError::MissingReference {
                reference: name.to_string(),
                reason: "file is not part of the job".to_string(),
            })
    }

    /// Index of (file, key column), built on first request and reused after.
    pub fn index(&self, file: &str, field: &str) -> Result<Arc<ReferenceIndex>, RuleError> {
        let key = (file.to_string(), field.to_string());
        if let Some(existing) = self.indexes.get(&key) {
            return Ok(existing.clone());
        }

        let source = self.source(file)?;
        if !source.restartable() {
            return Err(RuleError::NotRestartable(file.to_string()));
        }
        let mut index = ReferenceIndex::new();
        for batch in source.chunks()? {
            let batch = batch?;
            let values = column_as_strings(&batch, field)?;
            for value in values.iter().flatten() {
                index.record(value);
            }
        }

        let index = Arc::new(index);
        self.indexes.insert(key, index.clone());
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::datatypes::{Field, Schema};
    use arrow_array::{ArrayRef, Int64Array};

    use crate::chunk::MemorySource;

    use super::*;

    fn string_batch(field: &str, values: Vec<Option<&str>>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new(field, DataType::Utf8, true)]));
        RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(values)) as ArrayRef]).unwrap()
    }

    fn catalog_with(name: &str, batches: Vec<RecordBatch>) -> ReferenceCatalog {
        let mut catalog = ReferenceCatalog::new();
        catalog.register(name, Arc::new(MemorySource::new(name, batches)));
        catalog
    }

    #[test]
    fn test_index_membership_and_counts() {
        let catalog = catalog_with(
            "customers.csv",
            vec![string_batch("id", vec![Some("C1"), Some("C2"), Some("C1"), None])],
        );
        let index = catalog.index("customers.csv", "id").unwrap();
        assert!(index.contains("C1"));
        assert!(!index.contains("C9"));
        assert_eq!(index.occurrences("C1"), 2);
        assert_eq!(index.distinct(), 2);
        // nulls are not keys
        assert_eq!(index.total(), 3);
    }

    #[test]
    fn test_index_is_memoized() {
        let catalog = catalog_with(
            "ref.csv",
            vec![string_batch("id", vec![Some("A")])],
        );
        let first = catalog.index("ref.csv", "id").unwrap();
        let second = catalog.index("ref.csv", "id").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unknown_file_is_missing_reference() {
        let catalog = ReferenceCatalog::new();
        assert!(matches!(
            catalog.index("nope.csv", "id"),
            Err(RuleError::MissingReference { .. })
        ));
    }

    #[test]
    fn test_missing_column_reported() {
        let catalog = catalog_with("ref.csv", vec![string_batch("id", vec![Some("A")])]);
        assert!(matches!(
            catalog.index("ref.csv", "other"),
            Err(RuleError::MissingField(f)) if f == "other"
        ));
    }

    #[test]
    fn test_non_restartable_source_rejected() {
        let mut catalog = ReferenceCatalog::new();
        catalog.register(
            "stream.csv",
            Arc::new(MemorySource::new("stream.csv", vec![]).single_pass()),
        );
        assert!(matches!(
            catalog.index("stream.csv", "id"),
            Err(RuleError::NotRestartable(f)) if f == "stream.csv"
        ));
    }

    #[test]
    fn test_numeric_key_column_is_cast() {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, true)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Int64Array::from(vec![Some(1), Some(2)])) as ArrayRef],
        )
        .unwrap();
        let catalog = catalog_with("nums.csv", vec![batch]);
        let index = catalog.index("nums.csv", "id").unwrap();
        assert!(index.contains("1"));
        assert!(index.contains("2"));
    }
}
