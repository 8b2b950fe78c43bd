//! Chunk sources.
//!
//! A chunk source supplies an ordered, finite sequence of Arrow
//! `RecordBatch`es plus file metadata that is available without iterating.
//! The profiling and validation engines only ever see this trait, so any
//! system that produces Arrow batches can plug in.

use std::sync::Arc;

use arrow_array::RecordBatch;
use serde::Serialize;

use crate::errors::LoadError;

pub mod csv;
pub mod parquet;

pub use csv::CsvSource;
pub use parquet::ParquetSource;

/// Lazy, forward-only iteration over chunks.
pub type ChunkIter = Box<dyn Iterator<Item = Result<RecordBatch, LoadError>> + Send>;

/// Row count reported by a source before any chunk is read.
///
/// CSV sources estimate from a sampled mean row width; Parquet and in-memory
/// sources know the exact count up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowCount {
    Exact(u64),
    Estimated(u64),
}

impl RowCount {
    pub fn value(&self) -> u64 {
        match self {
            RowCount::Exact(n) | RowCount::Estimated(n) => *n,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, RowCount::Exact(_))
    }
}

/// File facts exposed independently of chunk iteration.
#[derive(Debug, Clone, Serialize)]
pub struct FileMetadata {
    pub name: String,
    pub size_bytes: u64,
    pub row_count: RowCount,
    pub column_names: Vec<String>,
}

/// Source of tabular chunks.
///
/// `chunks()` hands out a fresh forward-only iterator. A source declares via
/// `restartable()` whether `chunks()` may be called more than once; rules that
/// need a second pass must check it and fall back to single-pass index
/// building when it is false.
pub trait ChunkSource: Send + Sync {
    fn metadata(&self) -> Result<FileMetadata, LoadError>;
    fn chunks(&self) -> Result<ChunkIter, LoadError>;
    fn restartable(&self) -> bool {
        true
    }
}

/// In-memory source, used in tests and for library callers that already hold
/// Arrow batches.
pub struct MemorySource {
    name: String,
    batches: Vec<RecordBatch>,
    restartable: bool,
    consumed: std::sync::atomic::AtomicBool,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, batches: Vec<RecordBatch>) -> Self {
        Self {
            name: name.into(),
            batches,
            restartable: true,
            consumed: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Declare the source single-pass. The batches are still held in memory,
    /// but `chunks()` succeeds only once, which is how a pipe-backed source
    /// behaves.
    pub fn single_pass(mut self) -> Self {
        self.restartable = false;
        self
    }
}

impl ChunkSource for MemorySource {
    fn metadata(&self) -> Result<FileMetadata, LoadError> {
        let column_names = self
            .batches
            .first()
            .map(|b| {
                b.schema()
                    .fields()
                    .iter()
                    .map(|f| f.name().clone())
                    .collect()
            })
            .unwrap_or_default();
        let rows: usize = self.batches.iter().map(|b| b.num_rows()).sum();
        let size_bytes: usize = self
            .batches
            .iter()
            .map(|b| b.get_array_memory_size())
            .sum();
        Ok(FileMetadata {
            name: self.name.clone(),
            size_bytes: size_bytes as u64,
            row_count: RowCount::Exact(rows as u64),
            column_names,
        })
    }

    fn chunks(&self) -> Result<ChunkIter, LoadError> {
        use std::sync::atomic::Ordering;
        if !self.restartable && self.consumed.swap(true, Ordering::SeqCst) {
            return Err(LoadError::Malformed {
                file: self.name.clone(),
                reason: "single-pass source already consumed".to_string(),
            });
        }
        let batches: Vec<Result<RecordBatch, LoadError>> =
            self.batches.iter().cloned().map(Ok).collect();
        Ok(Box::new(batches.into_iter()))
    }

    fn restartable(&self) -> bool {
        self.restartable
    }
}

/// Shared handle the dispatcher and the cross-file catalog pass around.
pub type SourceRef = Arc<dyn ChunkSource>;

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::{Int64Array, StringArray};
    use std::sync::Arc;

    fn batch() -> RecordBatch {
        RecordBatch::try_from_iter(vec![
            (
                "id",
                Arc::new(Int64Array::from(vec![1, 2, 3])) as arrow_array::ArrayRef,
            ),
            (
                "name",
                Arc::new(StringArray::from(vec!["a", "b", "c"])) as arrow_array::ArrayRef,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_memory_source_metadata() {
        let source = MemorySource::new("orders", vec![batch(), batch()]);
        let meta = source.metadata().unwrap();
        assert_eq!(meta.name, "orders");
        assert_eq!(meta.row_count, RowCount::Exact(6));
        assert_eq!(meta.column_names, vec!["id", "name"]);
    }

    #[test]
    fn test_memory_source_reiteration() {
        let source = MemorySource::new("orders", vec![batch()]);
        assert!(source.restartable());
        for _ in 0..2 {
            let chunks: Vec<_> = source.chunks().unwrap().collect();
            assert_eq!(chunks.len(), 1);
            assert_eq!(chunks[0].as_ref().unwrap().num_rows(), 3);
        }
    }

    #[test]
    fn test_empty_memory_source() {
        let source = MemorySource::new("empty", vec![]);
        let meta = source.metadata().unwrap();
        assert_eq!(meta.row_count.value(), 0);
        assert!(meta.column_names.is_empty());
    }
}
