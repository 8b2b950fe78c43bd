//! Streaming profiling engine.
//!
//! One forward pass over a chunk source produces a `FileProfile`: per-column
//! statistics, inferred types, quality scores, and the cross-column
//! correlation matrix. The working set is bounded by the accumulator
//! capacities regardless of file size.

use std::collections::HashMap;

use arrow_array::RecordBatch;
use rayon::prelude::*;
use serde::Serialize;

use crate::chunk::{ChunkSource, FileMetadata, MemorySource};
use crate::errors::LoadError;

pub mod accumulator;
pub mod correlation;
pub mod counter;
pub mod infer;
pub mod pattern;
pub mod score;
pub mod sketch;
pub mod stats;

pub use accumulator::{ColumnAccumulator, ColumnProfile, TypeShare, ValueCount};
pub use correlation::Correlation;
pub use infer::ValueType;
pub use score::QualityScores;

use accumulator::{canonicalize, feed, known_type_of, CanonicalArray};
use correlation::CorrelationAccumulator;

/// Tuning knobs for one profiling run.
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    /// Cap on the number of correlation candidate columns (memory is
    /// quadratic in this value).
    pub correlation_limit: usize,
    /// Top-K counter capacity per column.
    pub top_values: usize,
    /// Pattern counter capacity per column.
    pub pattern_capacity: usize,
    /// Quantile sketch centroid capacity per column.
    pub sketch_capacity: usize,
    /// Externally declared column types; these bypass inference and report
    /// confidence 100.
    pub declared_types: HashMap<String, ValueType>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            correlation_limit: 20,
            top_values: 50,
            pattern_capacity: 64,
            sketch_capacity: 256,
            declared_types: HashMap::new(),
        }
    }
}

impl ProfileConfig {
    pub fn with_correlation_limit(mut self, limit: usize) -> Self {
        self.correlation_limit = limit;
        self
    }

    pub fn with_top_values(mut self, capacity: usize) -> Self {
        self.top_values = capacity.max(1);
        self
    }

    pub fn with_declared_type(mut self, column: impl Into<String>, value_type: ValueType) -> Self {
        self.declared_types.insert(column.into(), value_type);
        self
    }
}

/// Completed profile of one file. Immutable after creation.
#[derive(Debug, Clone, Serialize)]
pub struct FileProfile {
    pub metadata: FileMetadata,
    pub row_count: u64,
    pub columns: Vec<ColumnProfile>,
    pub correlations: Vec<Correlation>,
    pub overall_score: f64,
}

impl FileProfile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Merges per-chunk column statistics into running totals.
pub struct FileAggregator {
    config: ProfileConfig,
    columns: Vec<ColumnAccumulator>,
    correlation: Option<CorrelationAccumulator>,
    candidate_indexes: Vec<usize>,
    row_count: u64,
}

impl FileAggregator {
    pub fn new(config: ProfileConfig) -> Self {
        Self {
            config,
            columns: Vec::new(),
            correlation: None,
            candidate_indexes: Vec::new(),
            row_count: 0,
        }
    }

    fn initialized(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Build accumulators and pick correlation candidates from the first
    /// batch's schema. Candidates are the first `correlation_limit` columns
    /// that can carry numeric values (native numerics plus raw strings).
    fn initialize(&mut self, batch: &RecordBatch) {
        let schema = batch.schema();
        for field in schema.fields() {
            let known = known_type_of(field.data_type())
                .or_else(|| self.config.declared_types.get(field.name()).copied());
            self.columns
                .push(ColumnAccumulator::new(field.name(), known, &self.config));
        }

        let mut candidates = Vec::new();
        for (index, field) in schema.fields().iter().enumerate() {
            if candidates.len() >= self.config.correlation_limit {
                break;
            }
            let numeric_capable = match known_type_of(field.data_type()) {
                Some(t) => t.is_numeric(),
                // Raw strings may turn out numeric; inference decides later
                None => true,
            };
            if numeric_capable {
                candidates.push(index);
            }
        }
        let names = candidates
            .iter()
            .map(|&i| schema.field(i).name().clone())
            .collect();
        self.correlation = Some(CorrelationAccumulator::new(names));
        self.candidate_indexes = candidates;
    }

    /// Consume one chunk. Chunks must share the schema of the first one.
    pub fn update_batch(&mut self, batch: &RecordBatch) -> Result<(), LoadError> {
        if !self.initialized() {
            self.initialize(batch);
        }

        let canonicals: Vec<CanonicalArray> = batch
            .columns()
            .iter()
            .take(self.columns.len())
            .map(canonicalize)
            .collect::<Result<_, _>>()?;

        for (accumulator, canonical) in self.columns.iter_mut().zip(&canonicals) {
            feed(accumulator, canonical);
        }

        if let Some(correlation) = &mut self.correlation {
            let mut row = vec![None; self.candidate_indexes.len()];
            for r in 0..batch.num_rows() {
                for (slot, &index) in row.iter_mut().zip(&self.candidate_indexes) {
                    *slot = canonicals[index].numeric_at(r);
                }
                correlation.push_row(&row);
            }
        }

        self.row_count += batch.num_rows() as u64;
        Ok(())
    }

    /// Combine two partial aggregators (parallel reduce step). Either side
    /// may still be empty.
    pub fn merge(mut self, other: FileAggregator) -> FileAggregator {
        if !other.initialized() {
            return self;
        }
        if !self.initialized() {
            return other;
        }
        for (a, b) in self.columns.iter_mut().zip(other.columns) {
            a.merge(b);
        }
        if let (Some(a), Some(b)) = (&mut self.correlation, &other.correlation) {
            a.merge(b);
        }
        self.row_count += other.row_count;
        self
    }

    pub fn finalize(self, metadata: FileMetadata) -> FileProfile {
        let columns: Vec<ColumnProfile> = self
            .columns
            .into_iter()
            .map(ColumnAccumulator::finalize)
            .collect();
        let correlations = self
            .correlation
            .map(|c| c.finalize())
            .unwrap_or_default();
        let overall_score = if columns.is_empty() {
            100.0
        } else {
            columns.iter().map(|c| c.scores.overall).sum::<f64>() / columns.len() as f64
        };
        FileProfile {
            metadata,
            row_count: self.row_count,
            columns,
            correlations,
            overall_score,
        }
    }
}

/// Profiling entry point.
pub struct Profiler {
    config: ProfileConfig,
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new(ProfileConfig::default())
    }
}

impl Profiler {
    pub fn new(config: ProfileConfig) -> Self {
        Self { config }
    }

    /// Sequential single pass over the source.
    pub fn profile(&self, source: &dyn ChunkSource) -> Result<FileProfile, LoadError> {
        let metadata = source.metadata()?;
        let mut aggregator = FileAggregator::new(self.config.clone());
        for batch in source.chunks()? {
            aggregator.update_batch(&batch?)?;
        }
        Ok(aggregator.finalize(metadata))
    }

    /// Parallel map-reduce over in-memory batches: one partial aggregator
    /// per chunk, combined with the associative merge. Results match the
    /// sequential pass within floating-point tolerance.
    pub fn profile_batches(
        &self,
        name: &str,
        batches: &[RecordBatch],
    ) -> Result<FileProfile, LoadError> {
        let metadata = MemorySource::new(name, batches.to_vec()).metadata()?;
        let aggregator = batches
            .par_iter()
            .map(|batch| -> Result<FileAggregator, LoadError> {
                let mut partial = FileAggregator::new(self.config.clone());
                partial.update_batch(batch)?;
                Ok(partial)
            })
            .try_reduce(
                || FileAggregator::new(self.config.clone()),
                |a, b| Ok(a.merge(b)),
            )?;
        Ok(aggregator.finalize(metadata))
    }
}
