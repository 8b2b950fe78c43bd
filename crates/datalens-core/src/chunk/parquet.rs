//! Parquet chunk source.
//!
//! Columns arrive with their native Arrow types, so the profiler treats them
//! as known types (confidence 100) instead of running inference.

use std::fs::File;
use std::path::{Path, PathBuf};

use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::chunk::{ChunkIter, ChunkSource, FileMetadata, RowCount};
use crate::errors::LoadError;

const DEFAULT_BATCH_SIZE: usize = 64 * 1024;

pub struct ParquetSource {
    path: PathBuf,
    name: String,
    batch_size: usize,
}

impl ParquetSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            path,
            name,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl ChunkSource for ParquetSource {
    fn metadata(&self) -> Result<FileMetadata, LoadError> {
        let size_bytes = std::fs::metadata(&self.path)?.len();
        let file = File::open(&self.path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let rows = builder.metadata().file_metadata().num_rows().max(0) as u64;
        let column_names = builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        Ok(FileMetadata {
            name: self.name.clone(),
            size_bytes,
            row_count: RowCount::Exact(rows),
            column_names,
        })
    }

    fn chunks(&self) -> Result<ChunkIter, LoadError> {
        let file = File::open(&self.path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(self.batch_size)
            .build()?;
        Ok(Box::new(reader.map(|r| r.map_err(LoadError::from))))
    }

    fn restartable(&self) -> bool {
        true
    }
}
