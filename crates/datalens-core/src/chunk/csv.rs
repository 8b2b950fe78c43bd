//! CSV chunk source.
//!
//! All columns are read as Utf8 so the type inference engine sees the raw
//! strings; typed interpretation happens downstream. Row count is estimated
//! from a sampled mean row width, never from a full scan.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::csv::ReaderBuilder as CsvReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};

use crate::chunk::{ChunkIter, ChunkSource, FileMetadata, RowCount};
use crate::errors::LoadError;

/// Default rows per chunk. Large enough to amortize per-batch overhead,
/// small enough to keep the working set bounded.
const DEFAULT_BATCH_SIZE: usize = 64 * 1024;

/// Bytes sampled from the head of the file for row-count estimation.
const SAMPLE_BYTES: usize = 256 * 1024;

pub struct CsvSource {
    path: PathBuf,
    name: String,
    batch_size: usize,
}

impl CsvSource {
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

    /// Generate an all-Utf8 schema from the header line.
    fn generate_schema(&self) -> Result<Schema, LoadError> {
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        match lines.next() {
            Some(first) => {
                let header = first?;
                let fields: Vec<Field> = header
                    .split(',')
                    .map(|c| Field::new(c.trim(), DataType::Utf8, true))
                    .collect();
                Ok(Schema::new(fields))
            }
            None => Err(LoadError::Malformed {
                file: self.name.clone(),
                reason: "CSV file is empty".to_string(),
            }),
        }
    }

    /// Estimate the data-row count from file size and a sampled mean row
    /// width. Returns `Exact` only for files fully covered by the sample.
    fn estimate_rows(&self, file_size: u64) -> Result<RowCount, LoadError> {
        let file = File::open(&self.path)?;
        let mut sample = Vec::with_capacity(SAMPLE_BYTES.min(file_size as usize));
        file.take(SAMPLE_BYTES as u64).read_to_end(&mut sample)?;

        let mut newlines = 0u64;
        let mut header_len = 0usize;
        for (i, b) in sample.iter().enumerate() {
            if *b == b'\n' {
                if newlines == 0 {
                    header_len = i + 1;
                }
                newlines += 1;
            }
        }

        if (sample.len() as u64) == file_size {
            // Whole file sampled; count is exact. A trailing partial line
            // still counts as a row.
            let mut rows = newlines.saturating_sub(1);
            if sample.last().is_some_and(|b| *b != b'\n') && newlines >= 1 {
                rows += 1;
            }
            return Ok(RowCount::Exact(rows));
        }

        let data_rows = newlines.saturating_sub(1).max(1);
        let sampled_data = (sample.len() - header_len) as u64;
        let mean_row_width = (sampled_data / data_rows).max(1);
        let estimate = (file_size - header_len as u64) / mean_row_width;
        Ok(RowCount::Estimated(estimate))
    }
}

impl ChunkSource for CsvSource {
    fn metadata(&self) -> Result<FileMetadata, LoadError> {
        let size_bytes = std::fs::metadata(&self.path)?.len();
        let schema = self.generate_schema()?;
        let column_names = schema.fields().iter().map(|f| f.name().clone()).collect();
        let row_count = self.estimate_rows(size_bytes)?;
        Ok(FileMetadata {
            name: self.name.clone(),
            size_bytes,
            row_count,
            column_names,
        })
    }

    fn chunks(&self) -> Result<ChunkIter, LoadError> {
        let schema = Arc::new(self.generate_schema()?);
        let file = File::open(&self.path)?;
        let reader = CsvReaderBuilder::new(schema)
            .with_header(true)
            .with_batch_size(self.batch_size)
            .build(file)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            .map_err(LoadError::from)?;
        Ok(Box::new(reader.map(|r| r.map_err(LoadError::from))))
    }

    // Chunks are re-read from disk on every call
    fn restartable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_metadata_columns_and_rows() {
        let file = write_csv("id,name,price\n1,widget,9.99\n2,gadget,19.99\n");
        let source = CsvSource::new(file.path());
        let meta = source.metadata().unwrap();
        assert_eq!(meta.column_names, vec!["id", "name", "price"]);
        assert_eq!(meta.row_count, RowCount::Exact(2));
    }

    #[test]
    fn test_chunks_all_utf8() {
        let file = write_csv("id,name\n1,a\n2,b\n3,c\n");
        let source = CsvSource::new(file.path()).with_batch_size(2);
        let batches: Vec<_> = source
            .chunks()
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(batches.len(), 2);
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 3);
        for field in batches[0].schema().fields() {
            assert_eq!(field.data_type(), &DataType::Utf8);
        }
    }

    #[test]
    fn test_empty_file_is_load_error() {
        let file = write_csv("");
        let source = CsvSource::new(file.path());
        assert!(matches!(
            source.metadata(),
            Err(LoadError::Malformed { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = CsvSource::new("/nonexistent/path/data.csv");
        assert!(matches!(source.metadata(), Err(LoadError::Io(_))));
    }
}
