//! Streaming data-quality engine.
//!
//! The crate splits into two halves that share the chunked file model:
//!
//! * profiling: one bounded-memory pass over a [`chunk::ChunkSource`]
//!   yields a [`profile::FileProfile`] with per-column statistics, inferred
//!   types, and quality scores, from which [`suggest::suggest_rules`]
//!   derives a starter rule config;
//! * validation: a [`dispatch::JobRunner`] executes declarative
//!   [`rules::RuleSpec`] lists against one or more files, including
//!   cross-file checks backed by the [`reference::ReferenceCatalog`].

pub mod chunk;
pub mod dispatch;
pub mod errors;
pub mod profile;
pub mod reference;
pub mod results;
pub mod rules;
pub mod suggest;
pub mod utils;

pub use chunk::{ChunkSource, CsvSource, FileMetadata, MemorySource, ParquetSource, SourceRef};
pub use dispatch::{validate_file, FileJob, JobOptions, JobRunner};
pub use errors::{ConfigError, LoadError, RuleError};
pub use profile::{ColumnProfile, FileProfile, ProfileConfig, Profiler, ValueType};
pub use reference::ReferenceCatalog;
pub use results::{FileValidationReport, Severity, Status, ValidationReport, ValidationResult, Verdict};
pub use rules::{ParamValue, Registry, RuleSpec};
pub use suggest::suggest_rules;
