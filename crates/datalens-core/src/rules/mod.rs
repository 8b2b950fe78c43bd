//! Validation rules.
//!
//! Rules come in two phases. File-level rules judge a file from its metadata
//! alone and run before any data is read. Data-level rules stream the
//! chunks: the dispatcher feeds every batch to `observe`, then calls
//! `finish` once to collect the outcome. Cross-file rules are data-level
//! rules that consult the reference catalog in `finish`.

use arrow_array::RecordBatch;

use crate::chunk::FileMetadata;
use crate::errors::RuleError;
use crate::reference::ReferenceCatalog;

pub mod cross_file;
pub mod field;
pub mod file_level;
pub mod params;
pub mod registry;

pub use params::{ParamMap, ParamValue, RuleSpec};
pub use registry::{Registry, RuleKind};

/// Shared execution state handed to rules.
pub struct RuleContext<'a> {
    pub catalog: &'a ReferenceCatalog,
    /// Cap on collected failure samples per rule.
    pub max_sample_failures: usize,
}

/// What one rule concluded.
#[derive(Debug, Clone)]
pub struct RuleOutcome {
    pub passed: bool,
    pub failed_count: u64,
    pub total_count: u64,
    pub sample_failures: Vec<String>,
    pub message: Option<String>,
}

impl RuleOutcome {
    pub fn pass(total_count: u64) -> Self {
        Self {
            passed: true,
            failed_count: 0,
            total_count,
            sample_failures: Vec::new(),
            message: None,
        }
    }

    pub fn fail(
        failed_count: u64,
        total_count: u64,
        sample_failures: Vec<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            passed: false,
            failed_count,
            total_count,
            sample_failures,
            message: Some(message.into()),
        }
    }
}

/// Metadata-only check, runs before the data pass.
pub trait FileRule: Send {
    fn name(&self) -> &'static str;
    fn check(&self, metadata: &FileMetadata) -> Result<RuleOutcome, RuleError>;
}

/// Streaming check over the file's chunks. `row_offset` is the absolute
/// index of the batch's first row, so samples can name rows in file order.
pub trait DataRule: Send {
    fn name(&self) -> &'static str;
    fn observe(
        &mut self,
        batch: &RecordBatch,
        row_offset: u64,
        ctx: &RuleContext<'_>,
    ) -> Result<(), RuleError>;
    fn finish(&mut self, ctx: &RuleContext<'_>) -> Result<RuleOutcome, RuleError>;
}

/// An executable rule produced by the registry.
pub enum CompiledRule {
    File(Box<dyn FileRule>),
    Data(Box<dyn DataRule>),
}

impl CompiledRule {
    pub fn name(&self) -> &'static str {
        match self {
            CompiledRule::File(rule) => rule.name(),
            CompiledRule::Data(rule) => rule.name(),
        }
    }
}
