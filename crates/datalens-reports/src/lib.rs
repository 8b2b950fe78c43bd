pub mod formatters;
pub mod utils;

use datalens_core::{FileProfile, FileValidationReport, ValidationReport};
pub use formatters::{json::JsonFormatter, stdout::StdOutFormatter};

/// Rendering hooks called by the CLI as a run progresses. Streaming
/// formatters print in the hooks; accumulating formatters collect and emit
/// everything in `on_summary`.
pub trait Reporter {
    fn on_start(&self);
    fn on_file_start(&self, current: usize, total: usize, name: &str);
    fn on_file_report(&mut self, report: &FileValidationReport);
    fn on_profile(&mut self, profile: &FileProfile);
    fn on_summary(&mut self, report: Option<&ValidationReport>);
}
