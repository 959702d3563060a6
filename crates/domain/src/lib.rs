pub mod config;
pub mod error;
pub mod io;
pub mod options;
pub mod report;

pub use crate::config::{RunConfig, ToolConfig};
pub use crate::error::DomainError;
pub use crate::io::{ExportFormat, ReportExporter, SerdeExporter};
pub use crate::options::InferenceOptions;
pub use crate::report::{AttemptRecord, AttemptStatus, InferenceOutcome, RunReport};
