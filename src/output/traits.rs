//! Export sink trait and output error types

use crate::crawler::ExtractedRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for the records of a completed session
///
/// The engine calls [`ExportSink::export`] exactly once, and only when the
/// session completes. Cancelled and failed sessions never reach the sink.
pub trait ExportSink: Send {
    /// Writes all records, in crawl order
    fn export(&mut self, records: &[ExtractedRecord]) -> OutputResult<()>;

    /// Human-readable name of the destination, used in log lines
    fn describe(&self) -> String;
}
