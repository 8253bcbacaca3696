//! Output module for crawl results and progress
//!
//! This module handles:
//! - Counting requests, status codes, and scraped fields
//! - The report logged when a session terminates
//! - Exporting records of a completed session as JSON
//! - Routing progress lines to an injected log sink

mod json;
mod log_sink;
pub mod stats;
mod traits;

pub use json::{default_output_path, validate_output_path, write_records, JsonFileSink};
pub use log_sink::{ChannelSink, LogLevel, LogLine, LogSink, TracingSink};
pub use stats::{format_elapsed, format_report, CounterHandle, Counters};
pub use traits::{ExportSink, OutputError, OutputResult};
