//! JSON export of extracted records
//!
//! Records are written as a pretty-printed JSON array of objects. Non-ASCII
//! text (titles, prices such as `£51.77`) is written verbatim, never as
//! `\u` escapes.

use crate::crawler::ExtractedRecord;
use crate::output::traits::{ExportSink, OutputError, OutputResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Serializes records as a JSON array into any writer
pub fn write_records<W: Write>(records: &[ExtractedRecord], writer: W) -> OutputResult<()> {
    let mut writer = writer;
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Export sink writing a JSON file at a fixed path
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExportSink for JsonFileSink {
    fn export(&mut self, records: &[ExtractedRecord]) -> OutputResult<()> {
        let file = File::create(&self.path)?;
        write_records(records, BufWriter::new(file))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Builds a timestamped export path: `<dir>/YYYYmmddHHMMSS_scrape.json`
///
/// Successive sessions started from the same controller get distinct names,
/// so a finished export is never overwritten by the next run.
pub fn default_output_path(directory: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    directory.join(format!("{}_scrape.json", stamp))
}

/// Checks that an export path names a `.json` file built from word characters and hyphens
///
/// # Examples
///
/// ```
/// use catalogue_scraper::output::validate_output_path;
/// use std::path::Path;
///
/// assert!(validate_output_path(Path::new("exports/fantasy-books_2.json")).is_ok());
/// assert!(validate_output_path(Path::new("exports/fantasy books.json")).is_err());
/// assert!(validate_output_path(Path::new("exports/fantasy.csv")).is_err());
/// ```
pub fn validate_output_path(path: &Path) -> OutputResult<()> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| OutputError::InvalidPath(format!("{} has no file name", path.display())))?;

    let stem = file_name.strip_suffix(".json").ok_or_else(|| {
        OutputError::InvalidPath(format!("'{}' must have a .json extension", file_name))
    })?;

    if stem.is_empty() {
        return Err(OutputError::InvalidPath(format!(
            "'{}' has an empty file stem",
            file_name
        )));
    }

    if !stem
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(OutputError::InvalidPath(format!(
            "'{}' may only contain letters, digits, '_' and '-' before .json",
            file_name
        )));
    }

    Ok(())
}
