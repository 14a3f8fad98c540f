/*!
 * Comma-separated flat files for the shift and annotation tables.
 *
 * One header row, `\n` line endings, quoting only where a cell needs it.
 * Reading goes through the same `csv` settings so a written table comes
 * back cell for cell.
 */

use anyhow::{anyhow, Context, Result};
use std::path::Path;

use crate::file_utils::FileManager;

/// Cell text written for a missing value
pub const NONE_MARKER: &str = "None";

/// Headers plus rows of string cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FlatTable {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Render the table as CSV text
    pub fn to_csv_string(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());

        if !self.headers.is_empty() {
            writer.write_record(&self.headers).context("Failed to write CSV header")?;
        }
        for row in &self.rows {
            writer.write_record(row).context("Failed to write CSV row")?;
        }

        let bytes = writer.into_inner()
            .map_err(|e| anyhow!("Failed to flush CSV output: {}", e.error()))?;
        String::from_utf8(bytes).context("CSV output is not valid UTF-8")
    }

    /// Parse CSV text whose first row is the header; blank lines are skipped
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("Failed to parse CSV record")?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        if rows.is_empty() {
            return Ok(Self::default());
        }
        let headers = rows.remove(0);
        Ok(Self { headers, rows })
    }

    /// Write the table to `path`, replacing any existing file
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        FileManager::write_to_file(path, &self.to_csv_string()?)
    }

    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_csv_str(&FileManager::read_to_string(path)?)
    }
}

/// Render an optional value, using the absence marker for `None`
pub fn cell_or_none(value: Option<&str>) -> String {
    value.unwrap_or(NONE_MARKER).to_string()
}
