/*!
 * Chemical shift extraction from the BMRB AVS validation report.
 *
 * The report is scanned line by line. A line holding `Overall:` names the
 * residue that following value lines belong to; a line holding
 * `Ave C Shift Values>>` carries tab-separated `KEY::value` pairs from which
 * the C, CA and CB averages are taken.
 */

use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;

use crate::app_config::EndpointConfig;
use crate::errors::StageError;
use crate::file_utils::FileManager;
use crate::flat_file::{cell_or_none, FlatTable};
use crate::html;
use crate::sources::Fetcher;
use super::StageOutcome;
use super::discovery::EntryId;

/// Marker of a residue announcement line
pub const RESIDUE_MARKER: &str = "Overall:";

/// Marker of a carbon shift values line
pub const SHIFT_VALUES_MARKER: &str = "Ave C Shift Values>>";

/// Column headers of the shift table
pub const SHIFT_COLUMNS: [&str; 4] = ["Residue", "C", "CA", "CB"];

/// Average carbon shifts of one residue
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShiftRecord {
    /// Residue label as printed in the report, e.g. `12 ALA`
    pub residue: String,
    pub c: Option<String>,
    pub ca: Option<String>,
    pub cb: Option<String>,
}

impl ShiftRecord {
    /// Cells in column order, absent values rendered as `None`
    pub fn to_cells(&self) -> Vec<String> {
        vec![
            self.residue.clone(),
            cell_or_none(self.c.as_deref()),
            cell_or_none(self.ca.as_deref()),
            cell_or_none(self.cb.as_deref()),
        ]
    }
}

/// Ordered shift records of one entry
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShiftTable {
    pub records: Vec<ShiftRecord>,
}

impl ShiftTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_flat_table(&self) -> FlatTable {
        let mut table = FlatTable::new(&SHIFT_COLUMNS);
        table.rows = self.records.iter().map(ShiftRecord::to_cells).collect();
        table
    }
}

/// Split the payload of a shift values line into its key/value pairs
fn parse_shift_pairs(payload: &str) -> HashMap<&str, &str> {
    payload
        .split('\t')
        .filter_map(|item| item.split_once("::"))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect()
}

/// Parse the text of an AVS report into a shift table
///
/// Value lines seen before any residue announcement, or after an
/// announcement with an empty label, are dropped.
pub fn parse_shift_report(report: &str) -> ShiftTable {
    let mut records = Vec::new();
    let mut current_residue: Option<String> = None;

    for line in report.lines() {
        let line = line.trim();

        if !line.is_empty() && line.contains(RESIDUE_MARKER) {
            let label = line.split(RESIDUE_MARKER).next().unwrap_or_default();
            current_residue = Some(label.trim().to_string());
        } else if line.contains(SHIFT_VALUES_MARKER) {
            let payload = line.split(">>").nth(1).unwrap_or_default().trim();
            let values = parse_shift_pairs(payload);
            let value = |key: &str| values.get(key).map(|v| v.to_string());

            match &current_residue {
                Some(residue) if !residue.is_empty() => records.push(ShiftRecord {
                    residue: residue.clone(),
                    c: value("C"),
                    ca: value("CA"),
                    cb: value("CB"),
                }),
                _ => {}
            }
        }
    }

    ShiftTable { records }
}

/// Fetch, parse and persist the shift table of one entry
///
/// `shift_data_<id>.csv` is written whenever the report was read, even when
/// it held no rows.
pub async fn extract_shifts(
    fetcher: &dyn Fetcher,
    endpoints: &EndpointConfig,
    entry_id: &EntryId,
    output_dir: &Path,
) -> StageOutcome<ShiftTable> {
    match fetch_and_save(fetcher, endpoints, entry_id, output_dir).await {
        Ok(table) if table.is_empty() => StageOutcome::Empty,
        Ok(table) => StageOutcome::Data(table),
        Err(e) => {
            debug!("Processing shift data for {} failed: {}", entry_id, e);
            e.into()
        }
    }
}

async fn fetch_and_save(
    fetcher: &dyn Fetcher,
    endpoints: &EndpointConfig,
    entry_id: &EntryId,
    output_dir: &Path,
) -> Result<ShiftTable, StageError> {
    let url = endpoints.shift_report_url(entry_id.as_str());
    let body = fetcher.fetch_text(&url).await?;
    let table = parse_shift_report(&html::to_text(&body));

    let path = FileManager::shift_data_path(output_dir, entry_id.as_str());
    table.to_flat_table()
        .write_to(&path)
        .map_err(|e| StageError::Output(e.to_string()))?;
    info!("Shift data saved to {:?} ({} residues)", path, table.len());

    Ok(table)
}
