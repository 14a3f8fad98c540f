/*!
 * Secondary structure ranges and the residue annotation join.
 *
 * HELIX and SHEET records of a PDB flat file are read at their fixed
 * columns (initial and terminal residue sequence numbers). Each shift row is
 * then tagged with the first collected range that contains its residue
 * number, bounds inclusive.
 */

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::ops::Range;
use std::path::Path;

use crate::app_config::EndpointConfig;
use crate::errors::{ParseError, StageError};
use crate::file_utils::FileManager;
use crate::flat_file::{FlatTable, NONE_MARKER};
use crate::sources::Fetcher;
use super::StageOutcome;
use super::crossref::PdbId;
use super::discovery::EntryId;
use super::shifts::{ShiftRecord, ShiftTable, SHIFT_COLUMNS};

/// Name of the annotation column appended to the shift table
pub const STRUCTURE_COLUMN: &str = "Secondary_Structure";

const HELIX_START: Range<usize> = 21..25;
const HELIX_END: Range<usize> = 33..37;
const SHEET_START: Range<usize> = 22..26;
const SHEET_END: Range<usize> = 33..37;

static RESIDUE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid number pattern"));

/// Kind of secondary structure element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureKind {
    Helix,
    Sheet,
}

impl StructureKind {
    /// Record name in the PDB format, also used as the annotation tag
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Helix => "HELIX",
            Self::Sheet => "SHEET",
        }
    }
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Residue span covered by one structure element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructureRange {
    pub kind: StructureKind,
    pub start: i64,
    pub end: i64,
}

impl StructureRange {
    pub fn contains(&self, residue_number: i64) -> bool {
        self.start <= residue_number && residue_number <= self.end
    }
}

/// One shift row with its structure tag
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRecord {
    pub record: ShiftRecord,
    pub structure: Option<StructureKind>,
}

/// Shift table with the annotation column
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotatedTable {
    pub records: Vec<AnnotatedRecord>,
}

impl AnnotatedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_flat_table(&self) -> FlatTable {
        let mut headers = SHIFT_COLUMNS.to_vec();
        headers.push(STRUCTURE_COLUMN);
        let mut table = FlatTable::new(&headers);
        table.rows = self.records.iter()
            .map(|annotated| {
                let mut cells = annotated.record.to_cells();
                cells.push(annotated.structure.map(|k| k.tag()).unwrap_or(NONE_MARKER).to_string());
                cells
            })
            .collect();
        table
    }
}

fn column_int(line: &str, columns: Range<usize>, kind: StructureKind, line_no: usize) -> Result<i64, ParseError> {
    let malformed = |message: String| ParseError::MalformedRecord {
        record: kind.tag().to_string(),
        line: line_no,
        message,
    };
    let field = line.get(columns.clone())
        .ok_or_else(|| malformed(format!("line too short for columns {}-{}", columns.start + 1, columns.end)))?;
    field.trim().parse::<i64>()
        .map_err(|_| malformed(format!("'{}' is not a residue number", field.trim())))
}

/// Read HELIX and SHEET records in file order
///
/// A record whose position columns are missing or not integers fails the
/// whole file.
pub fn parse_structure_ranges(pdb_text: &str) -> Result<Vec<StructureRange>, ParseError> {
    let mut ranges = Vec::new();

    for (index, raw) in pdb_text.lines().enumerate() {
        let line = raw.trim_end();
        let (kind, start_cols, end_cols) = if line.starts_with("HELIX") {
            (StructureKind::Helix, HELIX_START, HELIX_END)
        } else if line.starts_with("SHEET") {
            (StructureKind::Sheet, SHEET_START, SHEET_END)
        } else {
            continue;
        };

        ranges.push(StructureRange {
            kind,
            start: column_int(line, start_cols, kind, index + 1)?,
            end: column_int(line, end_cols, kind, index + 1)?,
        });
    }

    Ok(ranges)
}

/// First run of digits in a residue label
pub fn residue_number(label: &str) -> Result<i64, ParseError> {
    RESIDUE_NUMBER.find(label)
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .ok_or_else(|| ParseError::MissingResidueNumber(label.to_string()))
}

/// First range, in collection order, containing the residue number
pub fn match_structure(ranges: &[StructureRange], residue_number: i64) -> Option<StructureKind> {
    ranges.iter()
        .find(|range| range.contains(residue_number))
        .map(|range| range.kind)
}

/// Tag every shift row with its structure kind
///
/// Fails on the first residue label without a number.
pub fn annotate(table: &ShiftTable, ranges: &[StructureRange]) -> Result<AnnotatedTable, ParseError> {
    let records = table.records.iter()
        .map(|record| {
            let number = residue_number(&record.residue)?;
            Ok(AnnotatedRecord {
                record: record.clone(),
                structure: match_structure(ranges, number),
            })
        })
        .collect::<Result<Vec<_>, ParseError>>()?;

    Ok(AnnotatedTable { records })
}

/// Fetch the structure file of `pdb_id`, annotate the table and write `final_data_<id>.csv`
pub async fn annotate_entry(
    fetcher: &dyn Fetcher,
    endpoints: &EndpointConfig,
    entry_id: &EntryId,
    pdb_id: &PdbId,
    table: &ShiftTable,
    output_dir: &Path,
) -> StageOutcome<AnnotatedTable> {
    match fetch_annotate_and_save(fetcher, endpoints, entry_id, pdb_id, table, output_dir).await {
        Ok(annotated) if annotated.is_empty() => StageOutcome::Empty,
        Ok(annotated) => StageOutcome::Data(annotated),
        Err(e) => {
            debug!("Updating data with structure for {} ({}) failed: {}", entry_id, pdb_id, e);
            e.into()
        }
    }
}

async fn fetch_annotate_and_save(
    fetcher: &dyn Fetcher,
    endpoints: &EndpointConfig,
    entry_id: &EntryId,
    pdb_id: &PdbId,
    table: &ShiftTable,
    output_dir: &Path,
) -> Result<AnnotatedTable, StageError> {
    let url = endpoints.structure_url(pdb_id.as_str());
    let pdb_text = fetcher.fetch_text(&url).await?;
    let ranges = parse_structure_ranges(&pdb_text)?;
    let annotated = annotate(table, &ranges)?;

    let path = FileManager::final_data_path(output_dir, entry_id.as_str());
    annotated.to_flat_table()
        .write_to(&path)
        .map_err(|e| StageError::Output(e.to_string()))?;
    info!("Updated data with secondary structure saved to {:?} ({} ranges from {})", path, ranges.len(), pdb_id);

    Ok(annotated)
}
