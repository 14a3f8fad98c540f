/*!
 * Tests for CSV output of the shift and annotation tables
 */

use anyhow::Result;
use nmrscrape::flat_file::{FlatTable, NONE_MARKER};
use nmrscrape::stages::shifts::{ShiftRecord, ShiftTable};
use nmrscrape::stages::structure::{annotate, StructureKind, StructureRange};
use crate::common;

/// Writing then reading a table gives back every cell, markers included
#[test]
fn test_flat_table_roundTrip_withNoneMarkersAndQuotes_shouldPreserveCells() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("nested").join("shift_data_1.csv");

    let shifts = ShiftTable {
        records: vec![
            ShiftRecord { residue: "1 ALA".to_string(), c: Some("177.0".to_string()), ca: None, cb: None },
            ShiftRecord { residue: "2 \"odd\", label".to_string(), c: None, ca: Some("None".to_string()), cb: Some("19.9".to_string()) },
        ],
    };
    let ranges = [StructureRange { kind: StructureKind::Helix, start: 2, end: 2 }];
    let table = annotate(&shifts, &ranges)?.to_flat_table();

    table.write_to(&path)?;
    let back = FlatTable::read_from(&path)?;

    assert_eq!(back, table);
    assert_eq!(back.rows[0][2], NONE_MARKER);
    // A literal "None" value reads back exactly like a missing one
    assert_eq!(back.rows[1][2], back.rows[0][3]);
    assert_eq!(back.rows[1][4], "HELIX");
    Ok(())
}

/// Existing files are replaced wholesale
#[test]
fn test_flat_table_write_withExistingFile_shouldOverwrite() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("final_data_1.csv");
    std::fs::write(&path, "stale content that is much longer than the new table\n".repeat(10))?;

    let mut table = FlatTable::new(&["Residue"]);
    table.rows.push(vec!["1 ALA".to_string()]);
    table.write_to(&path)?;

    assert_eq!(std::fs::read_to_string(&path)?, "Residue\n1 ALA\n");
    Ok(())
}
