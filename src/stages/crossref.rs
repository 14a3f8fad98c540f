use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;

use crate::app_config::{CrossRefMerge, EndpointConfig};
use crate::html;
use crate::sources::Fetcher;
use crate::errors::{ParseError, StageError};
use super::StageOutcome;
use super::discovery::EntryId;

// @module: PDB cross-reference discovery from the BMRB entry summary page

/// Keyword a summary row must contain to be read
pub const PDB_ROW_KEYWORD: &str = "PDB";

/// Database name printed next to the codes; matches the code pattern but is not one
pub const EXCLUDED_TOKEN: &str = "RCSB";

static PDB_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z0-9]{4}\b").expect("valid PDB code pattern"));

/// Four-character PDB entry code
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PdbId(String);

impl PdbId {
    /// Accept exactly four uppercase ASCII letters or digits
    pub fn parse(text: &str) -> Option<Self> {
        if text.len() == 4 && text.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()) {
            Some(Self(text.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PdbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Collect PDB codes from the last cell of every summary row mentioning PDB
///
/// With `LastRowWins` each matching row replaces the codes gathered so far;
/// with `Union` they accumulate. The result is deduplicated and sorted.
/// A matching row without any data cell fails the whole page.
pub fn extract_pdb_ids(page: &str, merge: CrossRefMerge) -> Result<Vec<PdbId>, ParseError> {
    let mut codes: Vec<String> = Vec::new();

    for row in html::table_rows(page) {
        if !html::to_spaced_text(row).contains(PDB_ROW_KEYWORD) {
            continue;
        }
        let Some(last_cell) = html::row_cells(row).last().copied() else {
            return Err(ParseError::MissingCell(html::to_spaced_text(row)));
        };

        let cell_text = html::to_spaced_text(last_cell);
        let found = PDB_CODE.find_iter(&cell_text).map(|m| m.as_str().to_string());
        match merge {
            CrossRefMerge::LastRowWins => codes = found.collect(),
            CrossRefMerge::Union => codes.extend(found),
        }
        debug!("PDB row cell: '{}'", cell_text);
    }

    Ok(codes.iter()
        .filter(|code| code.as_str() != EXCLUDED_TOKEN)
        .filter_map(|code| PdbId::parse(code))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect())
}

/// Fetch the summary page of an entry and list its PDB cross-references
pub async fn discover_pdb_ids(
    fetcher: &dyn Fetcher,
    endpoints: &EndpointConfig,
    entry_id: &EntryId,
    merge: CrossRefMerge,
) -> StageOutcome<Vec<PdbId>> {
    match fetch_and_extract(fetcher, endpoints, entry_id, merge).await {
        Ok(ids) => {
            info!(
                "PDB cross-references for {}: [{}]",
                entry_id,
                ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
            );
            StageOutcome::from_vec(ids)
        }
        Err(e) => {
            debug!("Scraping PDB values for {} failed: {}", entry_id, e);
            e.into()
        }
    }
}

async fn fetch_and_extract(
    fetcher: &dyn Fetcher,
    endpoints: &EndpointConfig,
    entry_id: &EntryId,
    merge: CrossRefMerge,
) -> Result<Vec<PdbId>, StageError> {
    let page = fetcher.fetch_text(&endpoints.summary_url(entry_id.as_str())).await?;
    Ok(extract_pdb_ids(&page, merge)?)
}
