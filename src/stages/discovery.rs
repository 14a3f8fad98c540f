use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use crate::errors::StageError;
use crate::html;
use crate::sources::Fetcher;
use super::StageOutcome;

// @module: Entry identifier discovery from the BMRB search grid

/// Link fragment marking an entry summary link
pub const SUMMARY_LINK_MARKER: &str = "summary/index.php?bmrbId=";

static BMRB_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"bmrbId=(\d+)").expect("valid id pattern"));

/// BMRB entry identifier (a run of digits), ordered numerically
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryId(String);

impl EntryId {
    /// Build an identifier from a string of ASCII digits
    pub fn parse(text: &str) -> Option<Self> {
        if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(text.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn significant_digits(&self) -> &str {
        let trimmed = self.0.trim_start_matches('0');
        if trimmed.is_empty() { "0" } else { trimmed }
    }
}

impl Ord for EntryId {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.significant_digits(), other.significant_digits());
        a.len().cmp(&b.len())
            .then_with(|| a.cmp(b))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for EntryId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pull the first `count` distinct entry identifiers out of a search page
///
/// Only anchor targets containing the summary link marker are considered.
/// Identifiers are deduplicated and sorted numerically before truncation.
pub fn extract_entry_ids(page: &str, count: usize) -> Vec<EntryId> {
    let mut seen = HashSet::new();
    let mut ids: Vec<EntryId> = html::anchor_hrefs(page)
        .iter()
        .filter(|href| href.contains(SUMMARY_LINK_MARKER))
        .filter_map(|href| BMRB_ID.captures(href))
        .filter_map(|caps| EntryId::parse(&caps[1]))
        .filter(|id| seen.insert(id.clone()))
        .collect();

    ids.sort();
    ids.truncate(count);
    ids
}

/// Fetch the search page and discover up to `count` entry identifiers
pub async fn discover_entry_ids(fetcher: &dyn Fetcher, search_url: &str, count: usize) -> StageOutcome<Vec<EntryId>> {
    match fetcher.fetch_text(search_url).await {
        Ok(page) => {
            let ids = extract_entry_ids(&page, count);
            info!(
                "Found BMRB IDs: [{}]",
                ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
            );
            StageOutcome::from_vec(ids)
        }
        Err(e) => {
            debug!("Scraping BMRB IDs failed: {}", e);
            StageError::from(e).into()
        }
    }
}
