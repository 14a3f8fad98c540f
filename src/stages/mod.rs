/*!
 * Pipeline stages.
 *
 * - `discovery`: entry identifiers from the search results page
 * - `shifts`: per-residue chemical shift table from the validation report
 * - `crossref`: PDB codes listed on the entry summary page
 * - `structure`: HELIX/SHEET ranges and the residue annotation join
 *
 * Every stage reports a `StageOutcome` so the controller can tell an empty
 * document from an unreachable one.
 */

use std::fmt;

use crate::errors::{FetchError, StageError};

pub mod crossref;
pub mod discovery;
pub mod shifts;
pub mod structure;

/// Result of running one stage for one entry
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    /// The stage produced data
    Data(T),
    /// The document was read but held nothing usable
    Empty,
    /// The document could not be obtained (network, HTTP status, I/O)
    Transient(String),
    /// The document was obtained but could not be interpreted
    Parse(String),
}

/// Payload-free summary of an outcome, for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Data,
    Empty,
    Transient,
    Parse,
    /// The stage was never run for this entry
    Skipped,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Data => "ok",
            Self::Empty => "empty",
            Self::Transient => "transient failure",
            Self::Parse => "parse failure",
            Self::Skipped => "skipped",
        };
        write!(f, "{}", label)
    }
}

impl<T> StageOutcome<Vec<T>> {
    /// Wrap a list, mapping an empty one to `Empty`
    pub fn from_vec(items: Vec<T>) -> Self {
        if items.is_empty() {
            Self::Empty
        } else {
            Self::Data(items)
        }
    }
}

impl<T> StageOutcome<T> {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Data(_) => OutcomeKind::Data,
            Self::Empty => OutcomeKind::Empty,
            Self::Transient(_) => OutcomeKind::Transient,
            Self::Parse(_) => OutcomeKind::Parse,
        }
    }

    /// The payload, if any
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Data(data) => Some(data),
            _ => None,
        }
    }

    /// Failure message for `Transient` and `Parse`
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Transient(message) | Self::Parse(message) => Some(message),
            _ => None,
        }
    }
}

impl<T> From<StageError> for StageOutcome<T> {
    fn from(error: StageError) -> Self {
        match error {
            StageError::Parse(_) | StageError::Fetch(FetchError::Body { .. }) => Self::Parse(error.to_string()),
            StageError::Fetch(_) | StageError::Output(_) => Self::Transient(error.to_string()),
        }
    }
}
