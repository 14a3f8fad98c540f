/*!
 * Error types for the nmrscrape application.
 *
 * This module contains custom error types for the different layers of the
 * scraper, using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur while fetching a remote document
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be sent or the connection failed
    #[error("Request failed for {url}: {message}")]
    RequestFailed {
        /// URL that was requested
        url: String,
        /// Transport error message
        message: String,
    },

    /// The server answered with a non-success status
    #[error("Server responded with {status_code} for {url}")]
    Status {
        /// HTTP status code
        status_code: u16,
        /// URL that was requested
        url: String,
    },

    /// The response body could not be read or decoded
    #[error("Failed to read response body from {url}: {message}")]
    Body {
        /// URL that was requested
        url: String,
        /// Decode error message
        message: String,
    },
}

/// Errors raised while interpreting a fetched document
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    /// A structure record was too short or carried a non-integer position
    #[error("Malformed {record} record on line {line}: {message}")]
    MalformedRecord {
        /// Record prefix (HELIX or SHEET)
        record: String,
        /// 1-based line number in the structure file
        line: usize,
        /// What went wrong
        message: String,
    },

    /// A residue label had no number to match against structure ranges
    #[error("No residue number in label '{0}'")]
    MissingResidueNumber(String),

    /// A summary row mentioning PDB had no data cell to read codes from
    #[error("Row '{0}' mentions PDB but has no data cell")]
    MissingCell(String),
}

/// Failure of a single pipeline stage
#[derive(Error, Debug)]
pub enum StageError {
    /// The document could not be fetched
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The document was fetched but could not be interpreted
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Writing the stage output failed
    #[error("Output error: {0}")]
    Output(String),
}
