/*!
 * # nmrscrape - BMRB chemical shift and secondary structure scraper
 *
 * A Rust library that joins three public data sources into one table per
 * BMRB entry: average carbon chemical shifts from the BMRB validation
 * report, PDB cross-references from the entry summary page, and
 * HELIX/SHEET ranges from one of the referenced PDB structures.
 *
 * ## Features
 *
 * - Discover entry identifiers from a BMRB search results page
 * - Extract per-residue C, CA and CB average shifts
 * - Collect PDB cross-references of each entry
 * - Annotate residues with the secondary structure covering them
 * - Configurable candidate selection (random, seeded, first)
 * - Bounded concurrency across entries
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `app_controller`: Pipeline driver and run reports
 * - `stages`: The four pipeline stages:
 *   - `stages::discovery`: Entry identifiers from the search page
 *   - `stages::shifts`: Chemical shift table
 *   - `stages::crossref`: PDB cross-references
 *   - `stages::structure`: Structure ranges and annotation
 * - `sources`: Document fetchers (HTTP and in-memory)
 * - `selection`: Cross-reference candidate selection
 * - `observer`: Pipeline event reporting
 * - `html`: HTML text helpers
 * - `flat_file`: CSV reading and writing
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod flat_file;
pub mod html;
pub mod observer;
pub mod selection;
pub mod sources;
pub mod stages;

// Re-export main types for easier usage
pub use app_config::{CandidatePolicy, Config, CrossRefMerge};
pub use app_controller::{Controller, EntryReport, RunSummary};
pub use errors::{FetchError, ParseError, StageError};
pub use stages::{OutcomeKind, StageOutcome};
