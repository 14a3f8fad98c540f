/*!
 * Document sources for the scraper.
 *
 * This module contains the transport seam used by every pipeline stage:
 * - `http`: reqwest-backed client for the live BMRB and PDBe services
 * - `mock`: in-memory source for tests and offline runs
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::FetchError;

/// Common trait for anything that can return a document by URL
///
/// Stages only ever see this trait, so a run can be pointed at the live
/// services or at canned documents without changing the pipeline.
#[async_trait]
pub trait Fetcher: Send + Sync + Debug {
    /// Fetch the document at `url` as text
    ///
    /// # Arguments
    /// * `url` - Absolute URL of the document
    ///
    /// # Returns
    /// * `Result<String, FetchError>` - The body or the reason it could not be obtained
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

pub mod http;
pub mod mock;

pub use http::HttpFetcher;
pub use mock::MockFetcher;
