/*!
 * In-memory document source for testing.
 *
 * `MockFetcher` serves canned bodies keyed by exact URL. URLs that were not
 * registered answer with a 404, and URLs registered with `fail_with` return
 * a transport error, so every stage outcome can be produced without a network.
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::errors::FetchError;
use super::Fetcher;

#[derive(Debug, Clone)]
enum MockReply {
    Body(String),
    Fail(String),
}

/// Mock fetcher returning registered documents
#[derive(Debug, Default)]
pub struct MockFetcher {
    /// Registered replies by URL
    replies: HashMap<String, MockReply>,
    /// Every URL requested, in call order
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    /// Create an empty mock fetcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`
    pub fn with_document(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.replies.insert(url.into(), MockReply::Body(body.into()));
        self
    }

    /// Fail requests to `url` with a transport error
    pub fn fail_with(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.replies.insert(url.into(), MockReply::Fail(message.into()));
        self
    }

    /// URLs requested so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }

        match self.replies.get(url) {
            Some(MockReply::Body(body)) => Ok(body.clone()),
            Some(MockReply::Fail(message)) => Err(FetchError::RequestFailed {
                url: url.to_string(),
                message: message.clone(),
            }),
            None => Err(FetchError::Status { status_code: 404, url: url.to_string() }),
        }
    }
}
