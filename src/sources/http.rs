use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use crate::app_config::Config;
use crate::errors::FetchError;
use super::Fetcher;

/// HTTP client for the BMRB and PDBe document endpoints
///
/// One GET per call, no retries. Failures are returned to the caller, which
/// decides what to skip and reports it.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// HTTP client for making requests
    client: Client,
}

impl HttpFetcher {
    /// Create a new fetcher with the given timeout and User-Agent
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .user_agent(user_agent.to_string())
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a fetcher from the application configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(Duration::from_secs(config.timeout_secs), &config.user_agent)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);

        let response = self.client.get(url)
            .send()
            .await
            .map_err(|e| {
                debug!("Request to {} failed: {}", url, e);
                FetchError::RequestFailed { url: url.to_string(), message: e.to_string() }
            })?;

        let status = response.status();
        if !status.is_success() {
            debug!("{} responded with {}", url, status);
            return Err(FetchError::Status { status_code: status.as_u16(), url: url.to_string() });
        }

        response.text().await
            .map_err(|e| FetchError::Body { url: url.to_string(), message: e.to_string() })
    }
}
