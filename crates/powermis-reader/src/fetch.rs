//! HTTP document fetcher

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use powermis_core::{DocumentFetcher, FetchError};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ReaderError, ReaderResult};

/// [`DocumentFetcher`] issuing a single unauthenticated GET per document
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Fetcher whose requests are abandoned after `timeout`
    pub fn new(timeout: Duration) -> ReaderResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15).min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| ReaderError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn parse_location(location: &str) -> Result<Url, FetchError> {
    let url = Url::parse(location)
        .map_err(|e| FetchError::InvalidLocation(format!("{}: {}", location, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidLocation(format!(
            "unsupported scheme {:?}",
            other
        ))),
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, location: &str) -> Result<Bytes, FetchError> {
        let url = parse_location(location)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;
        debug!(size = body.len(), "Fetched document");
        Ok(body)
    }
}
