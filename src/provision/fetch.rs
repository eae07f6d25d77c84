use std::future::Future;
use std::time::Duration;

use crate::error::ScanError;

/// Source of release artifacts
pub trait Fetch: Clone + Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ScanError>> + Send;
}

/// Downloads over HTTPS
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(connect_timeout: Duration) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScanError::provisioning_with("Failed to create HTTP client", e))?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScanError> {
        tracing::debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ScanError::provisioning_with(format!("Failed to download '{url}'"), e))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ScanError::provisioning_with(format!("Failed to read '{url}'"), e))?;
        Ok(bytes.to_vec())
    }
}
