//! Direct image downloads.
//!
//! The body is streamed into a staging file next to the destination and
//! renamed into place once fully written.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::cache::staging_path;
use crate::{PocketshotError, Result};

/// Downloads a remote image to a local path.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, src: &str, dest: &Path) -> Result<()>;
}

/// HTTP client configuration for image downloads.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: "Mozilla/5.0 (compatible; pocketshot/0.1)".to_string() }
    }
}

/// [`ImageFetcher`] over a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
    timeout: u64,
}

impl HttpImageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(&config.user_agent)
            .build()
            .map_err(PocketshotError::HttpError)?;

        Ok(Self { client, timeout: config.timeout })
    }

    fn transport_error(&self, e: reqwest::Error) -> PocketshotError {
        if e.is_timeout() { PocketshotError::Timeout { timeout: self.timeout } } else { PocketshotError::HttpError(e) }
    }

    async fn stream_to(&self, response: reqwest::Response, staging: &Path) -> Result<()> {
        let write_err = |source| PocketshotError::PathWrite { path: staging.to_path_buf(), source };

        let mut file = tokio::fs::File::create(staging).await.map_err(write_err)?;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| self.transport_error(e))?;
            file.write_all(&chunk).await.map_err(write_err)?;
        }
        file.flush().await.map_err(write_err)?;
        Ok(())
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, src: &str, dest: &Path) -> Result<()> {
        let url = Url::parse(src).map_err(|e| PocketshotError::InvalidUrl(format!("{src}: {e}")))?;

        let response = self.client.get(url).send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PocketshotError::UnexpectedStatus { url: src.to_string(), status: status.as_u16(), reason: None });
        }

        let staging = staging_path(dest);
        if let Err(e) = self.stream_to(response, &staging).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e);
        }

        tokio::fs::rename(&staging, dest)
            .await
            .map_err(|source| PocketshotError::PathWrite { path: dest.to_path_buf(), source })
    }
}
