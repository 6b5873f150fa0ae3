//! Retrieval of the saved-item list from Pocket.
//!
//! A single `GET {api_base}/get` with the unread, newest-first, complete
//! detail query. Every failure here is fatal to the run.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use crate::config::Credentials;
use crate::model::RetrieveResponse;
use crate::{PocketshotError, Result};

/// Client for the retrieval endpoint.
#[derive(Debug, Clone)]
pub struct SourceClient {
    endpoint: Url,
    credentials: Credentials,
    timeout: Duration,
    http: Client,
}

impl SourceClient {
    pub fn new(api_base: &str, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(&format!("{}/get", api_base.trim_end_matches('/')))
            .map_err(|e| PocketshotError::InvalidUrl(format!("{api_base}: {e}")))?;

        let http = Client::builder().timeout(timeout).build().map_err(PocketshotError::HttpError)?;

        Ok(Self { endpoint, credentials, timeout, http })
    }

    /// Retrieves every unread item.
    pub async fn retrieve(&self) -> Result<RetrieveResponse> {
        info!(endpoint = %self.endpoint, "retrieving saved items");

        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[
                ("consumer_key", self.credentials.consumer_key.as_str()),
                ("access_token", self.credentials.access_token.as_str()),
                ("detailType", "complete"),
                ("state", "unread"),
                ("sort", "newest"),
            ])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let reason = response
                .headers()
                .get("X-Error")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return Err(PocketshotError::UnexpectedStatus {
                url: self.endpoint.to_string(),
                status: status.as_u16(),
                reason,
            });
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let parsed: RetrieveResponse = serde_json::from_slice(&body)?;

        debug!(
            status = parsed.status,
            complete = parsed.complete,
            since = parsed.since,
            items = parsed.list.len(),
            "retrieval batch decoded"
        );

        Ok(parsed)
    }

    fn transport_error(&self, e: reqwest::Error) -> PocketshotError {
        if e.is_timeout() {
            PocketshotError::Timeout { timeout: self.timeout.as_secs() }
        } else {
            PocketshotError::HttpError(e)
        }
    }
}
