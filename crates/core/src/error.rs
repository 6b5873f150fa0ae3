//! Error types for pocketshot operations.
//!
//! [`PocketshotError`] covers both the fatal failures that abort a run
//! (configuration, source retrieval, snapshot writing) and the per-item
//! failures raised by image strategies. The pipeline absorbs the latter;
//! only the former ever reach a caller of [`crate::generate_snapshot`].
//!
//! # Example
//!
//! ```rust
//! use pocketshot_core::{PocketshotError, Result};
//!
//! fn require(value: Option<String>) -> Result<String> {
//!     value.ok_or(PocketshotError::MissingCredential("POCKET_ACCESS_TOKEN"))
//! }
//! # assert!(require(None).is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for retrieval, enrichment and publishing.
#[derive(Error, Debug)]
pub enum PocketshotError {
    /// A required credential environment variable is unset or blank.
    #[error("Missing credential: set the {0} environment variable")]
    MissingCredential(&'static str),

    /// A configuration value could not be parsed.
    #[error("Invalid configuration for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },

    /// HTTP transport errors from reqwest.
    ///
    /// Wraps DNS failures, refused connections, TLS problems and body read errors.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// A remote endpoint answered with a non-success status.
    #[error("Unexpected status {status} from {url}{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    UnexpectedStatus {
        url: String,
        status: u16,
        reason: Option<String>,
    },

    /// The retrieval response could not be decoded.
    #[error("Malformed response payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// The snapshot could not be serialized.
    #[error("Failed to serialize snapshot: {0}")]
    SnapshotEncoding(serde_json::Error),

    /// A snapshot file could not be read.
    #[error("Failed to read snapshot {path}: {source}")]
    SnapshotRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot file does not hold a valid item list.
    #[error("Invalid snapshot {path}: {source}")]
    SnapshotDecoding {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// File write errors.
    #[error("Failed to write to file: {0}")]
    WriteError(#[from] std::io::Error),

    /// Writing a specific path failed.
    #[error("Failed to write {path}: {source}")]
    PathWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Headless browser launch, navigation or capture failed.
    #[error("Browser error: {0}")]
    Browser(String),

    /// No acquisition strategy accepted the item.
    #[error("No image strategy applies to item {0}")]
    NoStrategy(u64),

    /// The whole generation run exceeded its deadline.
    #[error("Run exceeded its {timeout} second deadline")]
    RunTimeout { timeout: u64 },
}

/// Result type alias for PocketshotError.
pub type Result<T> = std::result::Result<T, PocketshotError>;
