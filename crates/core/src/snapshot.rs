//! Snapshot file generation.
//!
//! The snapshot is the full ordered item list as indented JSON. It is only
//! written once retrieval and enrichment have both completed, and replaces
//! any previous snapshot in a single rename.

use std::path::Path;

use tracing::info;

use crate::cache::write_atomic;
use crate::config::{Config, Credentials};
use crate::model::EnrichedItem;
use crate::pipeline::{EnrichedBatch, Pipeline};
use crate::source::SourceClient;
use crate::{PocketshotError, Result};

/// Serializes `items` with two-space indentation.
pub fn render_snapshot(items: &[EnrichedItem]) -> Result<String> {
    serde_json::to_string_pretty(items).map_err(PocketshotError::SnapshotEncoding)
}

/// Writes the snapshot to `path`, creating the parent directory if needed.
pub async fn write_snapshot(path: &Path, items: &[EnrichedItem]) -> Result<()> {
    let json = render_snapshot(items)?;
    let path_err = |source| PocketshotError::PathWrite { path: path.to_path_buf(), source };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(path_err)?;
    }
    write_atomic(path, json.as_bytes()).await.map_err(path_err)
}

/// Reads a snapshot previously written by [`write_snapshot`].
pub async fn read_snapshot(path: &Path) -> Result<Vec<EnrichedItem>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| PocketshotError::SnapshotRead { path: path.to_path_buf(), source })?;
    serde_json::from_slice(&bytes).map_err(|source| PocketshotError::SnapshotDecoding { path: path.to_path_buf(), source })
}

/// Retrieves, enriches and publishes one snapshot.
///
/// Retrieval and enrichment together are bounded by `config.run_timeout`;
/// when it expires every in-flight download and render is dropped and the
/// previous snapshot is left untouched.
pub async fn generate_snapshot(config: &Config, credentials: Credentials) -> Result<EnrichedBatch> {
    let source = SourceClient::new(&config.api_base, credentials, config.request_timeout)?;
    let pipeline = Pipeline::from_config(config)?;

    let run = async {
        let response = source.retrieve().await?;
        info!(items = response.list.len(), "retrieved saved items");
        Ok::<_, PocketshotError>(pipeline.enrich(response.list).await)
    };

    let batch = tokio::time::timeout(config.run_timeout, run)
        .await
        .map_err(|_| PocketshotError::RunTimeout { timeout: config.run_timeout.as_secs() })??;

    let path = config.snapshot_path();
    write_snapshot(&path, &batch.items).await?;
    info!(path = %path.display(), items = batch.items.len(), "snapshot written");

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContentType;
    use tempfile::TempDir;

    fn sample() -> Vec<EnrichedItem> {
        vec![EnrichedItem {
            item_id: 12,
            title: "A title".into(),
            url: "https://example.com".into(),
            excerpt: String::new(),
            content_type: ContentType::Article,
            sort_id: 0,
            image: "http://localhost:4000/images/12.png".into(),
        }]
    }

    #[test]
    fn test_render_uses_two_space_indent() {
        let json = render_snapshot(&sample()).unwrap();
        assert!(json.starts_with("[\n  {\n    \"item_id\": 12,"));
        assert!(json.contains("\"type\": \"article\""));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_snapshot(&[]).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_write_creates_parent_and_overwrites() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cache").join("all.json");

        write_snapshot(&path, &sample()).await.unwrap();
        assert_eq!(read_snapshot(&path).await.unwrap(), sample());

        write_snapshot(&path, &[]).await.unwrap();
        assert!(read_snapshot(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_missing_snapshot() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("all.json");

        let err = read_snapshot(&path).await.unwrap_err();
        assert!(matches!(err, PocketshotError::SnapshotRead { path: ref p, .. } if *p == path));
    }

    #[tokio::test]
    async fn test_read_invalid_snapshot() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("all.json");
        std::fs::write(&path, "previous").unwrap();

        let err = read_snapshot(&path).await.unwrap_err();
        assert!(matches!(err, PocketshotError::SnapshotDecoding { .. }));
        assert!(err.to_string().starts_with("Invalid snapshot"));
    }
}
