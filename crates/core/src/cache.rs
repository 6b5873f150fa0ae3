//! On-disk image cache.
//!
//! A cache entry is the file `<id>.png` in the image directory and its
//! existence is the only record that an item already has an image. There is
//! no index and no expiry. The check lives behind [`ImageCache`] so a
//! metadata-backed cache can replace the directory scan without touching the
//! pipeline.

use std::path::{Path, PathBuf};

use crate::Result;

pub const IMAGE_EXTENSION: &str = "png";

/// Maps item identifiers to cache paths and public references.
pub trait ImageCache: Send + Sync {
    /// Deterministic storage path for an item's image.
    fn path_for(&self, item_id: u64) -> PathBuf;

    /// Whether an image has already been stored for the item.
    fn contains(&self, item_id: u64) -> bool;

    /// Public reference for a stored image.
    fn public_ref(&self, item_id: u64) -> String;
}

/// Cache backed by plain files in a directory.
#[derive(Debug, Clone)]
pub struct DirCache {
    dir: PathBuf,
    public_prefix: String,
}

impl DirCache {
    /// `public_prefix` is the URL the directory is served under, e.g.
    /// `http://localhost:4000/images`.
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        let public_prefix = public_prefix.into().trim_end_matches('/').to_string();
        Self { dir: dir.into(), public_prefix }
    }

    /// Creates the backing directory if needed.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(item_id: u64) -> String {
        format!("{item_id}.{IMAGE_EXTENSION}")
    }
}

impl ImageCache for DirCache {
    fn path_for(&self, item_id: u64) -> PathBuf {
        self.dir.join(Self::file_name(item_id))
    }

    fn contains(&self, item_id: u64) -> bool {
        self.path_for(item_id).is_file()
    }

    fn public_ref(&self, item_id: u64) -> String {
        format!("{}/{}", self.public_prefix, Self::file_name(item_id))
    }
}

/// Temporary sibling of `dest` that is renamed into place once complete.
pub(crate) fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

/// Writes `bytes` to `dest` through a staging file so a failed write never
/// leaves a partial file on `dest`.
pub(crate) async fn write_atomic(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let staging = staging_path(dest);
    let result = async {
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, dest).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&staging).await;
    }
    result
}
