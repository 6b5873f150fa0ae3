//! Choosing and running an image-acquisition strategy for one item.
//!
//! Strategies are tried in order and the first one that selects a target is
//! the only one that runs. A failed acquisition is not retried with a later
//! strategy; the item simply has no image until the next run.
//!
//! The default chain is:
//!
//! 1. [`VideoThumbnail`]: an attached image hosted on a known video-thumbnail
//!    domain is downloaded as-is.
//! 2. [`SelfImage`]: an item that is itself an image is downloaded from its
//!    canonical URL.
//! 3. [`Screenshot`]: everything else is rendered in a headless browser.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::fetch::ImageFetcher;
use crate::model::{ContentType, RawItem};
use crate::screenshot::PageCapture;
use crate::{PocketshotError, Result};

/// Hosts whose attached images are known video thumbnails.
pub const VIDEO_THUMBNAIL_HOSTS: &[&str] = &["i.ytimg.com", "img.youtube.com"];

/// The parts of an item the strategies decide on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub item_id: u64,
    /// Resolved URL, or the given URL when nothing was resolved.
    pub url: String,
    pub content_type: ContentType,
    /// Source URLs of attached images, in upstream index order.
    pub attached: Vec<String>,
}

impl ImageRequest {
    pub fn from_item(item: &RawItem) -> Self {
        Self {
            item_id: item.item_id,
            url: item.canonical_url().to_string(),
            content_type: item.content_type(),
            attached: item.images.iter().map(|image| image.src.clone()).filter(|src| !src.is_empty()).collect(),
        }
    }
}

/// One link of the fallback chain.
#[async_trait]
pub trait ImageStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// URL this strategy would acquire for `request`, or `None` to pass.
    fn select(&self, request: &ImageRequest) -> Option<String>;

    /// Acquires `target` and stores it at `dest`.
    async fn acquire(&self, target: &str, dest: &Path) -> Result<()>;
}

/// Downloads an attached thumbnail from a known video host.
pub struct VideoThumbnail {
    hosts: Vec<String>,
    fetcher: Arc<dyn ImageFetcher>,
}

impl VideoThumbnail {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self::with_hosts(fetcher, VIDEO_THUMBNAIL_HOSTS.iter().map(|h| h.to_string()).collect())
    }

    pub fn with_hosts(fetcher: Arc<dyn ImageFetcher>, hosts: Vec<String>) -> Self {
        Self { hosts, fetcher }
    }
}

#[async_trait]
impl ImageStrategy for VideoThumbnail {
    fn name(&self) -> &'static str {
        "video-thumbnail"
    }

    fn select(&self, request: &ImageRequest) -> Option<String> {
        request
            .attached
            .iter()
            .find(|src| self.hosts.iter().any(|host| src.contains(host.as_str())))
            .cloned()
    }

    async fn acquire(&self, target: &str, dest: &Path) -> Result<()> {
        self.fetcher.fetch(target, dest).await
    }
}

/// Downloads the item itself when the item is an image.
pub struct SelfImage {
    fetcher: Arc<dyn ImageFetcher>,
}

impl SelfImage {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ImageStrategy for SelfImage {
    fn name(&self) -> &'static str {
        "self-image"
    }

    fn select(&self, request: &ImageRequest) -> Option<String> {
        (request.content_type == ContentType::Image).then(|| request.url.clone())
    }

    async fn acquire(&self, target: &str, dest: &Path) -> Result<()> {
        self.fetcher.fetch(target, dest).await
    }
}

/// Renders the canonical URL. Selects every request, so it belongs last.
pub struct Screenshot {
    capture: Arc<dyn PageCapture>,
}

impl Screenshot {
    pub fn new(capture: Arc<dyn PageCapture>) -> Self {
        Self { capture }
    }
}

#[async_trait]
impl ImageStrategy for Screenshot {
    fn name(&self) -> &'static str {
        "screenshot"
    }

    fn select(&self, request: &ImageRequest) -> Option<String> {
        Some(request.url.clone())
    }

    async fn acquire(&self, target: &str, dest: &Path) -> Result<()> {
        self.capture.capture(target, dest).await
    }
}

/// Runs the first applicable strategy of an ordered chain.
pub struct ImageResolver {
    strategies: Vec<Box<dyn ImageStrategy>>,
}

impl ImageResolver {
    pub fn new(strategies: Vec<Box<dyn ImageStrategy>>) -> Self {
        Self { strategies }
    }

    /// The standard thumbnail → self image → screenshot chain.
    pub fn standard(fetcher: Arc<dyn ImageFetcher>, capture: Arc<dyn PageCapture>) -> Self {
        Self::new(vec![
            Box::new(VideoThumbnail::new(Arc::clone(&fetcher))),
            Box::new(SelfImage::new(fetcher)),
            Box::new(Screenshot::new(capture)),
        ])
    }

    /// Appends a strategy at the end of the chain.
    pub fn push(&mut self, strategy: Box<dyn ImageStrategy>) {
        self.strategies.push(strategy);
    }

    /// Strategy and target chosen for `request`. Empty targets never select.
    pub fn plan(&self, request: &ImageRequest) -> Option<(&dyn ImageStrategy, String)> {
        self.strategies.iter().find_map(|strategy| {
            strategy
                .select(request)
                .filter(|target| !target.is_empty())
                .map(|target| (strategy.as_ref(), target))
        })
    }

    /// Acquires an image for `request` into `dest`.
    pub async fn try_resolve(&self, request: &ImageRequest, dest: &Path) -> Result<()> {
        let (strategy, target) = self.plan(request).ok_or(PocketshotError::NoStrategy(request.item_id))?;

        info!(item_id = request.item_id, strategy = strategy.name(), source_url = %target, "acquiring image");
        strategy.acquire(&target, dest).await
    }

    /// Like [`try_resolve`](Self::try_resolve), reporting only success.
    pub async fn resolve(&self, request: &ImageRequest, dest: &Path) -> bool {
        match self.try_resolve(request, dest).await {
            Ok(()) => {
                debug!(item_id = request.item_id, dest = %dest.display(), "image stored");
                true
            }
            Err(e) => {
                warn!(item_id = request.item_id, url = %request.url, error = %e, "image acquisition failed");
                false
            }
        }
    }
}
