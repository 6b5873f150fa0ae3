//! Per-item enrichment.
//!
//! Each raw item is normalized, classified and given an image when one is
//! cached or can be acquired, then the batch is ordered by sort rank. Items
//! are processed on a bounded number of concurrent slots. Image failures are
//! logged and leave the item's `image` empty; they never fail the batch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::stream::{self, StreamExt};
use tokio::sync::OwnedMutexGuard;
use tracing::info;

use crate::cache::{DirCache, ImageCache};
use crate::config::Config;
use crate::fetch::{FetchConfig, HttpImageFetcher};
use crate::model::{EnrichedItem, RawItem};
use crate::resolver::{ImageRequest, ImageResolver};
use crate::screenshot::{CaptureLimit, ChromiumScreenshotter, ScreenshotConfig};
use crate::Result;

/// Knobs for a single enrichment run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Acquire images that are not cached yet.
    pub generate_images: bool,
    /// Items enriched concurrently.
    pub workers: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { generate_images: true, workers: 4 }
    }
}

/// How an item ended up with (or without) an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    /// A cache entry already existed.
    Cached,
    /// A strategy stored a new cache entry.
    Acquired,
    /// The chosen strategy failed.
    Failed,
    /// Nothing cached and image generation is off.
    Skipped,
}

impl ImageOutcome {
    pub fn has_image(self) -> bool {
        matches!(self, ImageOutcome::Cached | ImageOutcome::Acquired)
    }
}

/// Outcome counts for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub cached: usize,
    pub acquired: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchStats {
    fn record(&mut self, outcome: ImageOutcome) {
        match outcome {
            ImageOutcome::Cached => self.cached += 1,
            ImageOutcome::Acquired => self.acquired += 1,
            ImageOutcome::Failed => self.failed += 1,
            ImageOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.cached + self.acquired + self.failed + self.skipped
    }
}

/// Ordered output of a run.
#[derive(Debug, Clone, Default)]
pub struct EnrichedBatch {
    pub items: Vec<EnrichedItem>,
    pub stats: BatchStats,
}

/// One async lock per item id, so check-then-acquire for an id never runs twice at once.
#[derive(Default)]
struct ItemLocks {
    held: Mutex<HashMap<u64, Arc<tokio::sync::Mutex<()>>>>,
}

impl ItemLocks {
    async fn lock(&self, item_id: u64) -> OwnedMutexGuard<()> {
        let slot = {
            let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(held.entry(item_id).or_default())
        };
        slot.lock_owned().await
    }

    fn release(&self, item_id: u64) {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        if held.get(&item_id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            held.remove(&item_id);
        }
    }
}

/// Normalizes raw items and attaches images through an [`ImageResolver`].
pub struct Pipeline {
    resolver: ImageResolver,
    cache: Arc<dyn ImageCache>,
    options: PipelineOptions,
    locks: ItemLocks,
}

impl Pipeline {
    pub fn new(resolver: ImageResolver, cache: Arc<dyn ImageCache>, options: PipelineOptions) -> Self {
        Self { resolver, cache, options, locks: ItemLocks::default() }
    }

    /// Wires the HTTP fetcher, Chromium screenshotter and directory cache
    /// described by `config`. Creates the image directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpImageFetcher::new(&FetchConfig {
            timeout: config.request_timeout.as_secs(),
            ..Default::default()
        })?;
        let capture = CaptureLimit::new(
            ChromiumScreenshotter::new(ScreenshotConfig {
                chrome_path: config.chrome_path.clone(),
                timeout: config.render_timeout,
                ..Default::default()
            }),
            config.max_browsers,
        );

        let cache = DirCache::new(&config.images_dir, config.images_url());
        cache.ensure_dir()?;

        let options = PipelineOptions { generate_images: config.generate_images, workers: config.workers };
        Ok(Self::new(ImageResolver::standard(Arc::new(fetcher), Arc::new(capture)), Arc::new(cache), options))
    }

    /// Enriches every item and orders the result by ascending sort rank.
    ///
    /// Equal ranks are ordered by item id so repeated runs produce the same
    /// output.
    pub async fn enrich(&self, items: HashMap<String, RawItem>) -> EnrichedBatch {
        let workers = self.options.workers.max(1);

        let results: Vec<(EnrichedItem, ImageOutcome)> = stream::iter(items.into_values())
            .map(|item| self.enrich_item(item))
            .buffer_unordered(workers)
            .collect()
            .await;

        let mut batch = EnrichedBatch::default();
        for (item, outcome) in results {
            batch.stats.record(outcome);
            batch.items.push(item);
        }
        batch.items.sort_by_key(|item| (item.sort_id, item.item_id));
        batch
    }

    /// Enriches a single item.
    pub async fn enrich_item(&self, item: RawItem) -> (EnrichedItem, ImageOutcome) {
        let request = ImageRequest::from_item(&item);
        let title = item.display_title().to_string();

        info!(item_id = item.item_id, title = %title, url = %request.url, content_type = %request.content_type, "processing item");

        let outcome = self.ensure_image(&request).await;
        let image = if outcome.has_image() { self.cache.public_ref(item.item_id) } else { String::new() };

        let enriched = EnrichedItem {
            item_id: item.item_id,
            title,
            url: request.url,
            excerpt: item.excerpt,
            content_type: request.content_type,
            sort_id: item.sort_id,
            image,
        };
        (enriched, outcome)
    }

    async fn ensure_image(&self, request: &ImageRequest) -> ImageOutcome {
        let guard = self.locks.lock(request.item_id).await;

        let outcome = if self.cache.contains(request.item_id) {
            ImageOutcome::Cached
        } else if !self.options.generate_images {
            ImageOutcome::Skipped
        } else {
            let dest = self.cache.path_for(request.item_id);
            if self.resolver.resolve(request, &dest).await && self.cache.contains(request.item_id) {
                ImageOutcome::Acquired
            } else {
                ImageOutcome::Failed
            }
        };

        drop(guard);
        self.locks.release(request.item_id);
        outcome
    }
}
