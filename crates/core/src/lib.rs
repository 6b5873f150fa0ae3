pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod pipeline;
pub mod resolver;
pub mod screenshot;
pub mod snapshot;
pub mod source;
#[cfg(test)]
mod test_support;

pub use cache::{DirCache, IMAGE_EXTENSION, ImageCache};
pub use config::{Config, Credentials, IMAGES_ROUTE, SNAPSHOT_FILE_NAME};
pub use error::{PocketshotError, Result};
pub use fetch::{FetchConfig, HttpImageFetcher, ImageFetcher};
pub use model::{ContentType, EnrichedItem, ImageDescriptor, Presence, RawItem, RetrieveResponse};
pub use pipeline::{BatchStats, EnrichedBatch, ImageOutcome, Pipeline, PipelineOptions};
pub use resolver::{ImageRequest, ImageResolver, ImageStrategy, Screenshot, SelfImage, VIDEO_THUMBNAIL_HOSTS, VideoThumbnail};
pub use screenshot::{CaptureLimit, ChromiumScreenshotter, NoopCapture, PageCapture, ScreenshotConfig};
pub use snapshot::{generate_snapshot, read_snapshot, render_snapshot, write_snapshot};
pub use source::SourceClient;
