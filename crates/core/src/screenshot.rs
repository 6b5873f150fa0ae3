//! Full-page screenshots through headless Chromium.
//!
//! Every capture launches its own browser and closes it afterwards. The
//! number of browsers alive at once is capped by wrapping the backend in a
//! [`CaptureLimit`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::{PocketshotError, Result};

/// JPEG/WebP quality passed with every capture.
pub const CAPTURE_QUALITY: i64 = 95;

/// Renders a page and writes an image of it to a local path.
#[async_trait]
pub trait PageCapture: Send + Sync {
    async fn capture(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Settings for [`ChromiumScreenshotter`].
#[derive(Debug, Clone)]
pub struct ScreenshotConfig {
    /// Chromium executable; auto-detected when unset.
    pub chrome_path: Option<PathBuf>,
    /// Upper bound on navigation, and separately on capture.
    pub timeout: Duration,
    /// Pause after navigation so late layout and images can land.
    pub settle: Duration,
    pub window: (u32, u32),
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            timeout: Duration::from_secs(30),
            settle: Duration::from_secs(1),
            window: (1280, 800),
        }
    }
}

/// A capture backend used when the `screenshot` feature is disabled.
pub struct NoopCapture;

#[async_trait]
impl PageCapture for NoopCapture {
    async fn capture(&self, url: &str, _dest: &Path) -> Result<()> {
        Err(PocketshotError::Browser(format!("screenshots are not available in this build ({url})")))
    }
}

/// Caps how many captures of the wrapped backend run at once.
pub struct CaptureLimit<C> {
    inner: C,
    permits: Arc<Semaphore>,
}

impl<C: PageCapture> CaptureLimit<C> {
    /// A limit of zero is raised to one.
    pub fn new(inner: C, max_concurrent: usize) -> Self {
        Self { inner, permits: Arc::new(Semaphore::new(max_concurrent.max(1))) }
    }
}

#[async_trait]
impl<C: PageCapture> PageCapture for CaptureLimit<C> {
    async fn capture(&self, url: &str, dest: &Path) -> Result<()> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| PocketshotError::Browser(format!("capture limiter closed: {e}")))?;
        self.inner.capture(url, dest).await
    }
}

/// [`PageCapture`] backed by chromiumoxide.
#[cfg_attr(not(feature = "screenshot"), allow(dead_code))]
pub struct ChromiumScreenshotter {
    config: ScreenshotConfig,
}

impl ChromiumScreenshotter {
    pub fn new(config: ScreenshotConfig) -> Self {
        Self { config }
    }
}

#[cfg(feature = "screenshot")]
mod chromium {
    use super::*;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
    use chromiumoxide::page::{Page, ScreenshotParams};
    use futures::StreamExt;
    use tracing::debug;

    use crate::cache::write_atomic;

    fn browser_err(context: &str, e: impl std::fmt::Display) -> PocketshotError {
        PocketshotError::Browser(format!("{context}: {e}"))
    }

    impl ChromiumScreenshotter {
        fn browser_config(&self) -> Result<BrowserConfig> {
            let (width, height) = self.config.window;
            let mut builder = BrowserConfig::builder()
                .new_headless_mode()
                .window_size(width, height)
                .arg("--disable-gpu")
                .arg("--no-sandbox")
                .arg("--disable-dev-shm-usage")
                .arg("--disable-extensions")
                .arg("--hide-scrollbars");

            if let Some(path) = &self.config.chrome_path {
                builder = builder.chrome_executable(path);
            }

            builder.build().map_err(|e| browser_err("failed to build browser config", e))
        }

        async fn render(&self, page: &Page, url: &str) -> Result<Vec<u8>> {
            let timeout = self.config.timeout;

            match tokio::time::timeout(timeout, page.goto(url)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(browser_err("navigation failed", e)),
                Err(_) => return Err(browser_err("navigation timed out", format!("{}s", timeout.as_secs()))),
            }

            tokio::time::sleep(self.config.settle).await;

            let params = ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .quality(CAPTURE_QUALITY)
                .full_page(true)
                .build();

            match tokio::time::timeout(timeout, page.screenshot(params)).await {
                Ok(Ok(bytes)) => Ok(bytes),
                Ok(Err(e)) => Err(browser_err("capture failed", e)),
                Err(_) => Err(browser_err("capture timed out", format!("{}s", timeout.as_secs()))),
            }
        }
    }

    #[async_trait]
    impl PageCapture for ChromiumScreenshotter {
        async fn capture(&self, url: &str, dest: &Path) -> Result<()> {
            let (mut browser, mut handler) = Browser::launch(self.browser_config()?)
                .await
                .map_err(|e| browser_err("failed to launch Chromium", e))?;

            let events = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let result = async {
                let page = browser.new_page("about:blank").await.map_err(|e| browser_err("failed to open page", e))?;
                let bytes = self.render(&page, url).await;
                let _ = page.close().await;
                bytes
            }
            .await;

            let _ = browser.close().await;
            let _ = browser.wait().await;
            events.abort();

            let bytes = result?;
            debug!(url, bytes = bytes.len(), "captured screenshot");

            write_atomic(dest, &bytes)
                .await
                .map_err(|source| PocketshotError::PathWrite { path: dest.to_path_buf(), source })
        }
    }
}

#[cfg(not(feature = "screenshot"))]
#[async_trait]
impl PageCapture for ChromiumScreenshotter {
    async fn capture(&self, url: &str, dest: &Path) -> Result<()> {
        NoopCapture.capture(url, dest).await
    }
}
