//! Recording fetch/capture doubles shared by unit tests.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::fetch::ImageFetcher;
use crate::screenshot::PageCapture;
use crate::{PocketshotError, Result};

/// Records every call and writes a marker file unless the URL is listed as
/// failing.
#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<String>>,
    failing: HashSet<String>,
}

impl Recorder {
    pub fn failing(urls: &[&str]) -> Self {
        Self { failing: urls.iter().map(|u| u.to_string()).collect(), ..Default::default() }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn record(&self, url: &str, dest: &Path, marker: &str) -> Result<()> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.failing.contains(url) {
            return Err(PocketshotError::Browser(format!("simulated failure for {url}")));
        }
        tokio::fs::write(dest, format!("{marker}:{url}")).await?;
        Ok(())
    }
}

#[async_trait]
impl ImageFetcher for Recorder {
    async fn fetch(&self, src: &str, dest: &Path) -> Result<()> {
        self.record(src, dest, "fetch").await
    }
}

#[async_trait]
impl PageCapture for Recorder {
    async fn capture(&self, url: &str, dest: &Path) -> Result<()> {
        self.record(url, dest, "capture").await
    }
}
