//! Runtime configuration.
//!
//! Everything is resolved once at startup and passed down explicitly; nothing
//! below this module reads the process environment. [`Config::from_lookup`]
//! takes any key lookup so tests can supply values without touching
//! `std::env`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::{PocketshotError, Result};

pub const ENV_ACCESS_TOKEN: &str = "POCKET_ACCESS_TOKEN";
pub const ENV_CONSUMER_KEY: &str = "POCKET_CONSUMER_KEY";

pub const DEFAULT_API_BASE: &str = "https://getpocket.com/v3";
pub const SNAPSHOT_FILE_NAME: &str = "all.json";
pub const IMAGES_ROUTE: &str = "/images";

/// Credentials for the retrieval endpoint.
#[derive(Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub access_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &"<redacted>")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Reads both credentials, failing on the first one that is unset or blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(PocketshotError::MissingCredential(key))
        };

        Ok(Self { access_token: required(ENV_ACCESS_TOKEN)?, consumer_key: required(ENV_CONSUMER_KEY)? })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

/// Process-wide settings for both the `get` and `serve` modes.
#[derive(Debug, Clone)]
pub struct Config {
    /// Retrieval API base, without the trailing `/get`.
    pub api_base: String,
    /// Directory holding `<id>.png` cache entries.
    pub images_dir: PathBuf,
    /// Directory holding the snapshot; served at `/`.
    pub cache_dir: PathBuf,
    pub listen_addr: SocketAddr,
    /// Prefix for published image references.
    pub public_url: String,
    /// Whether missing images are acquired during a run.
    pub generate_images: bool,
    /// Whether the binary installs a log subscriber.
    pub logging: bool,
    pub workers: usize,
    pub max_browsers: usize,
    pub request_timeout: Duration,
    pub render_timeout: Duration,
    pub run_timeout: Duration,
    pub chrome_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            images_dir: PathBuf::from("images"),
            cache_dir: PathBuf::from("cache"),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 4000)),
            public_url: "http://localhost:4000".to_string(),
            generate_images: true,
            logging: true,
            workers: 4,
            max_browsers: 2,
            request_timeout: Duration::from_secs(30),
            render_timeout: Duration::from_secs(30),
            run_timeout: Duration::from_secs(900),
            chrome_path: None,
        }
    }
}

impl Config {
    /// Builds a config from `lookup`, using defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(v) = get("POCKETSHOT_API_BASE") {
            config.api_base = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("POCKETSHOT_IMAGES_DIR") {
            config.images_dir = PathBuf::from(v);
        }
        if let Some(v) = get("POCKETSHOT_CACHE_DIR") {
            config.cache_dir = PathBuf::from(v);
        }
        if let Some(v) = get("POCKETSHOT_ADDR") {
            config.listen_addr = v.parse().map_err(|e| invalid("POCKETSHOT_ADDR", e))?;
        }
        if let Some(v) = get("POCKETSHOT_PUBLIC_URL") {
            config.public_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("POCKETSHOT_SCREENSHOTS") {
            config.generate_images = parse_bool("POCKETSHOT_SCREENSHOTS", &v)?;
        }
        if let Some(v) = get("POCKETSHOT_LOG") {
            config.logging = parse_bool("POCKETSHOT_LOG", &v)?;
        }
        if let Some(v) = get("POCKETSHOT_WORKERS") {
            config.workers = parse_count("POCKETSHOT_WORKERS", &v)?;
        }
        if let Some(v) = get("POCKETSHOT_MAX_BROWSERS") {
            config.max_browsers = parse_count("POCKETSHOT_MAX_BROWSERS", &v)?;
        }
        if let Some(v) = get("POCKETSHOT_REQUEST_TIMEOUT") {
            config.request_timeout = parse_secs("POCKETSHOT_REQUEST_TIMEOUT", &v)?;
        }
        if let Some(v) = get("POCKETSHOT_RENDER_TIMEOUT") {
            config.render_timeout = parse_secs("POCKETSHOT_RENDER_TIMEOUT", &v)?;
        }
        if let Some(v) = get("POCKETSHOT_RUN_TIMEOUT") {
            config.run_timeout = parse_secs("POCKETSHOT_RUN_TIMEOUT", &v)?;
        }
        if let Some(v) = get("POCKETSHOT_CHROME_PATH") {
            config.chrome_path = Some(PathBuf::from(v));
        }

        Ok(config)
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.cache_dir.join(SNAPSHOT_FILE_NAME)
    }

    /// Public prefix under which cache entries are served.
    pub fn images_url(&self) -> String {
        format!("{}{}", self.public_url, IMAGES_ROUTE)
    }
}

fn invalid(key: &str, reason: impl std::fmt::Display) -> PocketshotError {
    PocketshotError::InvalidConfig { key: key.to_string(), reason: reason.to_string() }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(invalid(key, format!("expected a boolean, got {other:?}"))),
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    match value.parse::<usize>() {
        Ok(0) => Err(invalid(key, "must be at least 1")),
        Ok(n) => Ok(n),
        Err(e) => Err(invalid(key, e)),
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    match value.parse::<u64>() {
        Ok(0) => Err(invalid(key, "must be at least 1 second")),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(invalid(key, e)),
    }
}
