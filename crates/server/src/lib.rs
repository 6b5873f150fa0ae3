//! Static HTTP publisher.
//!
//! Serves the snapshot directory at `/` and the image cache under
//! `/images/`. Nothing else is routed.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use pocketshot_core::{Config, IMAGES_ROUTE};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Directories published by the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Served at the root path.
    pub snapshot_dir: PathBuf,
    /// Served under [`IMAGES_ROUTE`].
    pub images_dir: PathBuf,
}

impl From<&Config> for ServerConfig {
    fn from(config: &Config) -> Self {
        Self {
            listen_addr: config.listen_addr,
            snapshot_dir: config.cache_dir.clone(),
            images_dir: config.images_dir.clone(),
        }
    }
}

/// Builds the router for `config`.
pub fn router(config: &ServerConfig) -> Router {
    Router::new()
        .nest_service(IMAGES_ROUTE, ServeDir::new(&config.images_dir))
        .fallback_service(ServeDir::new(&config.snapshot_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Binds `config.listen_addr` and serves until the process is stopped.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    let local = listener.local_addr()?;
    info!(
        addr = %local,
        snapshot_dir = %config.snapshot_dir.display(),
        images_dir = %config.images_dir.display(),
        "serving snapshot"
    );

    axum::serve(listener, router(&config)).await
}
