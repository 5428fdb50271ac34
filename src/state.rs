use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::ServerConfig;
use crate::embedding::EmbeddingClient;
use crate::error::{ServerError, ServerResult};
use crate::retry::RetryConfig;

/// Shared application state
///
/// Everything here is immutable after startup, so it is shared across
/// concurrent requests through `Arc` without locking. The catalog is
/// constructed explicitly and injected rather than living in a module-level
/// global, which keeps the initialization lifecycle visible and the handlers
/// testable.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Product catalog (loaded once, read-only)
    pub catalog: Arc<Catalog>,

    /// Client for the external embedding endpoint
    pub embedder: Arc<EmbeddingClient>,

    /// Client for fetching caller-supplied image URLs
    pub fetcher: reqwest::Client,
}

impl AppState {
    /// Create state for production use: loads the catalog from the
    /// configured path. A missing catalog file is a degraded start, not a
    /// failed one.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let catalog = Catalog::load(&config.catalog_path);
        Self::with_catalog(config, catalog)
    }

    /// Create state around an already-built catalog (used by tests and
    /// embedding pipelines that assemble entries in memory).
    pub fn with_catalog(config: ServerConfig, catalog: Catalog) -> ServerResult<Self> {
        let retry = RetryConfig::default().with_max_retries(config.embed_max_retries);
        let embedder = EmbeddingClient::new(
            config.embed_url.clone(),
            config.embed_timeout(),
            config.embed_connect_timeout(),
            retry,
        )
        .map_err(|err| ServerError::Config(format!("failed to build embedding client: {err}")))?;

        let fetcher = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .map_err(|err| ServerError::Config(format!("failed to build fetch client: {err}")))?;

        Ok(Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            embedder: Arc::new(embedder),
            fetcher,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_starts_with_missing_catalog() {
        let config = ServerConfig {
            catalog_path: "/nonexistent/products.json".into(),
            ..ServerConfig::default()
        };
        let state = AppState::new(config).expect("state should build without a catalog file");
        assert!(state.catalog.is_empty());
    }

    #[test]
    fn state_carries_configured_endpoint() {
        let config = ServerConfig {
            embed_url: "http://embedder.internal/api/embed".into(),
            ..ServerConfig::default()
        };
        let state = AppState::new(config).unwrap();
        assert_eq!(state.embedder.endpoint(), "http://embedder.internal/api/embed");
    }
}
