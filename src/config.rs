use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the product catalog JSON file
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// URL of the external embedding endpoint
    #[serde(default = "default_embed_url")]
    pub embed_url: String,

    /// Total timeout for one embedding call in seconds. Generous because the
    /// remote model has cold-start latency.
    #[serde(default = "default_embed_timeout_secs")]
    pub embed_timeout_secs: u64,

    /// Connect timeout for the embedding endpoint in seconds
    #[serde(default = "default_embed_connect_timeout_secs")]
    pub embed_connect_timeout_secs: u64,

    /// Maximum retries for transport-level embedding failures. Rejected
    /// inputs are never retried.
    #[serde(default = "default_embed_max_retries")]
    pub embed_max_retries: u32,

    /// Timeout for fetching an image from a caller-supplied URL in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Maximum number of ranked results returned per search
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Whole-request timeout in seconds. Must exceed the embedding timeout or
    /// slow upstream calls get cut off at the router instead of surfacing a
    /// typed embedding error.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Allowed CORS origins; empty means any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            catalog_path: default_catalog_path(),
            embed_url: default_embed_url(),
            embed_timeout_secs: default_embed_timeout_secs(),
            embed_connect_timeout_secs: default_embed_connect_timeout_secs(),
            embed_max_retries: default_embed_max_retries(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            result_limit: default_result_limit(),
            max_body_size_mb: default_max_body_size_mb(),
            timeout_secs: default_timeout_secs(),
            enable_cors: default_true(),
            allowed_origins: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and config files
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("visual-matcher").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("VISUAL_MATCHER").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get the whole-request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the embedding call timeout as Duration
    pub fn embed_timeout(&self) -> Duration {
        Duration::from_secs(self.embed_timeout_secs)
    }

    /// Get the embedding connect timeout as Duration
    pub fn embed_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.embed_connect_timeout_secs)
    }

    /// Get the image-URL fetch timeout as Duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/products.json")
}

fn default_embed_url() -> String {
    "http://localhost:5001/api/embed".to_string()
}

fn default_embed_timeout_secs() -> u64 {
    75
}

fn default_embed_connect_timeout_secs() -> u64 {
    10
}

fn default_embed_max_retries() -> u32 {
    1
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_result_limit() -> usize {
    10
}

fn default_max_body_size_mb() -> usize {
    20
}

fn default_timeout_secs() -> u64 {
    90
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.result_limit, 10);
        assert_eq!(cfg.max_body_size_mb, 20);
        assert_eq!(cfg.embed_max_retries, 1);
        assert!(cfg.enable_cors);
        assert!(cfg.allowed_origins.is_empty());
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_timeouts_are_ordered() {
        // The router-level timeout must leave room for a slow embedding call,
        // otherwise clients see a generic 408 instead of a typed 502.
        let cfg = ServerConfig::default();
        assert!(cfg.timeout() > cfg.embed_timeout());
    }

    #[test]
    fn test_max_body_size_in_bytes() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.max_body_size(), 20 * 1024 * 1024);
    }
}
