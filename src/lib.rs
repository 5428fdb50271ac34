//! Visual Matcher Server - HTTP API for visual product search
//!
//! This crate provides an HTTP server that accepts an image (uploaded bytes,
//! remote URL, or base64 data URI), obtains an embedding vector for it from an
//! external model service, and ranks a static product catalog by cosine
//! similarity against that vector.
//!
//! # Components
//!
//! - **Catalog**: read-only product catalog with precomputed embeddings,
//!   loaded once at startup from a JSON file
//! - **Embedding client**: HTTP client for the external embedding endpoint
//!   with a typed failure taxonomy and bounded retry
//! - **Similarity**: cosine similarity and top-N ranking over the catalog
//! - **Search route**: the request pipeline tying the above together
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe (catalog size, embedding endpoint)
//! - `POST /api/search` - Visual similarity search

pub mod catalog;
pub mod config;
pub mod embedding;
pub mod error;
pub mod middleware;
pub mod retry;
pub mod routes;
pub mod server;
pub mod similarity;
pub mod state;

pub use catalog::{Catalog, CatalogEntry};
pub use config::ServerConfig;
pub use embedding::{EmbeddingClient, EmbeddingError};
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use similarity::{cosine_similarity, rank, RankedResult};
pub use state::AppState;
