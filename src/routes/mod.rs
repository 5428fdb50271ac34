//! API route handlers
//!
//! - `health`: liveness and readiness probes
//! - `search`: the visual similarity search endpoint

pub mod health;
pub mod search;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// Root endpoint (GET /); doubles as the "backend running" check the
/// original deployment exposed.
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Visual Matcher Server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/api/search",
            "/health",
            "/ready"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
