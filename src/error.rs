use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
///
/// Every failure a request can produce is converted into one of these at the
/// route boundary and rendered as a JSON body; clients never see a bare
/// stack trace. An absent catalog is deliberately NOT represented here: the
/// service keeps running and returns empty result lists instead.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The request carried no usable image source, or the one it carried was
    /// malformed before any upstream call was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Fetching a caller-supplied image URL failed.
    #[error("image fetch failed: {0}")]
    ImageFetch(String),

    /// The embedding service call failed; carries the typed reason.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("not found")]
    NotFound,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal server error: {0}")]
    Internal(String),
}

/// API error response structure: `{ "error": ..., "detail": ... }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ServerError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServerError::ImageFetch(_) | ServerError::Embedding(_) => StatusCode::BAD_GATEWAY,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Config(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Split into the stable error label and the per-occurrence detail
    fn parts(&self) -> (&'static str, Option<String>) {
        match self {
            ServerError::InvalidInput(msg) => ("invalid input", Some(msg.clone())),
            ServerError::ImageFetch(msg) => ("image fetch failed", Some(msg.clone())),
            ServerError::Embedding(err) => ("embedding failed", Some(err.to_string())),
            ServerError::NotFound => ("not found", None),
            ServerError::Config(msg) => ("configuration error", Some(msg.clone())),
            ServerError::Internal(msg) => ("internal server error", Some(msg.clone())),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error, detail) = self.parts();

        let body = Json(ErrorResponse {
            error: error.to_string(),
            detail,
        });

        (status, body).into_response()
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
