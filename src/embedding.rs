//! Client for the external embedding service
//!
//! The embedding service is a black box that accepts a base64-encoded image
//! and returns a fixed-length feature vector. This module owns the wire
//! contract (`POST { "imageBase64": ... }` -> `{ "embedding": [...] }`), the
//! failure taxonomy, and a bounded retry for transport-level failures.
//!
//! Failure kinds are a typed enum so callers branch on the kind instead of
//! parsing message text: only [`EmbeddingError::ConnectionFailure`] is worth
//! retrying - a rejected input stays rejected no matter how often it is
//! resent.

use serde_json::{json, Value};
use std::time::Duration;

use crate::retry::{execute_with_retry_async, RetryConfig};

/// Errors surfaced by [`EmbeddingClient::embed`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum EmbeddingError {
    /// Transport failure or timeout; the request may never have reached the
    /// service. The message names the endpoint so operators can tell
    /// "unreachable" from "timed out".
    #[error("connection failure: {0}")]
    ConnectionFailure(String),
    /// The service answered with a non-success status; its error detail is
    /// carried along, not swallowed.
    #[error("embedding service rejected the request: {0}")]
    RemoteRejected(String),
    /// The service answered 2xx but the body did not contain a usable
    /// embedding vector.
    #[error("invalid embedding response: {0}")]
    InvalidResponseShape(String),
}

impl EmbeddingError {
    /// Transport failures may succeed on a second attempt; rejections and
    /// malformed bodies will not.
    pub fn is_transient(&self) -> bool {
        matches!(self, EmbeddingError::ConnectionFailure(_))
    }
}

/// HTTP client for the embedding endpoint.
///
/// Constructed once at startup and shared across requests; stateless per
/// invocation besides the pooled connections.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    http: reqwest::Client,
    endpoint: String,
    retry: RetryConfig,
}

impl EmbeddingClient {
    /// Build a client for `endpoint` with a bounded total timeout.
    ///
    /// The timeout is generous by default (tens of seconds) because the
    /// remote model may be cold-starting; expiry surfaces as
    /// [`EmbeddingError::ConnectionFailure`], never as a hang.
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(32)
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            retry,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request an embedding vector for a base64-encoded image.
    ///
    /// `image_base64` is passed through as-is; the service accepts both bare
    /// base64 and `data:<mime>;base64,` URIs. Transport failures are retried
    /// up to the configured bound with exponential backoff.
    pub async fn embed(&self, image_base64: &str) -> Result<Vec<f32>, EmbeddingError> {
        let result = execute_with_retry_async(&self.retry, EmbeddingError::is_transient, |attempt| {
            if attempt > 0 {
                tracing::warn!(attempt, endpoint = %self.endpoint, "retrying embedding request");
            }
            self.send_embed_request(image_base64)
        })
        .await;

        result.into_result()
    }

    async fn send_embed_request(&self, image_base64: &str) -> Result<Vec<f32>, EmbeddingError> {
        let payload = json!({ "imageBase64": image_base64 });

        let response = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|err| connection_failure(&self.endpoint, &err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::RemoteRejected(format!(
                "HTTP {status}: {}",
                remote_error_detail(&body)
            )));
        }

        let body: Value = response.json().await.map_err(|err| {
            EmbeddingError::InvalidResponseShape(format!("response body is not JSON: {err}"))
        })?;
        parse_embedding(body)
    }
}

/// Classify a reqwest transport error with a diagnosable hint.
fn connection_failure(endpoint: &str, err: &reqwest::Error) -> EmbeddingError {
    let hint = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection refused or unreachable"
    } else {
        "transport error"
    };
    EmbeddingError::ConnectionFailure(format!("{hint} calling {endpoint}: {err}"))
}

/// Pull the `error` field out of a failure payload, falling back to the raw
/// body when the service did not answer in its documented error shape.
fn remote_error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// Extract the embedding vector from a success body.
///
/// The contract requires a non-empty numeric `embedding` array; anything
/// else is a malformed response, not a usable vector.
fn parse_embedding(body: Value) -> Result<Vec<f32>, EmbeddingError> {
    let Some(values) = body.get("embedding").and_then(Value::as_array) else {
        return Err(EmbeddingError::InvalidResponseShape(
            "missing or non-array `embedding` field".to_string(),
        ));
    };

    if values.is_empty() {
        return Err(EmbeddingError::InvalidResponseShape(
            "`embedding` array is empty".to_string(),
        ));
    }

    values
        .iter()
        .map(|v| {
            v.as_f64().map(|f| f as f32).ok_or_else(|| {
                EmbeddingError::InvalidResponseShape(format!(
                    "`embedding` entries must be numbers, got {v}"
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_embedding_accepts_numeric_array() {
        let body = json!({ "embedding": [0.1, -0.2, 3.0] });
        let vector = parse_embedding(body).unwrap();
        assert_eq!(vector, vec![0.1, -0.2, 3.0]);
    }

    #[test]
    fn parse_embedding_rejects_missing_field() {
        let err = parse_embedding(json!({ "vector": [1.0] })).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponseShape(_)));
        assert!(err.to_string().contains("embedding"));
    }

    #[test]
    fn parse_embedding_rejects_empty_array() {
        let err = parse_embedding(json!({ "embedding": [] })).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponseShape(_)));
    }

    #[test]
    fn parse_embedding_rejects_non_numeric_entries() {
        let err = parse_embedding(json!({ "embedding": [0.1, "oops"] })).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponseShape(_)));
    }

    #[test]
    fn parse_embedding_rejects_non_array_field() {
        let err = parse_embedding(json!({ "embedding": "not-a-vector" })).unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponseShape(_)));
    }

    #[test]
    fn remote_error_detail_prefers_error_field() {
        let detail = remote_error_detail(r#"{"error": "Image processing failed"}"#);
        assert_eq!(detail, "Image processing failed");
    }

    #[test]
    fn remote_error_detail_falls_back_to_raw_body() {
        assert_eq!(remote_error_detail("gateway exploded"), "gateway exploded");
    }

    #[test]
    fn only_connection_failures_are_transient() {
        assert!(EmbeddingError::ConnectionFailure("timeout".into()).is_transient());
        assert!(!EmbeddingError::RemoteRejected("HTTP 500".into()).is_transient());
        assert!(!EmbeddingError::InvalidResponseShape("empty".into()).is_transient());
    }
}
