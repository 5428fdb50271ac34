//! Visual similarity search endpoint
//!
//! `POST /api/search` runs the whole request pipeline: pick exactly one
//! image source out of the request, turn it into a base64 data URI, ask the
//! embedding service for a feature vector, rank the catalog against it, and
//! shape the response. Every failure becomes a typed [`ServerError`] before
//! it leaves this module; nothing past the embedding call can fail.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ServerError, ServerResult};
use crate::similarity::{rank, RankedResult};
use crate::state::AppState;

/// Multipart field name carrying the uploaded image.
pub const IMAGE_FIELD: &str = "imageFile";

/// Accepted as an alias for [`IMAGE_FIELD`]; older clients upload under it.
const IMAGE_FIELD_ALIAS: &str = "image";

/// Fallback MIME type when the upload does not declare one.
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// JSON request body (the non-multipart input shapes)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
    /// HTTP(S) URL of an image to fetch and embed
    #[serde(default)]
    pub image_url: Option<String>,

    /// Base64-encoded image, with or without a `data:` URI prefix
    #[serde(default)]
    pub image_base64: Option<String>,

    /// Legacy field: a URL under the multipart field's name
    #[serde(default)]
    pub image_file: Option<String>,
}

/// Search response
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<RankedResult>,
}

/// Exactly one image source per request.
#[derive(Debug)]
enum ImageSource {
    Bytes { data: Bytes, mime: String },
    Url(String),
    Base64(String),
}

/// Search the catalog for products visually similar to the submitted image.
///
/// Accepts exactly one of:
/// - `multipart/form-data` with the raw image under the `imageFile` field,
/// - JSON `{ "imageUrl": "https://..." }`,
/// - JSON `{ "imageBase64": "data:image/jpeg;base64,..." }`.
///
/// Returns `{ "results": [...] }` ordered by similarity, at most the
/// configured result limit. An empty catalog yields an empty list, not an
/// error.
pub async fn search_products(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> ServerResult<impl IntoResponse> {
    let source = extract_image_source(request, &state).await?;

    let image_base64 = match source {
        ImageSource::Bytes { data, mime } => {
            tracing::info!(bytes = data.len(), %mime, "embedding uploaded image");
            encode_data_uri(&data, &mime)
        }
        ImageSource::Base64(encoded) => {
            tracing::info!("embedding base64 image from request body");
            encoded
        }
        ImageSource::Url(url) => {
            tracing::info!(%url, "fetching image from URL");
            let data = fetch_image(&state, &url).await?;
            encode_data_uri(&data, DEFAULT_IMAGE_MIME)
        }
    };

    let embedding = state.embedder.embed(&image_base64).await?;
    tracing::debug!(dimension = embedding.len(), "received query embedding");

    let results = rank(&embedding, &state.catalog, state.config.result_limit);
    tracing::info!(results = results.len(), "search completed");

    Ok(Json(SearchResponse { results }))
}

/// Dispatch on content type and pull the one image source out of the request.
async fn extract_image_source(request: Request, state: &Arc<AppState>) -> ServerResult<ImageSource> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|err| ServerError::InvalidInput(format!("malformed multipart body: {err}")))?;
        return image_from_multipart(multipart).await;
    }

    let Json(body) = Json::<SearchBody>::from_request(request, state)
        .await
        .map_err(|err| {
            ServerError::InvalidInput(format!(
                "expected a multipart upload or a JSON body: {err}"
            ))
        })?;
    image_from_json(body)
}

async fn image_from_multipart(mut multipart: Multipart) -> ServerResult<ImageSource> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError::InvalidInput(format!("malformed multipart field: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != IMAGE_FIELD && name != IMAGE_FIELD_ALIAS {
            continue;
        }

        let mime = field
            .content_type()
            .unwrap_or(DEFAULT_IMAGE_MIME)
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|err| ServerError::InvalidInput(format!("failed to read upload: {err}")))?;

        if data.is_empty() {
            return Err(ServerError::InvalidInput(format!(
                "uploaded `{IMAGE_FIELD}` field is empty"
            )));
        }
        return Ok(ImageSource::Bytes { data, mime });
    }

    Err(ServerError::InvalidInput(format!(
        "no `{IMAGE_FIELD}` field in multipart body"
    )))
}

fn image_from_json(body: SearchBody) -> ServerResult<ImageSource> {
    if let Some(encoded) = non_empty(body.image_base64) {
        return Ok(ImageSource::Base64(encoded));
    }
    if let Some(url) = non_empty(body.image_url) {
        return url_source(url);
    }
    // Legacy clients send a URL under the upload field's name
    if let Some(url) = non_empty(body.image_file) {
        return url_source(url);
    }

    Err(ServerError::InvalidInput(
        "no valid image file, URL, or base64 data provided".to_string(),
    ))
}

fn url_source(url: String) -> ServerResult<ImageSource> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(ImageSource::Url(url))
    } else {
        Err(ServerError::InvalidInput(format!(
            "image URL must be http(s), got `{url}`"
        )))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Download a caller-supplied image URL with the shared bounded-timeout
/// client.
async fn fetch_image(state: &Arc<AppState>, url: &str) -> ServerResult<Bytes> {
    let response = state
        .fetcher
        .get(url)
        .send()
        .await
        .map_err(|err| ServerError::ImageFetch(format!("GET {url}: {err}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ServerError::ImageFetch(format!(
            "GET {url} returned HTTP {status}"
        )));
    }

    response
        .bytes()
        .await
        .map_err(|err| ServerError::ImageFetch(format!("reading body of {url}: {err}")))
}

fn encode_data_uri(data: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(data))
}
