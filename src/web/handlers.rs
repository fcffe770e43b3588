//! HTTP request handlers
//!
//! Thin handlers that parse the request surface and delegate to the
//! orchestrator; all policy lives below this layer.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::errors::ProxyError;
use crate::models::{ImageParams, ImageRequest};
use crate::services::PhotoProxyService;

pub async fn health(State(service): State<PhotoProxyService>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "cache_entries": service.cache_size(),
        "enabled_providers": service.list_enabled_providers(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Capability discovery for the frontend
pub async fn list_providers(State(service): State<PhotoProxyService>) -> Json<serde_json::Value> {
    Json(json!({ "providers": service.list_enabled_providers() }))
}

/// Proxy a photo from the named provider.
///
/// Query parameters are passed through to the adapter untouched; the image
/// bytes are streamed back with attribution and cache metadata in headers.
pub async fn get_photo(
    State(service): State<PhotoProxyService>,
    Path(provider): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ProxyError> {
    let request = ImageRequest::new(provider, ImageParams::from(params));
    let result = service.fetch_image(&request).await?;

    let mut response = result.bytes.into_response();
    let headers = response.headers_mut();
    if let Ok(value) = result.content_type.parse() {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = if result.cache_hit { "HIT" } else { "MISS" }.parse() {
        headers.insert("x-cache", value);
    }
    if let Ok(value) = result.latency_ms.to_string().parse() {
        headers.insert("x-latency-ms", value);
    }
    if let Ok(serialized) = serde_json::to_string(&result.attribution) {
        if let Ok(value) = serialized.parse() {
            headers.insert("x-photo-attribution", value);
        }
    }

    Ok(response)
}
