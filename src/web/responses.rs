//! Error-to-HTTP mapping for the web layer
//!
//! Each `ProxyError` variant maps to the status code a caller can act on;
//! the body is a small JSON envelope naming the variant.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::errors::ProxyError;

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ProxyError::UnknownProvider(_) => (StatusCode::NOT_FOUND, "unknown_provider"),
            ProxyError::ProviderDisabled(_) => (StatusCode::SERVICE_UNAVAILABLE, "provider_disabled"),
            ProxyError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            ProxyError::UpstreamFetchFailed { .. } => (StatusCode::BAD_GATEWAY, "upstream_fetch_failed"),
            ProxyError::NoResultsFound { .. } => (StatusCode::NOT_FOUND, "no_results_found"),
            ProxyError::NotImplemented(_) => (StatusCode::NOT_IMPLEMENTED, "not_implemented"),
            ProxyError::MissingParameter { .. } => (StatusCode::BAD_REQUEST, "missing_parameter"),
        };

        let mut response = (
            status,
            Json(json!({
                "error": code,
                "message": self.to_string(),
            })),
        )
            .into_response();

        if let ProxyError::RateLimited { retry_after, .. } = &self {
            if let Ok(value) = retry_after.to_string().parse() {
                response.headers_mut().insert("retry-after", value);
            }
        }

        response
    }
}
