//! Core data types for the photo proxy
//!
//! These are the value types that cross the component boundaries: request
//! parameters as received from the HTTP layer, fetch results produced by
//! provider adapters, and the response envelope handed back to callers.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Normalized provider-specific request parameters.
///
/// Parameters arrive as an arbitrary key/value map from the HTTP layer.
/// Iteration for cache-key derivation is always in sorted key order, so two
/// logically identical requests hash identically regardless of how the
/// query string was ordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageParams(BTreeMap<String, String>);

impl ImageParams {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Get a raw parameter value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Set a parameter, replacing any previous value
    pub fn set<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Opaque provider reference token (e.g. a Google photo reference),
    /// forwarded verbatim and never interpreted
    pub fn reference(&self) -> Option<&str> {
        self.get("reference")
    }

    /// Direct upstream photo id
    pub fn id(&self) -> Option<&str> {
        self.get("id")
    }

    /// Free-text search query
    pub fn query(&self) -> Option<&str> {
        self.get("query")
    }

    /// Requested pixel width, if present and numeric
    pub fn width(&self) -> Option<u32> {
        self.get("width").and_then(|w| w.parse().ok())
    }

    /// Requested pixel height, if present and numeric
    pub fn height(&self) -> Option<u32> {
        self.get("height").and_then(|h| h.parse().ok())
    }

    /// Language hint for providers that localize results
    pub fn language(&self) -> Option<&str> {
        self.get("language")
    }

    /// Iterate parameters in sorted key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, String>> for ImageParams {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map.into_iter().collect())
    }
}

/// A request routed through the orchestrator
#[derive(Debug, Clone)]
pub struct ImageRequest {
    /// Provider name as registered in the adapter map
    pub provider: String,
    /// Provider-specific parameters
    pub params: ImageParams,
}

impl ImageRequest {
    pub fn new<S: Into<String>>(provider: S, params: ImageParams) -> Self {
        Self {
            provider: provider.into(),
            params,
        }
    }
}

/// Successful output of an adapter fetch. Immutable once produced.
#[derive(Debug, Clone)]
pub struct ImageResult {
    /// Raw image payload
    pub bytes: Bytes,
    /// MIME content type reported by the upstream
    pub content_type: String,
    /// How long this image may be served before it is considered stale;
    /// chosen by the adapter (short for churning provider photos, long for
    /// static CDN-hosted assets)
    pub freshness: Duration,
}

/// Attribution metadata carried alongside every served image, as required
/// by the providers' terms of use. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionInfo {
    /// Provider display name
    pub provider: String,
    /// Human-readable attribution text (photographer, rights holder)
    pub text: Option<String>,
    /// Link back to the source
    pub url: Option<String>,
    /// License label
    pub license: Option<String>,
}

impl AttributionInfo {
    /// Attribution with only the provider display name
    pub fn provider_only<S: Into<String>>(provider: S) -> Self {
        Self {
            provider: provider.into(),
            text: None,
            url: None,
            license: None,
        }
    }
}

/// Attribution fields observed in an upstream response during a fetch.
///
/// Adapters that learn attribution from the same call that returns the image
/// surface it here, and the pure [`attribution`] derivation receives it as
/// an explicit argument instead of keeping hidden per-adapter state.
///
/// [`attribution`]: crate::providers::PhotoProvider::attribution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamAttribution {
    pub text: Option<String>,
    pub url: Option<String>,
    pub license: Option<String>,
}

/// Everything a single adapter fetch produces
#[derive(Debug, Clone)]
pub struct ImageFetch {
    pub image: ImageResult,
    /// Attribution metadata observed in the upstream response, if any
    pub upstream_attribution: Option<UpstreamAttribution>,
}

/// Response envelope returned to the HTTP layer
#[derive(Debug, Clone)]
pub struct ProxyImageResponse {
    pub bytes: Bytes,
    pub content_type: String,
    pub attribution: AttributionInfo,
    /// Whether the payload came from the cache (fresh or stale)
    pub cache_hit: bool,
    /// Wall-clock latency of this request as observed by the orchestrator
    pub latency_ms: u64,
}
