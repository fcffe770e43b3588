//! Pexels photo adapter
//!
//! Mirrors the Unsplash adapter's shape: direct-id lookup or free-text
//! search (id preferred), metadata call followed by a CDN binary download.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::errors::{ProxyError, ProxyResult};
use crate::models::{
    AttributionInfo, ImageFetch, ImageParams, ImageResult, UpstreamAttribution,
};
use super::traits::{merge_attribution, PhotoProvider};

const API_BASE: &str = "https://api.pexels.com/v1";

#[derive(Debug, Deserialize)]
struct PexelsPhoto {
    url: String,
    photographer: String,
    src: PexelsSrc,
}

#[derive(Debug, Deserialize)]
struct PexelsSrc {
    original: String,
    large: String,
}

#[derive(Debug, Deserialize)]
struct PexelsSearchResponse {
    photos: Vec<PexelsPhoto>,
}

/// Pexels photo source
pub struct PexelsProvider {
    client: Client,
    api_key: Option<String>,
    enabled: bool,
    /// Long freshness: payloads are static CDN-hosted assets
    freshness: Duration,
}

impl PexelsProvider {
    pub fn new(client: Client, config: &ProviderConfig, freshness: Duration) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            enabled: config.enabled,
            freshness,
        }
    }

    async fn lookup_photo(&self, params: &ImageParams, api_key: &str) -> ProxyResult<PexelsPhoto> {
        if let Some(id) = params.id() {
            debug!("Looking up Pexels photo by id");
            let response = self
                .client
                .get(format!("{API_BASE}/photos/{id}"))
                .header("Authorization", api_key)
                .send()
                .await
                .map_err(|e| ProxyError::from_reqwest(self.name(), e))?;
            return self.parse_json(response).await;
        }

        let query = params
            .query()
            .ok_or_else(|| ProxyError::missing_parameter(self.name(), "query"))?;

        debug!("Searching Pexels for '{}'", query);
        let mut query_pairs = vec![("query", query), ("per_page", "1")];
        if let Some(language) = params.language() {
            query_pairs.push(("locale", language));
        }
        let response = self
            .client
            .get(format!("{API_BASE}/search"))
            .header("Authorization", api_key)
            .query(&query_pairs)
            .send()
            .await
            .map_err(|e| ProxyError::from_reqwest(self.name(), e))?;

        let search: PexelsSearchResponse = self.parse_json(response).await?;
        search
            .photos
            .into_iter()
            .next()
            .ok_or_else(|| ProxyError::no_results(self.name(), query))
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ProxyResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::upstream_status(
                self.name(),
                status.as_u16(),
                status.canonical_reason().unwrap_or("upstream error"),
            ));
        }
        response
            .json()
            .await
            .map_err(|e| ProxyError::from_reqwest(self.name(), e))
    }

    /// The Pexels CDN resizes via query parameters on the original URL
    fn download_url(photo: &PexelsPhoto, width: Option<u32>) -> String {
        match width {
            Some(width) => format!("{}?auto=compress&w={width}", photo.src.original),
            None => photo.src.large.clone(),
        }
    }
}

#[async_trait]
impl PhotoProvider for PexelsProvider {
    fn name(&self) -> &'static str {
        "pexels"
    }

    fn is_enabled(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn fetch_image(&self, params: &ImageParams) -> ProxyResult<ImageFetch> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| ProxyError::ProviderDisabled(self.name().to_string()))?;

        let photo = self.lookup_photo(params, &api_key).await?;
        let url = Self::download_url(&photo, params.width());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProxyError::from_reqwest(self.name(), e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::upstream_status(
                self.name(),
                status.as_u16(),
                status.canonical_reason().unwrap_or("upstream error"),
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProxyError::from_reqwest(self.name(), e))?;

        Ok(ImageFetch {
            image: ImageResult {
                bytes,
                content_type,
                freshness: self.freshness,
            },
            upstream_attribution: Some(UpstreamAttribution {
                text: Some(format!("Photo by {} on Pexels", photo.photographer)),
                url: Some(photo.url),
                license: Some("Pexels License".to_string()),
            }),
        })
    }

    fn attribution(
        &self,
        _params: &ImageParams,
        upstream: Option<&UpstreamAttribution>,
    ) -> AttributionInfo {
        merge_attribution("Pexels", upstream)
    }
}
