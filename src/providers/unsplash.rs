//! Unsplash photo adapter
//!
//! Supports either a direct photo-id lookup or a free-text search, preferring
//! the id when both are present. Fetching is two outbound calls: a JSON
//! metadata lookup against the Unsplash API, then a binary download from the
//! CDN URL it returns.

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

const API_BASE: &str = "https://api.unsplash.com";

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    urls: UnsplashUrls,
    links: UnsplashLinks,
    user: UnsplashUser,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    raw: String,
    regular: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashLinks {
    html: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashUser {
    name: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashSearchResponse {
    results: Vec<UnsplashPhoto>,
}

/// Unsplash photo source
pub struct UnsplashProvider {
    client: Client,
    access_key: Option<String>,
    enabled: bool,
    /// Long freshness: payloads are static CDN-hosted assets
    freshness: Duration,
}

impl UnsplashProvider {
    pub fn new(client: Client, config: &ProviderConfig, freshness: Duration) -> Self {
        Self {
            client,
            access_key: config.api_key.clone(),
            enabled: config.enabled,
            freshness,
        }
    }

    /// Metadata lookup: direct id when present, otherwise first search hit
    async fn lookup_photo(
        &self,
        params: &ImageParams,
        access_key: &str,
    ) -> ProxyResult<UnsplashPhoto> {
        if let Some(id) = params.id() {
            debug!("Looking up Unsplash photo by id");
            let response = self
                .client
                .get(format!("{API_BASE}/photos/{id}"))
                .header("Authorization", format!("Client-ID {access_key}"))
                .header("Accept-Version", "v1")
                .send()
                .await
                .map_err(|e| ProxyError::from_reqwest(self.name(), e))?;
            return self.parse_json(response).await;
        }

        let query = params
            .query()
            .ok_or_else(|| ProxyError::missing_parameter(self.name(), "query"))?;

        debug!("Searching Unsplash for '{}'", query);
        let response = self
            .client
            .get(format!("{API_BASE}/search/photos"))
            .header("Authorization", format!("Client-ID {access_key}"))
            .header("Accept-Version", "v1")
            .query(&[("query", query), ("per_page", "1")])
            .send()
            .await
            .map_err(|e| ProxyError::from_reqwest(self.name(), e))?;

        let search: UnsplashSearchResponse = self.parse_json(response).await?;
        search
            .results
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

    /// Pick the CDN URL to download, honoring a requested width when given.
    /// The `raw` URL already carries query parameters, so sizing hints are
    /// appended to it.
    fn download_url(photo: &UnsplashPhoto, width: Option<u32>) -> String {
        match width {
            Some(width) => format!("{}&w={width}&fit=max", photo.urls.raw),
            None => photo.urls.regular.clone(),
        }
    }
}

#[async_trait]
impl PhotoProvider for UnsplashProvider {
    fn name(&self) -> &'static str {
        "unsplash"
    }

    fn is_enabled(&self) -> bool {
        self.enabled && self.access_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn fetch_image(&self, params: &ImageParams) -> ProxyResult<ImageFetch> {
        let access_key = self
            .access_key
            .clone()
            .ok_or_else(|| ProxyError::ProviderDisabled(self.name().to_string()))?;

        let photo = self.lookup_photo(params, &access_key).await?;
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
                text: Some(format!("Photo by {} on Unsplash", photo.user.name)),
                url: Some(photo.links.html),
                license: Some("Unsplash License".to_string()),
            }),
        })
    }

    fn attribution(
        &self,
        _params: &ImageParams,
        upstream: Option<&UpstreamAttribution>,
    ) -> AttributionInfo {
        merge_attribution("Unsplash", upstream)
    }
}
