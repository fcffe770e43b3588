//! Google Places photo adapter
//!
//! Takes an opaque photo reference token obtained from an earlier Place
//! Details lookup and forwards it verbatim to the Places Photo endpoint,
//! which answers with the image bytes directly (one outbound call).
//! Attribution strings for a reference are learned by whoever performed the
//! details lookup; they reach this adapter as explicit request parameters
//! rather than hidden cross-call state.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::errors::{ProxyError, ProxyResult};
use crate::models::{
    AttributionInfo, ImageFetch, ImageParams, ImageResult, UpstreamAttribution,
};
use super::traits::PhotoProvider;

const PHOTO_URL: &str = "https://maps.googleapis.com/maps/api/place/photo";
const DEFAULT_MAX_WIDTH: u32 = 800;

/// Google Places photo source
pub struct GooglePlacesProvider {
    client: Client,
    api_key: Option<String>,
    enabled: bool,
    /// Short freshness: photo references churn as places are re-reviewed
    freshness: Duration,
}

impl GooglePlacesProvider {
    pub fn new(client: Client, config: &ProviderConfig, freshness: Duration) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            enabled: config.enabled,
            freshness,
        }
    }
}

#[async_trait]
impl PhotoProvider for GooglePlacesProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn is_enabled(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    async fn fetch_image(&self, params: &ImageParams) -> ProxyResult<ImageFetch> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProxyError::ProviderDisabled(self.name().to_string()))?;
        let reference = params
            .reference()
            .ok_or_else(|| ProxyError::missing_parameter(self.name(), "reference"))?;

        let max_width = params.width().unwrap_or(DEFAULT_MAX_WIDTH).to_string();
        let mut query = vec![
            ("photoreference", reference),
            ("maxwidth", max_width.as_str()),
            ("key", api_key),
        ];
        if let Some(language) = params.language() {
            query.push(("language", language));
        }

        debug!("Fetching Google Places photo (maxwidth={})", max_width);

        let response = self
            .client
            .get(PHOTO_URL)
            .query(&query)
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
            // The photo endpoint returns bytes only; attribution comes from
            // the details lookup and is merged in via `attribution()`.
            upstream_attribution: None,
        })
    }

    fn attribution(
        &self,
        params: &ImageParams,
        upstream: Option<&UpstreamAttribution>,
    ) -> AttributionInfo {
        let text = upstream
            .and_then(|u| u.text.clone())
            .or_else(|| params.get("attribution").map(str::to_string));
        let url = upstream
            .and_then(|u| u.url.clone())
            .or_else(|| params.get("attribution_url").map(str::to_string));
        AttributionInfo {
            provider: "Google Maps".to_string(),
            text,
            url,
            license: None,
        }
    }
}
