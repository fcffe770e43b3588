//! Flickr photo adapter (stub)
//!
//! Same contract as the TripAdvisor stub: always disabled, and a direct
//! call fails with `NotImplemented` distinct from any network failure.

use async_trait::async_trait;

use crate::errors::{ProxyError, ProxyResult};
use crate::models::{AttributionInfo, ImageFetch, ImageParams, UpstreamAttribution};
use super::traits::PhotoProvider;

pub struct FlickrProvider;

#[async_trait]
impl PhotoProvider for FlickrProvider {
    fn name(&self) -> &'static str {
        "flickr"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    fn is_implemented(&self) -> bool {
        false
    }

    async fn fetch_image(&self, _params: &ImageParams) -> ProxyResult<ImageFetch> {
        Err(ProxyError::NotImplemented(self.name().to_string()))
    }

    fn attribution(
        &self,
        _params: &ImageParams,
        _upstream: Option<&UpstreamAttribution>,
    ) -> AttributionInfo {
        AttributionInfo::provider_only("Flickr")
    }
}
