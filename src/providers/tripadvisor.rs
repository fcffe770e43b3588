//! TripAdvisor photo adapter (stub)
//!
//! The Content API integration has not been built yet. The adapter reports
//! itself disabled so the orchestrator never routes to it, and a direct call
//! fails with `NotImplemented` rather than masquerading as a network error.

use async_trait::async_trait;

use crate::errors::{ProxyError, ProxyResult};
use crate::models::{AttributionInfo, ImageFetch, ImageParams, UpstreamAttribution};
use super::traits::PhotoProvider;

pub struct TripAdvisorProvider;

#[async_trait]
impl PhotoProvider for TripAdvisorProvider {
    fn name(&self) -> &'static str {
        "tripadvisor"
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
        AttributionInfo::provider_only("TripAdvisor")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_disabled_and_not_implemented() {
        let provider = TripAdvisorProvider;
        assert!(!provider.is_enabled());
        match provider.fetch_image(&ImageParams::new()).await {
            Err(ProxyError::NotImplemented(name)) => assert_eq!(name, "tripadvisor"),
            other => panic!("expected NotImplemented, got {other:?}"),
        }
    }
}
