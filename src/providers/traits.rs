//! Provider adapter trait definitions
//!
//! Every external photo source is wrapped in one adapter implementing
//! [`PhotoProvider`]. Policy differences between providers (direct-id vs
//! search lookup, opaque reference tokens, freshness windows) are confined
//! to the adapters; the orchestrator only sees this contract.

use async_trait::async_trait;

use crate::errors::ProxyResult;
use crate::models::{AttributionInfo, ImageFetch, ImageParams, UpstreamAttribution};

/// Contract every photo provider adapter implements
#[async_trait]
pub trait PhotoProvider: Send + Sync {
    /// Stable registry name ("google", "unsplash", ...)
    fn name(&self) -> &'static str;

    /// True only when required credentials are configured AND the provider
    /// is explicitly enabled. The orchestrator treats a disabled adapter
    /// identically to an unknown provider: rejected before any network call.
    fn is_enabled(&self) -> bool;

    /// Stub adapters override this to false so the orchestrator reports
    /// `NotImplemented` instead of `ProviderDisabled`.
    fn is_implemented(&self) -> bool {
        true
    }

    /// Turn request parameters into raw image bytes plus any attribution
    /// metadata observed in the upstream response. One outbound HTTP call,
    /// or two for search-style providers (metadata lookup, then binary
    /// download). Every call is bounded by the adapter's client timeout.
    async fn fetch_image(&self, params: &ImageParams) -> ProxyResult<ImageFetch>;

    /// Derive attribution purely from the request parameters and the
    /// optional attribution payload observed during the fetch. Never makes
    /// a network call.
    fn attribution(
        &self,
        params: &ImageParams,
        upstream: Option<&UpstreamAttribution>,
    ) -> AttributionInfo;
}

/// Fold an optional upstream attribution payload into an [`AttributionInfo`]
/// under the given provider display name.
pub(crate) fn merge_attribution(
    display_name: &str,
    upstream: Option<&UpstreamAttribution>,
) -> AttributionInfo {
    match upstream {
        Some(upstream) => AttributionInfo {
            provider: display_name.to_string(),
            text: upstream.text.clone(),
            url: upstream.url.clone(),
            license: upstream.license.clone(),
        },
        None => AttributionInfo::provider_only(display_name),
    }
}
