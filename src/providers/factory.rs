//! Provider registry construction
//!
//! Builds the explicit provider-name → adapter map the orchestrator owns.
//! Constructed once at process start; there is no global registry.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;
use super::{
    FlickrProvider, GooglePlacesProvider, PexelsProvider, PhotoProvider, TripAdvisorProvider,
    UnsplashProvider,
};

/// Build one adapter per known provider from configuration.
///
/// Disabled providers are still registered so the orchestrator can
/// distinguish `ProviderDisabled` from `UnknownProvider`; stubs surface
/// `NotImplemented` the same way.
pub fn create_providers(config: &Config) -> HashMap<String, Arc<dyn PhotoProvider>> {
    let client = Client::builder()
        .timeout(config.request_timeout())
        .user_agent(config.http.user_agent.clone())
        .build()
        .unwrap_or_else(|_| Client::new());

    let adapters: Vec<Arc<dyn PhotoProvider>> = vec![
        Arc::new(GooglePlacesProvider::new(
            client.clone(),
            &config.providers.google,
            config.freshness_short(),
        )),
        Arc::new(UnsplashProvider::new(
            client.clone(),
            &config.providers.unsplash,
            config.freshness_long(),
        )),
        Arc::new(PexelsProvider::new(
            client,
            &config.providers.pexels,
            config.freshness_long(),
        )),
        Arc::new(TripAdvisorProvider),
        Arc::new(FlickrProvider),
    ];

    adapters
        .into_iter()
        .map(|adapter| (adapter.name().to_string(), adapter))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_known_providers_are_registered() {
        let providers = create_providers(&Config::default());
        for name in ["google", "unsplash", "pexels", "tripadvisor", "flickr"] {
            assert!(providers.contains_key(name), "missing provider '{name}'");
        }
        // Nothing is enabled without credentials
        assert!(providers.values().all(|p| !p.is_enabled()));
    }
}
