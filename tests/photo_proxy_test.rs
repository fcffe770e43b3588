//! Orchestrator integration tests
//!
//! Drive the proxy service through a programmable in-memory test adapter
//! with call counters, covering the cache lifecycle, stale-while-revalidate
//! dedupe, rate limiting and the error taxonomy.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use photo_proxy::errors::ProxyError;
use photo_proxy::models::{
    AttributionInfo, ImageFetch, ImageParams, ImageRequest, ImageResult, UpstreamAttribution,
};
use photo_proxy::providers::{PhotoProvider, TripAdvisorProvider};
use photo_proxy::rate_limit::RateLimiter;
use photo_proxy::services::PhotoProxyService;

/// Programmable adapter: fixed payload, optional artificial latency,
/// switchable failure mode, and a counter of upstream calls.
struct TestProvider {
    name: &'static str,
    enabled: bool,
    freshness: Duration,
    delay: Duration,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl TestProvider {
    fn new(name: &'static str, freshness: Duration) -> Arc<Self> {
        Arc::new(Self {
            name,
            enabled: true,
            freshness,
            delay: Duration::ZERO,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    fn disabled(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            enabled: false,
            freshness: Duration::from_secs(60),
            delay: Duration::ZERO,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    fn slow(name: &'static str, freshness: Duration, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name,
            enabled: true,
            freshness,
            delay,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl PhotoProvider for TestProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn fetch_image(&self, _params: &ImageParams) -> Result<ImageFetch, ProxyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay > Duration::ZERO {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProxyError::upstream_transport(self.name, "connection refused"));
        }
        Ok(ImageFetch {
            image: ImageResult {
                bytes: Bytes::from_static(b"test-image-bytes"),
                content_type: "image/jpeg".to_string(),
                freshness: self.freshness,
            },
            upstream_attribution: Some(UpstreamAttribution {
                text: Some("Photo by Test".to_string()),
                url: None,
                license: None,
            }),
        })
    }

    fn attribution(
        &self,
        _params: &ImageParams,
        upstream: Option<&UpstreamAttribution>,
    ) -> AttributionInfo {
        match upstream {
            Some(upstream) => AttributionInfo {
                provider: self.name.to_string(),
                text: upstream.text.clone(),
                url: upstream.url.clone(),
                license: upstream.license.clone(),
            },
            None => AttributionInfo::provider_only(self.name),
        }
    }
}

fn service_with(
    providers: Vec<Arc<TestProvider>>,
    quota: u32,
    count_cache_hits: bool,
) -> PhotoProxyService {
    let map: HashMap<String, Arc<dyn PhotoProvider>> = providers
        .into_iter()
        .map(|p| {
            let adapter: Arc<dyn PhotoProvider> = p.clone();
            (p.name.to_string(), adapter)
        })
        .collect();
    PhotoProxyService::new(
        map,
        RateLimiter::new(quota, Duration::from_secs(60)),
        count_cache_hits,
    )
}

fn request(provider: &str) -> ImageRequest {
    ImageRequest::new(provider, ImageParams::new().set("query", "beach"))
}

#[tokio::test]
async fn first_fetch_is_a_miss_with_exactly_one_upstream_call() {
    let provider = TestProvider::new("unsplash", Duration::from_secs(60));
    let service = service_with(vec![provider.clone()], 100, true);

    let response = service.fetch_image(&request("unsplash")).await.unwrap();
    assert!(!response.cache_hit);
    assert_eq!(response.bytes.as_ref(), b"test-image-bytes");
    assert_eq!(response.content_type, "image/jpeg");
    assert_eq!(response.attribution.text.as_deref(), Some("Photo by Test"));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn second_fetch_within_freshness_hits_cache_with_identical_bytes() {
    let provider = TestProvider::new("unsplash", Duration::from_secs(60));
    let service = service_with(vec![provider.clone()], 100, true);

    let first = service.fetch_image(&request("unsplash")).await.unwrap();
    let second = service.fetch_image(&request("unsplash")).await.unwrap();

    assert!(second.cache_hit);
    assert_eq!(first.bytes, second.bytes);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn param_order_does_not_fragment_the_cache() {
    let provider = TestProvider::new("unsplash", Duration::from_secs(60));
    let service = service_with(vec![provider.clone()], 100, true);

    let a = ImageRequest::new(
        "unsplash",
        ImageParams::new().set("query", "beach").set("width", "800"),
    );
    let b = ImageRequest::new(
        "unsplash",
        ImageParams::new().set("width", "800").set("query", "beach"),
    );

    service.fetch_image(&a).await.unwrap();
    let second = service.fetch_image(&b).await.unwrap();
    assert!(second.cache_hit);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn stale_entry_is_served_immediately_and_refreshed_once() {
    // Refresh takes 200ms, so the second and third requests both land while
    // the entry is stale and the refresh is in flight.
    let provider = TestProvider::slow(
        "unsplash",
        Duration::from_millis(250),
        Duration::from_millis(200),
    );
    let service = service_with(vec![provider.clone()], 100, true);

    service.fetch_image(&request("unsplash")).await.unwrap();
    assert_eq!(provider.calls(), 1);

    tokio::time::sleep(Duration::from_millis(300)).await; // stale, not hard-expired

    let second = service.fetch_image(&request("unsplash")).await.unwrap();
    assert!(second.cache_hit);
    assert_eq!(second.bytes.as_ref(), b"test-image-bytes");

    let third = service.fetch_image(&request("unsplash")).await.unwrap();
    assert!(third.cache_hit);

    // Let the single in-flight refresh finish
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(provider.calls(), 2, "concurrent stale reads must not stack refreshes");

    // The refresh rewrote the entry, so the next read is a fresh hit
    let fourth = service.fetch_image(&request("unsplash")).await.unwrap();
    assert!(fourth.cache_hit);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn failed_background_refresh_keeps_serving_the_stale_entry() {
    let provider = TestProvider::new("unsplash", Duration::from_millis(200));
    let service = service_with(vec![provider.clone()], 100, true);

    service.fetch_image(&request("unsplash")).await.unwrap();
    provider.set_failing(true);

    tokio::time::sleep(Duration::from_millis(250)).await; // stale

    let stale = service.fetch_image(&request("unsplash")).await.unwrap();
    assert!(stale.cache_hit);
    assert_eq!(stale.bytes.as_ref(), b"test-image-bytes");

    // Refresh fails, marker clears, entry stays in place
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(provider.calls(), 2);

    let again = service.fetch_image(&request("unsplash")).await.unwrap();
    assert!(again.cache_hit);
    assert_eq!(again.bytes.as_ref(), b"test-image-bytes");
}

#[tokio::test]
async fn hard_expired_entry_behaves_like_a_first_fetch() {
    let provider = TestProvider::new("unsplash", Duration::from_millis(100));
    let service = service_with(vec![provider.clone()], 100, true);

    service.fetch_image(&request("unsplash")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await; // past 2 x freshness

    let response = service.fetch_image(&request("unsplash")).await.unwrap();
    assert!(!response.cache_hit);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn synchronous_fetch_failure_propagates_and_caches_nothing() {
    let provider = TestProvider::new("unsplash", Duration::from_secs(60));
    provider.set_failing(true);
    let service = service_with(vec![provider.clone()], 100, true);

    for expected_calls in 1..=2 {
        match service.fetch_image(&request("unsplash")).await {
            Err(ProxyError::UpstreamFetchFailed { provider, .. }) => {
                assert_eq!(provider, "unsplash")
            }
            other => panic!("expected UpstreamFetchFailed, got {other:?}"),
        }
        assert_eq!(provider.calls(), expected_calls);
    }
}

#[tokio::test]
async fn unknown_provider_is_rejected() {
    let service = service_with(vec![], 100, true);
    match service.fetch_image(&request("imgur")).await {
        Err(ProxyError::UnknownProvider(name)) => assert_eq!(name, "imgur"),
        other => panic!("expected UnknownProvider, got {other:?}"),
    }
}

#[tokio::test]
async fn disabled_provider_is_rejected_with_zero_upstream_calls() {
    let provider = TestProvider::disabled("pexels");
    let service = service_with(vec![provider.clone()], 100, true);

    match service.fetch_image(&request("pexels")).await {
        Err(ProxyError::ProviderDisabled(name)) => assert_eq!(name, "pexels"),
        other => panic!("expected ProviderDisabled, got {other:?}"),
    }
    assert_eq!(provider.calls(), 0);
    assert!(service.list_enabled_providers().is_empty());
}

#[tokio::test]
async fn stub_provider_reports_not_implemented_and_is_never_listed() {
    let mut map: HashMap<String, Arc<dyn PhotoProvider>> = HashMap::new();
    map.insert("tripadvisor".to_string(), Arc::new(TripAdvisorProvider));
    let enabled: Arc<dyn PhotoProvider> = TestProvider::new("unsplash", Duration::from_secs(60));
    map.insert("unsplash".to_string(), enabled);

    let service = PhotoProxyService::new(
        map,
        RateLimiter::new(100, Duration::from_secs(60)),
        true,
    );

    match service.fetch_image(&request("tripadvisor")).await {
        Err(ProxyError::NotImplemented(name)) => assert_eq!(name, "tripadvisor"),
        other => panic!("expected NotImplemented, got {other:?}"),
    }
    assert_eq!(service.list_enabled_providers(), vec!["unsplash".to_string()]);
}

#[tokio::test]
async fn quota_exhaustion_rate_limits_one_provider_but_not_others() {
    let unsplash = TestProvider::new("unsplash", Duration::from_secs(60));
    let pexels = TestProvider::new("pexels", Duration::from_secs(60));
    let service = service_with(vec![unsplash.clone(), pexels.clone()], 2, true);

    // Calls 1-2 admitted (miss then cache hit; hits count under the
    // conservative policy), call 3 rejected regardless of cache state
    assert!(service.fetch_image(&request("unsplash")).await.is_ok());
    assert!(service.fetch_image(&request("unsplash")).await.is_ok());
    match service.fetch_image(&request("unsplash")).await {
        Err(ProxyError::RateLimited { provider, .. }) => assert_eq!(provider, "unsplash"),
        other => panic!("expected RateLimited, got {other:?}"),
    }

    // A different provider is unaffected
    assert!(service.fetch_image(&request("pexels")).await.is_ok());
}

#[tokio::test]
async fn lenient_policy_exempts_cache_hits_from_quota() {
    let provider = TestProvider::new("unsplash", Duration::from_secs(60));
    let service = service_with(vec![provider.clone()], 1, false);

    // The miss consumes the whole quota...
    assert!(service.fetch_image(&request("unsplash")).await.is_ok());
    // ...but fresh hits make no outbound call and are not counted
    for _ in 0..5 {
        let response = service.fetch_image(&request("unsplash")).await.unwrap();
        assert!(response.cache_hit);
    }
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn latency_is_reported_on_every_path() {
    let provider = TestProvider::slow(
        "unsplash",
        Duration::from_secs(60),
        Duration::from_millis(50),
    );
    let service = service_with(vec![provider.clone()], 100, true);

    let miss = service.fetch_image(&request("unsplash")).await.unwrap();
    assert!(miss.latency_ms >= 50);

    let hit = service.fetch_image(&request("unsplash")).await.unwrap();
    assert!(hit.latency_ms < 50);
}
