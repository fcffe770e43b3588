//! Photo Proxy Service
//!
//! The orchestrator other code calls. Routes a request to the correct
//! provider adapter, applies the per-provider rate limiter, consults the
//! cache, and implements the stale-while-revalidate protocol:
//!
//! ```text
//! START -> RATE_CHECK -> CACHE_LOOKUP
//!       -> { FRESH_HIT | STALE_HIT_WITH_REFRESH | MISS_FETCH } -> DONE
//! ```
//!
//! Stale entries are served immediately; the refresh runs as a detached
//! task whose only side effect is a cache write and whose failures are
//! logged and discarded. No lock is held across any outbound call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStore};
use crate::config::Config;
use crate::errors::{ProxyError, ProxyResult};
use crate::models::{ImageParams, ImageRequest, ProxyImageResponse};
use crate::providers::{self, PhotoProvider};
use crate::rate_limit::RateLimiter;

struct Inner {
    providers: HashMap<String, Arc<dyn PhotoProvider>>,
    cache: CacheStore,
    limiter: RateLimiter,
    /// When true (the source's conservative policy), every request consumes
    /// quota before the cache is consulted; when false only paths that
    /// would perform an outbound call are counted.
    count_cache_hits: bool,
}

/// Façade over adapters, cache store and rate limiter. Cheap to clone;
/// one instance per process, passed by reference to the HTTP layer.
#[derive(Clone)]
pub struct PhotoProxyService {
    inner: Arc<Inner>,
}

impl PhotoProxyService {
    pub fn new(
        providers: HashMap<String, Arc<dyn PhotoProvider>>,
        limiter: RateLimiter,
        count_cache_hits: bool,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                providers,
                cache: CacheStore::new(),
                limiter,
                count_cache_hits,
            }),
        }
    }

    /// Assemble the service from configuration with the full adapter set
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            providers::create_providers(config),
            RateLimiter::new(config.rate_limit.quota, config.rate_limit_window()),
            config.rate_limit.count_cache_hits,
        )
    }

    /// Names of providers currently able to serve requests, sorted for
    /// stable output
    pub fn list_enabled_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .providers
            .values()
            .filter(|p| p.is_enabled())
            .map(|p| p.name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Live cache entry count, for health reporting
    pub fn cache_size(&self) -> usize {
        self.inner.cache.len()
    }

    /// Fetch an image through the cache, enforcing the request state
    /// machine described in the module docs.
    pub async fn fetch_image(&self, request: &ImageRequest) -> ProxyResult<ProxyImageResponse> {
        let start = Instant::now();
        let inner = &self.inner;

        // START: resolve the adapter
        let adapter = inner
            .providers
            .get(&request.provider)
            .cloned()
            .ok_or_else(|| ProxyError::UnknownProvider(request.provider.clone()))?;
        if !adapter.is_implemented() {
            return Err(ProxyError::NotImplemented(request.provider.clone()));
        }
        if !adapter.is_enabled() {
            return Err(ProxyError::ProviderDisabled(request.provider.clone()));
        }

        // RATE_CHECK: under the conservative policy even cache hits count
        if inner.count_cache_hits {
            inner.limiter.check_and_consume(&request.provider)?;
        }

        // CACHE_LOOKUP
        let key = CacheStore::key(&request.provider, &request.params);
        match inner.cache.get(&key) {
            Some(lookup) if !lookup.stale => {
                debug!(provider = %request.provider, "Fresh cache hit");
                Ok(Self::respond(lookup.entry, true, start))
            }
            Some(lookup) => {
                // STALE_HIT_WITH_REFRESH: never block the caller on a stale
                // entry; refresh runs detached
                debug!(provider = %request.provider, "Stale cache hit, scheduling refresh");
                self.schedule_refresh(adapter, key, request.params.clone());
                Ok(Self::respond(lookup.entry, true, start))
            }
            None => {
                // MISS_FETCH: synchronous adapter call, errors propagate
                if !inner.count_cache_hits {
                    inner.limiter.check_and_consume(&request.provider)?;
                }
                let fetch = adapter.fetch_image(&request.params).await?;
                let attribution =
                    adapter.attribution(&request.params, fetch.upstream_attribution.as_ref());
                inner.cache.set(
                    &key,
                    fetch.image.bytes.clone(),
                    fetch.image.content_type.clone(),
                    attribution.clone(),
                    fetch.image.freshness,
                );
                debug!(provider = %request.provider, "Cache miss filled from upstream");
                Ok(ProxyImageResponse {
                    bytes: fetch.image.bytes,
                    content_type: fetch.image.content_type,
                    attribution,
                    cache_hit: false,
                    latency_ms: start.elapsed().as_millis() as u64,
                })
            }
        }
    }

    /// Launch a detached background refresh for a stale key, unless one is
    /// already in flight. Failures are caught at the task boundary and
    /// logged; the previous (re-aged) entry stays in place.
    fn schedule_refresh(&self, adapter: Arc<dyn PhotoProvider>, key: String, params: ImageParams) {
        let inner = Arc::clone(&self.inner);

        if !inner.cache.mark_revalidating(&key) {
            debug!(provider = adapter.name(), "Refresh already in flight, reusing stale entry");
            return;
        }
        if !inner.count_cache_hits {
            // Lenient policy: the refresh itself is the outbound call
            if let Err(e) = inner.limiter.check_and_consume(adapter.name()) {
                debug!("Skipping background refresh: {}", e);
                inner.cache.clear_revalidating(&key);
                return;
            }
        }

        tokio::spawn(async move {
            match adapter.fetch_image(&params).await {
                Ok(fetch) => {
                    let attribution =
                        adapter.attribution(&params, fetch.upstream_attribution.as_ref());
                    inner.cache.set(
                        &key,
                        fetch.image.bytes,
                        fetch.image.content_type,
                        attribution,
                        fetch.image.freshness,
                    );
                    debug!(provider = adapter.name(), "Background refresh completed");
                }
                Err(e) => {
                    warn!(provider = adapter.name(), "Background refresh failed: {}", e);
                }
            }
            // Cleared unconditionally so the key never becomes unrefreshable
            inner.cache.clear_revalidating(&key);
        });
    }

    /// Periodically reclaim hard-expired cache entries
    pub fn spawn_cache_sweeper(&self, interval: Duration) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                inner.cache.sweep_expired();
            }
        });
    }

    fn respond(entry: CacheEntry, cache_hit: bool, start: Instant) -> ProxyImageResponse {
        ProxyImageResponse {
            bytes: entry.bytes,
            content_type: entry.content_type,
            attribution: entry.attribution,
            cache_hit,
            latency_ms: start.elapsed().as_millis() as u64,
        }
    }
}
