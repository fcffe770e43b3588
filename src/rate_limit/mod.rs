//! Fixed-window rate limiting per provider
//!
//! One global quota/window pair applied independently to each provider
//! name. This is a coarse fixed-window counter: bursts straddling a window
//! boundary may exceed the intended average rate, a tradeoff accepted for
//! simplicity over a sliding-window or token-bucket design.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::errors::{ProxyError, ProxyResult};

#[derive(Debug)]
struct Window {
    count: u32,
    resets_at: Instant,
}

/// Per-provider fixed-window request counter.
///
/// The counter map is mutated under a mutex with no network call in the
/// critical section.
#[derive(Debug)]
pub struct RateLimiter {
    quota: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(quota: u32, window: Duration) -> Self {
        Self {
            quota,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Admit one request for `provider`, or fail with
    /// [`ProxyError::RateLimited`] once the quota for the current window is
    /// exhausted. A fresh window is opened when the previous one has
    /// elapsed.
    pub fn check_and_consume(&self, provider: &str) -> ProxyResult<()> {
        let now = Instant::now();
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let window = windows.entry(provider.to_string()).or_insert(Window {
            count: 0,
            resets_at: now + self.window,
        });

        if now >= window.resets_at {
            window.count = 0;
            window.resets_at = now + self.window;
        }

        if window.count >= self.quota {
            let retry_after = window.resets_at.saturating_duration_since(now).as_secs();
            debug!(
                "Rate limit hit for provider '{}' ({} requests in window)",
                provider, window.count
            );
            return Err(ProxyError::RateLimited {
                provider: provider.to_string(),
                retry_after,
            });
        }

        window.count += 1;
        Ok(())
    }
}
