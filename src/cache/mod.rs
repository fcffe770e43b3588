//! In-memory cache store for proxied images
//!
//! Entries are keyed by a deterministic digest of (provider name, normalized
//! request parameters). An entry is *stale* once its age exceeds the
//! freshness duration supplied at write time, and is treated as absent (and
//! reclaimed by the sweep) once its age exceeds twice that duration. Entries
//! are never mutated in place; a refresh writes a new entry under the same
//! key. A secondary marker set tracks keys with an in-flight background
//! refresh so concurrent stale readers schedule at most one.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::models::{AttributionInfo, ImageParams};

/// A single cached image. Cloning is cheap: the payload is a refcounted
/// `Bytes` handle.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub bytes: Bytes,
    pub content_type: String,
    pub attribution: AttributionInfo,
    pub freshness: Duration,
    written_at: Instant,
}

impl CacheEntry {
    fn age(&self) -> Duration {
        self.written_at.elapsed()
    }

    /// Past its freshness window, but still servable
    pub fn is_stale(&self) -> bool {
        self.age() > self.freshness
    }

    /// Past the hard-expiry deadline of twice the freshness window
    fn is_hard_expired(&self) -> bool {
        self.age() > self.freshness * 2
    }
}

/// Result of a cache lookup
#[derive(Debug, Clone)]
pub struct CacheLookup {
    pub entry: CacheEntry,
    pub stale: bool,
}

/// In-memory mapping from cache key to entry, plus the revalidation marker
/// set. All operations are short critical sections; no lock is ever held
/// across an outbound network call.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    revalidating: Mutex<HashSet<String>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic digest for (provider, params). Parameters are fed to
    /// the hash in sorted key order with length framing, so logically
    /// identical requests produce the same key no matter how the query
    /// string was ordered.
    pub fn key(provider: &str, params: &ImageParams) -> String {
        let mut hasher = Sha256::new();
        hasher.update((provider.len() as u64).to_be_bytes());
        hasher.update(provider.as_bytes());
        for (key, value) in params.iter() {
            hasher.update((key.len() as u64).to_be_bytes());
            hasher.update(key.as_bytes());
            hasher.update((value.len() as u64).to_be_bytes());
            hasher.update(value.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Look up an entry. Hard-expired entries are reported absent (and
    /// dropped on the next sweep). Never blocks the caller beyond the map
    /// lock itself.
    pub fn get(&self, key: &str) -> Option<CacheLookup> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        if entry.is_hard_expired() {
            return None;
        }
        Some(CacheLookup {
            stale: entry.is_stale(),
            entry: entry.clone(),
        })
    }

    /// Store or overwrite an entry. Replacing an entry implicitly replaces
    /// its hard-expiry deadline, since the deadline derives from the new
    /// write timestamp and freshness.
    pub fn set(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: String,
        attribution: AttributionInfo,
        freshness: Duration,
    ) {
        let entry = CacheEntry {
            bytes,
            content_type,
            attribution,
            freshness,
            written_at: Instant::now(),
        };
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), entry);
    }

    /// Atomically mark a key as undergoing background revalidation.
    /// Returns false when another refresh is already marked, in which case
    /// the caller must not schedule a second one.
    pub fn mark_revalidating(&self, key: &str) -> bool {
        let mut markers = self
            .revalidating
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        markers.insert(key.to_string())
    }

    pub fn is_revalidating(&self, key: &str) -> bool {
        let markers = self
            .revalidating
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        markers.contains(key)
    }

    /// Remove the revalidation marker. Called unconditionally when a
    /// background refresh finishes, success or failure, so a key can never
    /// become permanently unrefreshable.
    pub fn clear_revalidating(&self, key: &str) {
        let mut markers = self
            .revalidating
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        markers.remove(key);
    }

    /// Drop every hard-expired entry. Returns how many were reclaimed.
    pub fn sweep_expired(&self) -> usize {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_hard_expired());
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Cache sweep reclaimed {} hard-expired entries", removed);
        }
        removed
    }

    /// Number of live (non-reclaimed) entries
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rewind an entry's write timestamp, so tests can age entries without
    /// sleeping.
    #[cfg(test)]
    fn backdate(&self, key: &str, by: Duration) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(key) {
            entry.written_at -= by;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribution() -> AttributionInfo {
        AttributionInfo::provider_only("Test")
    }

    fn store_with_entry(freshness: Duration) -> (CacheStore, String) {
        let store = CacheStore::new();
        let key = CacheStore::key("unsplash", &ImageParams::new().set("id", "abc"));
        store.set(
            &key,
            Bytes::from_static(b"payload"),
            "image/jpeg".to_string(),
            attribution(),
            freshness,
        );
        (store, key)
    }

    #[test]
    fn key_is_stable_and_order_invariant() {
        let a = ImageParams::new().set("query", "beach").set("width", "800");
        let b = ImageParams::new().set("width", "800").set("query", "beach");

        assert_eq!(CacheStore::key("unsplash", &a), CacheStore::key("unsplash", &b));
        assert_eq!(CacheStore::key("unsplash", &a), CacheStore::key("unsplash", &a));
        assert_ne!(CacheStore::key("unsplash", &a), CacheStore::key("pexels", &a));
    }

    #[test]
    fn key_framing_distinguishes_shifted_boundaries() {
        // "ab"/"c" and "a"/"bc" must not collide
        let a = ImageParams::new().set("ab", "c");
        let b = ImageParams::new().set("a", "bc");
        assert_ne!(CacheStore::key("p", &a), CacheStore::key("p", &b));
    }

    #[test]
    fn fresh_entry_is_returned_not_stale() {
        let (store, key) = store_with_entry(Duration::from_secs(60));
        let lookup = store.get(&key).expect("entry present");
        assert!(!lookup.stale);
        assert_eq!(lookup.entry.bytes.as_ref(), b"payload");
        assert_eq!(lookup.entry.content_type, "image/jpeg");
    }

    #[test]
    fn entry_past_freshness_is_stale_but_served() {
        let (store, key) = store_with_entry(Duration::from_secs(60));
        store.backdate(&key, Duration::from_secs(61));

        let lookup = store.get(&key).expect("stale entry still servable");
        assert!(lookup.stale);
    }

    #[test]
    fn entry_past_hard_expiry_is_absent_and_swept() {
        let (store, key) = store_with_entry(Duration::from_secs(60));
        store.backdate(&key, Duration::from_secs(121));

        assert!(store.get(&key).is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.sweep_expired(), 1);
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn overwrite_resets_staleness() {
        let (store, key) = store_with_entry(Duration::from_secs(60));
        store.backdate(&key, Duration::from_secs(61));
        assert!(store.get(&key).expect("present").stale);

        store.set(
            &key,
            Bytes::from_static(b"refreshed"),
            "image/jpeg".to_string(),
            attribution(),
            Duration::from_secs(60),
        );
        let lookup = store.get(&key).expect("present");
        assert!(!lookup.stale);
        assert_eq!(lookup.entry.bytes.as_ref(), b"refreshed");
    }

    #[test]
    fn revalidation_marker_is_test_and_set() {
        let store = CacheStore::new();
        assert!(!store.is_revalidating("k"));
        assert!(store.mark_revalidating("k"));
        assert!(!store.mark_revalidating("k"));
        assert!(store.is_revalidating("k"));

        store.clear_revalidating("k");
        assert!(!store.is_revalidating("k"));
        assert!(store.mark_revalidating("k"));
    }
}
