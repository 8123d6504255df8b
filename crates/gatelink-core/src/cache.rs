//! Time-bounded cache of fetched page content.
//!
//! Keys are URLs exactly as the caller supplied them; nothing is normalized.
//! Entries never change once stored. An entry older than the TTL reads as a
//! miss and is evicted on that access (or by [`ContentCache::purge_expired`]).
//! There is no size bound.
//!
//! Concurrent misses for the same URL are not coalesced: each caller that
//! misses performs its own fetch and the last `set` wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

pub use crate::config::DEFAULT_CACHE_TTL;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Start the clock at `start`.
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let delta = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);
    }

    /// Jump to a specific instant.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A stored page.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Markdown content.
    pub content: Arc<str>,
    /// When the entry was stored.
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        // A clock that went backwards yields a negative age, treated as zero.
        let age = (now - self.stored_at).to_std().unwrap_or(Duration::ZERO);
        age > ttl
    }
}

/// URL → markdown cache shared by every read.
pub struct ContentCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl ContentCache {
    /// Cache using the wall clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Cache using the given clock.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Entry lifetime.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up fresh content for `url`.
    ///
    /// An expired entry is removed and reported as a miss.
    pub async fn get(&self, url: &str) -> Option<Arc<str>> {
        let now = self.clock.now();
        {
            let read_lock = self.entries.read().await;
            match read_lock.get(url) {
                None => return None,
                Some(entry) if !entry.is_expired(now, self.ttl) => {
                    tracing::debug!(url, "content cache hit");
                    return Some(Arc::clone(&entry.content));
                },
                Some(_) => {},
            }
        }

        let mut write_lock = self.entries.write().await;
        // Another task may have refreshed the entry while we waited.
        if let Some(entry) = write_lock.get(url) {
            if !entry.is_expired(now, self.ttl) {
                return Some(Arc::clone(&entry.content));
            }
            write_lock.remove(url);
            tracing::debug!(url, "evicted expired cache entry");
        }
        None
    }

    /// Store `content` under `url`, replacing any previous entry.
    pub async fn set(&self, url: &str, content: impl Into<Arc<str>>) {
        let entry = CacheEntry {
            content: content.into(),
            stored_at: self.clock.now(),
        };
        tracing::debug!(url, chars = entry.content.chars().count(), "caching content");
        self.entries.write().await.insert(url.to_string(), entry);
    }

    /// Drop the entry for `url`. Returns whether one existed.
    pub async fn invalidate(&self, url: &str) -> bool {
        let removed = self.entries.write().await.remove(url).is_some();
        if removed {
            tracing::debug!(url, "content cache entry invalidated");
        }
        removed
    }

    /// Remove every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut write_lock = self.entries.write().await;
        let before = write_lock.len();
        write_lock.retain(|_, entry| !entry.is_expired(now, self.ttl));
        let purged = before - write_lock.len();
        if purged > 0 {
            tracing::debug!(purged, "purged expired cache entries");
        }
        purged
    }

    /// Number of stored entries, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    fn cache_with_clock() -> (ContentCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = ContentCache::with_clock(TTL, Arc::clone(&clock) as Arc<dyn Clock>);
        (cache, clock)
    }

    #[tokio::test]
    async fn test_round_trip_within_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.set("https://example.com", "# Title\nbody").await;

        clock.advance(Duration::from_secs(59));
        assert_eq!(
            cache.get("https://example.com").await.as_deref(),
            Some("# Title\nbody")
        );
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss_and_evicted() {
        let (cache, clock) = cache_with_clock();
        cache.set("https://example.com", "content").await;

        // Exactly at the TTL the entry is still fresh.
        clock.advance(TTL);
        assert!(cache.get("https://example.com").await.is_some());

        clock.advance(Duration::from_secs(1));
        assert!(cache.get("https://example.com").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_keys_are_not_normalized() {
        let (cache, _clock) = cache_with_clock();
        cache.set("https://example.com/", "slash").await;
        assert!(cache.get("https://example.com").await.is_none());
        assert!(cache.get("HTTPS://EXAMPLE.COM/").await.is_none());
    }

    #[tokio::test]
    async fn test_set_replaces_and_restarts_lifetime() {
        let (cache, clock) = cache_with_clock();
        cache.set("u", "old").await;
        clock.advance(Duration::from_secs(50));
        cache.set("u", "new").await;
        clock.advance(Duration::from_secs(50));
        assert_eq!(cache.get("u").await.as_deref(), Some("new"));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_purge_expired_only_removes_stale_entries() {
        let (cache, clock) = cache_with_clock();
        cache.set("old", "a").await;
        clock.advance(Duration::from_secs(45));
        cache.set("fresh", "b").await;
        clock.advance(Duration::from_secs(30));

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("fresh").await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let (cache, _clock) = cache_with_clock();
        cache.set("u", "x").await;
        assert!(cache.invalidate("u").await);
        assert!(!cache.invalidate("u").await);
        assert!(cache.get("u").await.is_none());
    }

    #[tokio::test]
    async fn test_clock_moving_backwards_keeps_entry() {
        let (cache, clock) = cache_with_clock();
        let start = clock.now();
        cache.set("u", "x").await;
        clock.set(start - chrono::Duration::hours(1));
        assert!(cache.get("u").await.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let cache = Arc::new(ContentCache::default());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    let key = format!("https://example.com/{}", i % 4);
                    cache.set(&key, format!("page {i}")).await;
                    cache.get(&key).await
                })
            })
            .collect();

        for result in futures::future::join_all(handles).await {
            assert!(result.unwrap().is_some());
        }
        assert_eq!(cache.len().await, 4);
    }
}
