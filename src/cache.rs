//! Two-tier TTL series cache
//!
//! Shared by the provider adapters and the resolver. An entry is served
//! without refreshing while fresh; after a failed refresh it is still
//! served from the stale tier until that window also lapses.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::EngineConfig;
use crate::models::{Series, Timeframe};

/// Epoch-millisecond clock, injectable for deterministic tests
pub type ClockFn = Arc<dyn Fn() -> i64 + Send + Sync>;

fn system_clock() -> ClockFn {
    Arc::new(|| Utc::now().timestamp_millis())
}

#[derive(Clone, Debug)]
struct CacheEntry {
    fresh_until: i64,
    stale_until: i64,
    data: Series,
}

/// Keyed TTL memo store for resolved and raw series
pub struct SeriesCache {
    fresh_ttl_ms: i64,
    stale_ttl_ms: i64,
    clock: ClockFn,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl SeriesCache {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_clock(config, system_clock())
    }

    /// Construct with an explicit clock (tests)
    pub fn with_clock(config: &EngineConfig, clock: ClockFn) -> Self {
        Self {
            fresh_ttl_ms: config.cache_fresh.as_millis() as i64,
            stale_ttl_ms: config.cache_stale.as_millis() as i64,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Key for a resolved chart series at its effective window
    pub fn resolved_key(chart_id: &str, currency: &str, timeframe: Timeframe) -> String {
        format!("resolved:{}:{}:{}", chart_id, currency, timeframe.label())
    }

    /// Key for one raw upstream request
    pub fn raw_key(provider: &str, request: &str) -> String {
        format!("raw:{}:{}", provider, request)
    }

    /// Data still inside the fresh window, if any
    pub async fn fresh(&self, key: &str) -> Option<Series> {
        let now = (self.clock)();
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if now <= entry.fresh_until {
            debug!("Cache fresh hit: {}", key);
            Some(entry.data.clone())
        } else {
            None
        }
    }

    /// Data inside the stale window, the degraded tier consulted after a
    /// failed refresh
    pub async fn stale(&self, key: &str) -> Option<Series> {
        let now = (self.clock)();
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if now <= entry.stale_until {
            debug!("Cache stale hit: {}", key);
            Some(entry.data.clone())
        } else {
            None
        }
    }

    /// Record a successful fetch or derivation
    pub async fn store(&self, key: &str, data: Series) {
        let now = (self.clock)();
        let entry = CacheEntry {
            fresh_until: now + self.fresh_ttl_ms,
            stale_until: now + self.stale_ttl_ms,
            data,
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    /// Number of live entries (expired ones included until purged)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop entries past their stale window
    pub async fn purge_expired(&self) -> usize {
        let now = (self.clock)();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| now <= e.stale_until);
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeriesPoint;
    use std::sync::atomic::{AtomicI64, Ordering};

    fn test_cache(start_ms: i64) -> (Arc<AtomicI64>, SeriesCache) {
        let config = EngineConfig {
            cache_fresh: std::time::Duration::from_secs(300),
            cache_stale: std::time::Duration::from_secs(3600),
            ..EngineConfig::default()
        };
        let now = Arc::new(AtomicI64::new(start_ms));
        let clock_now = now.clone();
        let cache = SeriesCache::with_clock(
            &config,
            Arc::new(move || clock_now.load(Ordering::SeqCst)),
        );
        (now, cache)
    }

    fn sample() -> Series {
        vec![SeriesPoint::new(1, 1.0), SeriesPoint::new(2, 2.0)]
    }

    #[tokio::test]
    async fn test_fresh_then_stale_then_gone() {
        let (now, cache) = test_cache(1_000_000);
        let key = SeriesCache::resolved_key("btc-price", "usd", Timeframe::Year1);
        cache.store(&key, sample()).await;

        assert!(cache.fresh(&key).await.is_some());

        // Past the fresh window, inside the stale window
        now.store(1_000_000 + 301_000, Ordering::SeqCst);
        assert!(cache.fresh(&key).await.is_none());
        assert_eq!(cache.stale(&key).await.unwrap(), sample());

        // Past the stale window too
        now.store(1_000_000 + 3_601_000, Ordering::SeqCst);
        assert!(cache.stale(&key).await.is_none());
        assert_eq!(cache.purge_expired().await, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_miss_on_unknown_key() {
        let (_, cache) = test_cache(0);
        assert!(cache.fresh("resolved:nope:usd:1Y").await.is_none());
        assert!(cache.stale("resolved:nope:usd:1Y").await.is_none());
    }

    #[tokio::test]
    async fn test_store_refreshes_both_tiers() {
        let (now, cache) = test_cache(0);
        let key = SeriesCache::raw_key("market", "btc:usd:1Y");
        cache.store(&key, sample()).await;
        now.store(250_000, Ordering::SeqCst);
        cache.store(&key, sample()).await;
        // Second store re-arms the fresh window from its own write time
        now.store(500_000, Ordering::SeqCst);
        assert!(cache.fresh(&key).await.is_some());
    }

    #[test]
    fn test_key_shapes() {
        assert_eq!(
            SeriesCache::resolved_key("btc-price", "usd", Timeframe::Month1),
            "resolved:btc-price:usd:30D"
        );
        assert_eq!(SeriesCache::raw_key("fees", "all"), "raw:fees:all");
    }
}
