//! Exchange-rate cache with a fixed validity window.
//!
//! A single storage slot holds the most recent rate table. Every operation is
//! best-effort: storage and decoding failures never reach the caller.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::core::storage::{load_json, save_json, LocalStorage};
use crate::shared::types::CachedRates;

pub const RATE_CACHE_KEY: &str = "nekostack.currency.rates";
pub const DEFAULT_RATE_TTL_MINUTES: i64 = 15;

#[derive(Clone)]
pub struct RateCache {
    storage: Arc<dyn LocalStorage>,
    ttl: Duration,
}

impl RateCache {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self::with_ttl(storage, Duration::minutes(DEFAULT_RATE_TTL_MINUTES))
    }

    pub fn with_ttl(storage: Arc<dyn LocalStorage>, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached rates if present, decodable and no older than the TTL.
    ///
    /// A stale entry is deleted as a side effect.
    pub fn get_cached_rates(&self) -> Option<CachedRates> {
        let cached: CachedRates = match load_json(self.storage.as_ref(), RATE_CACHE_KEY) {
            Ok(Some(cached)) => cached,
            Ok(None) => return None,
            Err(e) => {
                debug!("[RateCache] Treating unreadable cache as a miss: {}", e);
                return None;
            }
        };

        let Some(age_ms) = Utc::now().timestamp_millis().checked_sub(cached.timestamp) else {
            debug!("[RateCache] Cached timestamp {} out of range; purging", cached.timestamp);
            self.clear_cached_rates();
            return None;
        };
        if age_ms > self.ttl.num_milliseconds() {
            debug!("[RateCache] Cached rates are {}ms old; purging", age_ms);
            self.clear_cached_rates();
            return None;
        }

        Some(cached)
    }

    /// Overwrites the cache slot, stamping it with the current time.
    pub fn set_cached_rates(&self, rates: HashMap<String, Decimal>, last_updated: &str, is_expired: bool) {
        let entry = CachedRates {
            rates,
            timestamp: Utc::now().timestamp_millis(),
            last_updated: last_updated.to_string(),
            is_expired,
        };

        if let Err(e) = save_json(self.storage.as_ref(), RATE_CACHE_KEY, &entry) {
            warn!("[RateCache] Failed to cache rates: {}", e);
        }
    }

    pub fn clear_cached_rates(&self) {
        let _ = self.storage.remove(RATE_CACHE_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::InMemoryStorage;
    use crate::shared::error::{AppError, AppResult};
    use std::str::FromStr;

    fn sample_rates() -> HashMap<String, Decimal> {
        HashMap::from([
            ("USD".to_string(), Decimal::ONE),
            ("EUR".to_string(), Decimal::from_str("0.92").unwrap()),
            ("JPY".to_string(), Decimal::from_str("151.37").unwrap()),
        ])
    }

    fn setup() -> (Arc<InMemoryStorage>, RateCache) {
        let storage = Arc::new(InMemoryStorage::new());
        let cache = RateCache::new(storage.clone());
        (storage, cache)
    }

    #[test]
    fn test_set_then_get() {
        let (_, cache) = setup();
        cache.set_cached_rates(sample_rates(), "2025-01-01T00:00:00Z", false);

        let cached = cache.get_cached_rates().expect("fresh entry");
        assert_eq!(cached.rates, sample_rates());
        assert_eq!(cached.last_updated, "2025-01-01T00:00:00Z");
        assert!(!cached.is_expired);
    }

    #[test]
    fn test_empty_cache_is_miss() {
        let (_, cache) = setup();
        assert!(cache.get_cached_rates().is_none());
    }

    #[test]
    fn test_stale_entry_is_purged() {
        let (storage, cache) = setup();
        let stale = CachedRates {
            rates: sample_rates(),
            timestamp: (Utc::now() - Duration::minutes(16)).timestamp_millis(),
            last_updated: "2025-01-01T00:00:00Z".to_string(),
            is_expired: false,
        };
        save_json(storage.as_ref(), RATE_CACHE_KEY, &stale).unwrap();

        assert!(cache.get_cached_rates().is_none());
        assert_eq!(storage.get(RATE_CACHE_KEY).unwrap(), None);
    }

    #[test]
    fn test_entry_inside_window_survives() {
        let (storage, cache) = setup();
        let recent = CachedRates {
            rates: sample_rates(),
            timestamp: (Utc::now() - Duration::minutes(14)).timestamp_millis(),
            last_updated: "2025-01-01T00:00:00Z".to_string(),
            is_expired: true,
        };
        save_json(storage.as_ref(), RATE_CACHE_KEY, &recent).unwrap();

        let cached = cache.get_cached_rates().expect("still valid");
        assert!(cached.is_expired);
    }

    #[test]
    fn test_clear_always_misses() {
        let (_, cache) = setup();
        cache.clear_cached_rates();
        assert!(cache.get_cached_rates().is_none());

        cache.set_cached_rates(sample_rates(), "now", false);
        cache.clear_cached_rates();
        assert!(cache.get_cached_rates().is_none());
    }

    #[test]
    fn test_corrupt_entry_is_miss() {
        let (storage, cache) = setup();
        storage.set(RATE_CACHE_KEY, "{\"rates\": 12").unwrap();
        assert!(cache.get_cached_rates().is_none());
    }

    #[test]
    fn test_out_of_range_timestamp_is_purged() {
        let (storage, cache) = setup();
        storage
            .set(
                RATE_CACHE_KEY,
                r#"{"rates":{"USD":"1"},"timestamp":-9223372036854775808,"lastUpdated":"x","isExpired":false}"#,
            )
            .unwrap();

        assert!(cache.get_cached_rates().is_none());
        assert_eq!(storage.get(RATE_CACHE_KEY).unwrap(), None);
    }

    #[test]
    fn test_custom_ttl() {
        let storage = Arc::new(InMemoryStorage::new());
        let cache = RateCache::with_ttl(storage, Duration::zero() - Duration::milliseconds(1));
        cache.set_cached_rates(sample_rates(), "now", false);
        assert!(cache.get_cached_rates().is_none());
    }

    struct BrokenStorage;

    impl LocalStorage for BrokenStorage {
        fn get(&self, _key: &str) -> AppResult<Option<String>> {
            Err(AppError::Storage("disk on fire".to_string()))
        }
        fn set(&self, _key: &str, _value: &str) -> AppResult<()> {
            Err(AppError::Storage("disk on fire".to_string()))
        }
        fn remove(&self, _key: &str) -> AppResult<()> {
            Err(AppError::Storage("disk on fire".to_string()))
        }
    }

    #[test]
    fn test_storage_failures_never_surface() {
        let cache = RateCache::new(Arc::new(BrokenStorage));
        cache.set_cached_rates(sample_rates(), "now", false);
        assert!(cache.get_cached_rates().is_none());
        cache.clear_cached_rates();
    }
}
