//! In-memory backend built on moka
//!
//! A single moka cache holds entries with individual TTLs, letting
//! minute-lived sprint reports and the half-hour catalog listing coexist.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use super::backend::CacheBackend;
use super::error::CacheError;
use crate::core::config::{CacheConfig, EvictionPolicy};

#[derive(Clone)]
struct StoredValue {
    bytes: Vec<u8>,
    ttl: Option<Duration>,
    stored_at: Instant,
}

/// Gives every entry its own lifetime instead of one cache-wide TTL
struct PerEntryTtl;

impl Expiry<String, StoredValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }

    // Reads do not extend lifetimes.
    fn expire_after_read(
        &self,
        _key: &String,
        _value: &StoredValue,
        _read_at: Instant,
        duration_until_expiry: Option<Duration>,
        _last_modified_at: Instant,
    ) -> Option<Duration> {
        duration_until_expiry
    }
}

pub struct InMemoryCache {
    entries: Cache<String, StoredValue>,
}

impl InMemoryCache {
    pub fn new(config: &CacheConfig) -> Self {
        // moka evicts with TinyLFU no matter what; the lru setting is
        // accepted so configs stay portable, and only changes the log line.
        if matches!(config.eviction_policy, EvictionPolicy::Lru) {
            tracing::debug!(
                "Eviction policy 'lru' requested; moka applies TinyLFU, which \
                 covers recency with better hit rates"
            );
        }

        let initial = (config.max_entries as usize / 4).min(10_000);
        let entries = Cache::builder()
            .max_capacity(config.max_entries)
            .initial_capacity(initial)
            .expire_after(PerEntryTtl)
            .build();

        Self { entries }
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.entries.get(key).await.map(|v| v.bytes.clone()))
    }

    async fn write(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let stored = StoredValue {
            bytes: value,
            ttl,
            stored_at: Instant::now(),
        };
        self.entries.insert(key.to_string(), stored).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, CacheError> {
        let was_present = self.entries.contains_key(key);
        self.entries.invalidate(key).await;
        Ok(was_present)
    }

    async fn contains(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.contains_key(key))
    }

    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        let Some(stored) = self.entries.get(key).await else {
            return Ok(None);
        };
        // Entries without a TTL live forever and report no remaining time;
        // expired-but-unevicted entries also report none.
        let remaining = stored
            .ttl
            .and_then(|ttl| ttl.checked_sub(stored.stored_at.elapsed()))
            .filter(|left| *left > Duration::ZERO);
        Ok(remaining)
    }

    async fn remove_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        // Patterns from CacheKey are always prefix globs, so a prefix match
        // is all the globbing needed here.
        let prefix = pattern.trim_end_matches('*');
        let matching: Vec<String> = self
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| (*key).clone())
            .collect();

        let mut removed = 0u64;
        for key in matching {
            self.entries.invalidate(&key).await;
            removed += 1;
        }
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CacheBackendType;

    fn cache() -> InMemoryCache {
        InMemoryCache::new(&CacheConfig {
            backend: CacheBackendType::Memory,
            max_entries: 256,
            eviction_policy: EvictionPolicy::TinyLfu,
            redis_url: None,
        })
    }

    #[tokio::test]
    async fn test_read_returns_what_write_stored() {
        let cache = cache();
        cache
            .write("v1:report:catalog", vec![1, 2, 3], None)
            .await
            .unwrap();

        assert_eq!(
            cache.read("v1:report:catalog").await.unwrap(),
            Some(vec![1, 2, 3])
        );
        assert_eq!(cache.read("v1:report:missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_reports_presence() {
        let cache = cache();
        cache
            .write("v1:report:active-blockers:x", vec![9], None)
            .await
            .unwrap();

        assert!(cache.remove("v1:report:active-blockers:x").await.unwrap());
        assert!(!cache.remove("v1:report:active-blockers:x").await.unwrap());
        assert_eq!(cache.read("v1:report:active-blockers:x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_contains_tracks_writes() {
        let cache = cache();
        assert!(!cache.contains("v1:report:pi-burnup:k").await.unwrap());
        cache.write("v1:report:pi-burnup:k", vec![0], None).await.unwrap();
        assert!(cache.contains("v1:report:pi-burnup:k").await.unwrap());
    }

    #[tokio::test]
    async fn test_entries_expire_independently() {
        let cache = cache();
        cache
            .write(
                "v1:report:current-sprint-progress:a",
                vec![1],
                Some(Duration::from_millis(50)),
            )
            .await
            .unwrap();
        cache
            .write("v1:report:catalog", vec![2], Some(Duration::from_secs(60)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        cache.entries.run_pending_tasks().await;

        assert_eq!(
            cache.read("v1:report:current-sprint-progress:a").await.unwrap(),
            None
        );
        assert_eq!(cache.read("v1:report:catalog").await.unwrap(), Some(vec![2]));
    }

    #[tokio::test]
    async fn test_remove_pattern_scopes_by_prefix() {
        let cache = cache();
        for key in [
            "v1:report:team-velocity-trend:a",
            "v1:report:team-velocity-trend:b",
            "v1:report:team-wip-breakdown:c",
        ] {
            cache.write(key, vec![0], None).await.unwrap();
        }

        let removed = cache
            .remove_pattern("v1:report:team-velocity-trend:*")
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert!(cache.contains("v1:report:team-wip-breakdown:c").await.unwrap());

        let removed = cache.remove_pattern("v1:report:*").await.unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_remaining_ttl_reports_time() {
        let cache = cache();
        cache
            .write(
                "v1:report:pi-burnup:p",
                vec![1],
                Some(Duration::from_secs(60)),
            )
            .await
            .unwrap();
        cache.write("v1:report:catalog", vec![2], None).await.unwrap();

        let remaining = cache.remaining_ttl("v1:report:pi-burnup:p").await.unwrap().unwrap();
        assert!((58..=60).contains(&remaining.as_secs()));

        // No TTL and missing keys both report none.
        assert!(cache.remaining_ttl("v1:report:catalog").await.unwrap().is_none());
        assert!(cache.remaining_ttl("v1:report:gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_backend_identity() {
        let cache = cache();
        assert_eq!(cache.name(), "memory");
        assert!(cache.ping().await.is_ok());
    }
}
