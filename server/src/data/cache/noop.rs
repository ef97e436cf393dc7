//! No-op cache backend for cache-free deployments
//!
//! Every read is a miss and every write is discarded, which lets the rest
//! of the server treat "caching disabled" as just another backend.

use std::time::Duration;

use async_trait::async_trait;

use super::backend::CacheBackend;
use super::error::CacheError;

pub struct NoopCache;

#[async_trait]
impl CacheBackend for NoopCache {
    async fn read(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    async fn write(
        &self,
        _key: &str,
        _value: Vec<u8>,
        _ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<bool, CacheError> {
        Ok(false)
    }

    async fn contains(&self, _key: &str) -> Result<bool, CacheError> {
        Ok(false)
    }

    async fn remaining_ttl(&self, _key: &str) -> Result<Option<Duration>, CacheError> {
        Ok(None)
    }

    async fn remove_pattern(&self, _pattern: &str) -> Result<u64, CacheError> {
        Ok(0)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Err(CacheError::Config("cache backend is disabled".to_string()))
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_reads_are_misses() {
        let cache = NoopCache;
        cache.write("k", b"v".to_vec(), None).await.unwrap();
        assert_eq!(cache.read("k").await.unwrap(), None);
        assert!(!cache.contains("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_noop_maintenance_is_inert() {
        let cache = NoopCache;
        assert!(!cache.remove("k").await.unwrap());
        assert_eq!(cache.remove_pattern("v1:report:*").await.unwrap(), 0);
        assert_eq!(cache.remaining_ttl("k").await.unwrap(), None);
        assert!(cache.ping().await.is_err());
        assert_eq!(cache.name(), "disabled");
    }
}
