//! Report cache with pluggable backends
//!
//! Three backends, chosen by configuration: moka in-process memory (the
//! default), a Redis-compatible server via deadpool-redis, and a disabled
//! mode where every read misses. `CacheService` is the only type the rest
//! of the crate talks to.

mod backend;
mod error;
mod gate;
mod key;
mod memory;
mod noop;
mod redis;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use backend::CacheBackend;
pub use error::CacheError;
pub use key::CacheKey;

use memory::InMemoryCache;
use noop::NoopCache;

use crate::core::config::{CacheBackendType, CacheConfig};

fn to_msgpack<T: Serialize>(value: &T) -> Result<Vec<u8>, CacheError> {
    rmp_serde::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string()))
}

fn from_msgpack<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CacheError> {
    rmp_serde::from_slice(bytes).map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Facade over the configured cache backend
///
/// Callers can work with raw bytes or with any serde type; typed values
/// travel as MessagePack.
pub struct CacheService {
    store: Arc<dyn CacheBackend>,
}

impl std::fmt::Debug for CacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheService")
            .field("backend", &self.store.name())
            .finish()
    }
}

impl CacheService {
    /// Build the backend named by `config`
    ///
    /// Construction never touches the network; the Redis backend connects
    /// lazily on its first operation.
    pub fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let store: Arc<dyn CacheBackend> = match config.backend {
            CacheBackendType::Memory => {
                tracing::debug!(
                    max_entries = config.max_entries,
                    eviction_policy = ?config.eviction_policy,
                    "Using in-memory report cache"
                );
                Arc::new(InMemoryCache::new(config))
            }
            CacheBackendType::Redis => {
                let url = config.redis_url.as_deref().ok_or_else(|| {
                    CacheError::Config("redis backend selected without a redis_url".into())
                })?;
                Arc::new(redis::RedisCache::new(url)?)
            }
            CacheBackendType::Disabled => {
                tracing::debug!("Report cache disabled; every read will miss");
                Arc::new(NoopCache)
            }
        };
        Ok(Self { store })
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    /// Fetch and decode a typed value
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.store.read(key).await? {
            Some(bytes) => Ok(Some(from_msgpack(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Encode and store a typed value
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.store.write(key, to_msgpack(value)?, ttl).await
    }

    /// Fetch a value without decoding it
    pub async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.store.read(key).await
    }

    /// Store pre-encoded bytes
    pub async fn set_raw(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.store.write(key, value, ttl).await
    }

    /// Remove one key; true if it was present
    pub async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.store.remove(key).await
    }

    pub async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.store.contains(key).await
    }

    /// Remove every key matching a glob pattern, returning the count
    pub async fn invalidate(&self, pattern: &str) -> Result<u64, CacheError> {
        self.store.remove_pattern(pattern).await
    }

    /// Remaining TTL, if the key exists and carries one
    pub async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        self.store.remaining_ttl(key).await
    }

    pub async fn health_check(&self) -> Result<(), CacheError> {
        self.store.ping().await
    }
}
