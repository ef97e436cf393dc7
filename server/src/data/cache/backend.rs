//! The contract every cache backend satisfies

use std::time::Duration;

use async_trait::async_trait;

use super::error::CacheError;

/// Byte-oriented cache operations
///
/// Implemented by the memory, Redis, and disabled backends. Single-key
/// operations are atomic, but boolean answers (`remove`, `contains`) can be
/// stale under concurrent writers, which a cache tolerates.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a value; `None` TTL means the entry never expires on its own
    async fn write(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>;

    /// Drop a key, answering whether it was present (best-effort)
    async fn remove(&self, key: &str) -> Result<bool, CacheError>;

    async fn contains(&self, key: &str) -> Result<bool, CacheError>;

    /// Remaining lifetime of a key, when it has one
    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>, CacheError>;

    /// Drop keys matching a glob such as `v1:report:*`, returning the count
    ///
    /// Walks the keyspace: O(n) in memory, cursor-based SCAN on Redis.
    async fn remove_pattern(&self, pattern: &str) -> Result<u64, CacheError>;

    /// Verify the backend can actually serve operations right now
    async fn ping(&self) -> Result<(), CacheError>;

    /// Short name for logs and the stats endpoint
    fn name(&self) -> &'static str;
}
