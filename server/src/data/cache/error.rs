//! Errors raised by the cache layer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    /// Bad backend selection or URL at construction time
    #[error("Cache misconfigured: {0}")]
    Config(String),

    /// Could not reach the backend, or it is benched by the cooldown
    #[error("Cache connection failed: {0}")]
    Connection(String),

    /// MessagePack encode or decode failed
    #[error("Cache payload codec failed: {0}")]
    Serialization(String),

    #[error("Redis command failed: {0}")]
    Redis(#[from] deadpool_redis::redis::RedisError),

    #[error("Redis pool failure: {0}")]
    Pool(#[from] deadpool_redis::PoolError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let cases: [(CacheError, &str); 3] = [
            (
                CacheError::Config("invalid backend".into()),
                "Cache misconfigured: invalid backend",
            ),
            (
                CacheError::Connection("refused".into()),
                "Cache connection failed: refused",
            ),
            (
                CacheError::Serialization("bad payload".into()),
                "Cache payload codec failed: bad payload",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }
}
