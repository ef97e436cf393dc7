// --- Identity and config files ---

/// Lowercase application name, used in paths and cache keys
pub const APP_NAME_LOWER: &str = "cadence";

/// Dot-folder under the user's home directory
pub const APP_DOT_FOLDER: &str = ".cadence";

/// File name looked up in the profile folder and the working directory
pub const CONFIG_FILE_NAME: &str = "cadence.json";

// --- Environment variables ---

/// Overrides the config file path
pub const ENV_CONFIG: &str = "CADENCE_CONFIG";

/// Turns on verbose request logging
pub const ENV_DEBUG: &str = "CADENCE_DEBUG";

/// Bind host
pub const ENV_HOST: &str = "CADENCE_HOST";

/// Listen port
pub const ENV_PORT: &str = "CADENCE_PORT";

/// Log filter, same syntax as RUST_LOG
pub const ENV_LOG: &str = "CADENCE_LOG";

/// PostgreSQL URL of the report store
pub const ENV_POSTGRES_URL: &str = "CADENCE_POSTGRES_URL";

/// Cache backend selector (memory, redis, disabled)
pub const ENV_CACHE_BACKEND: &str = "CADENCE_CACHE_BACKEND";

/// Entry cap for the in-memory cache
pub const ENV_CACHE_MAX_ENTRIES: &str = "CADENCE_CACHE_MAX_ENTRIES";

/// Eviction policy for the in-memory cache (tinylfu, lru)
pub const ENV_CACHE_EVICTION_POLICY: &str = "CADENCE_CACHE_EVICTION_POLICY";

/// URL of a Redis-compatible cache; redis://, rediss://, redis+sentinel://
/// and rediss+sentinel:// schemes are accepted
pub const ENV_CACHE_REDIS_URL: &str = "CADENCE_CACHE_REDIS_URL";

// --- Server defaults ---

/// Loopback only unless configured otherwise
pub const DEFAULT_HOST: &str = "127.0.0.1";

pub const DEFAULT_PORT: u16 = 5480;

/// Request body cap, 1 MiB
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// How long graceful shutdown waits for background tasks
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

// --- PostgreSQL pool defaults ---

pub const POSTGRES_DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Connections kept warm even when idle
pub const POSTGRES_DEFAULT_MIN_CONNECTIONS: u32 = 2;

pub const POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Idle connections above the minimum are released after this long
pub const POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Connections are cycled after this long regardless of activity
pub const POSTGRES_DEFAULT_MAX_LIFETIME_SECS: u64 = 1800;

/// Server-side statement timeout; 0 leaves queries unbounded
pub const POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 60;

// --- Cache sizing and keys ---

pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 100_000;

/// Leading segment of every cache key; bump to orphan all existing entries
/// after an incompatible payload change
pub const CACHE_KEY_VERSION: &str = "v1";

/// Budget for acquiring a Redis connection and pinging it
pub const REDIS_CONNECT_TIMEOUT_SECS: u64 = 2;

/// How long Redis stays benched after a connection failure (30 min)
pub const REDIS_RETRY_COOLDOWN_SECS: u64 = 1800;

// --- Report TTL tiers ---

/// Reports over in-flight work go stale fast (1 min)
pub const CACHE_TTL_REPORT_SHORT: u64 = 60;

/// Trend and forecast reports (5 min)
pub const CACHE_TTL_REPORT_MEDIUM: u64 = 300;

/// Reports over closed or historical data (30 min)
pub const CACHE_TTL_REPORT_LONG: u64 = 1800;

/// Catalog listing (30 min)
pub const CACHE_TTL_REPORT_CATALOG: u64 = 1800;
