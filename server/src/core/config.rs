use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_HOST, DEFAULT_PORT,
    ENV_POSTGRES_URL, POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS, POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS,
    POSTGRES_DEFAULT_MAX_CONNECTIONS, POSTGRES_DEFAULT_MAX_LIFETIME_SECS,
    POSTGRES_DEFAULT_MIN_CONNECTIONS, POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS,
};

/// Which cache backend serves report payloads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendType {
    #[default]
    Memory,
    Redis,
    Disabled,
}

impl CacheBackendType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redis => "redis",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for CacheBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Eviction policy for the in-memory backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// TinyLFU admission over LRU eviction
    #[default]
    TinyLfu,
    /// Plain LRU, for recency-heavy access patterns
    Lru,
}

impl EvictionPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TinyLfu => "tinylfu",
            Self::Lru => "lru",
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- File layer: JSON, every field optional ---

/// `server` section of a config file
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// `database.redis` section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RedisSection {
    pub url: Option<String>,
}

/// `database.memory_cache` section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct MemoryCacheSection {
    pub max_entries: Option<u64>,
    pub eviction_policy: Option<EvictionPolicy>,
}

/// `database.postgres` section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostgresSection {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
    pub max_lifetime_secs: Option<u64>,
    pub statement_timeout_secs: Option<u64>,
}

/// `database` section of a config file
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseSection {
    pub cache: Option<CacheBackendType>,
    pub postgres: Option<PostgresSection>,
    pub redis: Option<RedisSection>,
    pub memory_cache: Option<MemoryCacheSection>,
}

/// One parsed config file; unrecognized top-level keys land in `extra`
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub server: Option<ServerSection>,
    pub database: Option<DatabaseSection>,
    pub debug: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Overlay `incoming` onto `slot` when the higher layer set the field
fn overlay<T>(slot: &mut Option<T>, incoming: Option<T>, field: &str) {
    if incoming.is_some() {
        tracing::trace!(field, "Config field set by higher layer");
        *slot = incoming;
    }
}

impl ConfigFile {
    /// Read and parse one JSON config file, warning about unknown keys
    fn read(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Reading config file");
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file {}", path.display()))?;
        let parsed: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Config file {} is not valid JSON", path.display()))?;
        parsed.log_unknown_keys();
        Ok(parsed)
    }

    fn log_unknown_keys(&self) {
        let Some(map) = self.extra.as_object() else {
            return;
        };
        if map.is_empty() {
            return;
        }
        let fields = map.keys().map(String::as_str).collect::<Vec<_>>().join(", ");
        tracing::warn!(fields = %fields, "Unknown fields in config file (possible typos)");
    }

    /// Fold `higher` onto this file's values, field by field
    fn merge(&mut self, higher: ConfigFile) {
        if let Some(server) = higher.server {
            let base = self.server.get_or_insert_with(Default::default);
            overlay(&mut base.host, server.host, "server.host");
            overlay(&mut base.port, server.port, "server.port");
        }

        if let Some(database) = higher.database {
            let base = self.database.get_or_insert_with(Default::default);
            overlay(&mut base.cache, database.cache, "database.cache");

            if let Some(pg) = database.postgres {
                let base_pg = base.postgres.get_or_insert_with(Default::default);
                overlay(&mut base_pg.url, pg.url, "database.postgres.url");
                overlay(
                    &mut base_pg.max_connections,
                    pg.max_connections,
                    "database.postgres.max_connections",
                );
                overlay(
                    &mut base_pg.min_connections,
                    pg.min_connections,
                    "database.postgres.min_connections",
                );
                overlay(
                    &mut base_pg.acquire_timeout_secs,
                    pg.acquire_timeout_secs,
                    "database.postgres.acquire_timeout_secs",
                );
                overlay(
                    &mut base_pg.idle_timeout_secs,
                    pg.idle_timeout_secs,
                    "database.postgres.idle_timeout_secs",
                );
                overlay(
                    &mut base_pg.max_lifetime_secs,
                    pg.max_lifetime_secs,
                    "database.postgres.max_lifetime_secs",
                );
                overlay(
                    &mut base_pg.statement_timeout_secs,
                    pg.statement_timeout_secs,
                    "database.postgres.statement_timeout_secs",
                );
            }

            if let Some(redis) = database.redis {
                let base_redis = base.redis.get_or_insert_with(Default::default);
                overlay(&mut base_redis.url, redis.url, "database.redis.url");
            }

            if let Some(mc) = database.memory_cache {
                let base_mc = base.memory_cache.get_or_insert_with(Default::default);
                overlay(
                    &mut base_mc.max_entries,
                    mc.max_entries,
                    "database.memory_cache.max_entries",
                );
                overlay(
                    &mut base_mc.eviction_policy,
                    mc.eviction_policy,
                    "database.memory_cache.eviction_policy",
                );
            }
        }

        overlay(&mut self.debug, higher.debug, "debug");
    }
}

// --- Runtime layer: fully resolved values ---

/// Listener address
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Redis cache settings, resolved
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Connection URL for Redis-compatible backends
    pub url: String,
}

/// In-memory cache settings, resolved
#[derive(Debug, Clone)]
pub struct MemoryCacheConfig {
    pub max_entries: u64,
    pub eviction_policy: EvictionPolicy,
}

/// What `CacheService` needs to pick and build its backend
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub backend: CacheBackendType,
    /// Entry cap for the memory backend
    pub max_entries: u64,
    /// Eviction policy for the memory backend
    pub eviction_policy: EvictionPolicy,
    /// Connection URL for the redis backend
    pub redis_url: Option<String>,
}

/// PostgreSQL pool and timeout settings, resolved
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    /// Connections kept warm for low latency
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// Cycle connections to avoid stale server-side state
    pub max_lifetime_secs: u64,
    /// Runaway-query guard, 0 disables it
    pub statement_timeout_secs: u64,
}

/// Storage configuration: the report store plus the cache in front of it
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub postgres: PostgresConfig,
    pub cache: CacheBackendType,
    /// Only populated when `cache` is `redis`
    pub redis: Option<RedisConfig>,
    pub memory_cache: MemoryCacheConfig,
}

impl DatabaseConfig {
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            backend: self.cache,
            max_entries: self.memory_cache.max_entries,
            eviction_policy: self.memory_cache.eviction_policy,
            redis_url: self.redis.as_ref().map(|r| r.url.clone()),
        }
    }
}

/// Fully resolved application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub debug: bool,
}

impl AppConfig {
    /// Resolve configuration from every layer
    ///
    /// Later layers win: compiled defaults, then `~/.cadence/cadence.json`,
    /// then a local `cadence.json` or the `--config` file (which must
    /// exist), then CLI flags with their env fallbacks.
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Resolving configuration");
        tracing::trace!(?cli, "CLI layer");

        let files = Self::file_layers(cli)?;
        let server = files.server.unwrap_or_default();
        let database = files.database.unwrap_or_default();

        let host = cli
            .host
            .clone()
            .or(server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.or(server.port).unwrap_or(DEFAULT_PORT);
        let debug = cli.debug || files.debug.unwrap_or(false);

        let cache_backend = cli.cache_backend.or(database.cache).unwrap_or_default();

        let memory = database.memory_cache.unwrap_or_default();
        let memory_cache = MemoryCacheConfig {
            max_entries: cli
                .cache_max_entries
                .or(memory.max_entries)
                .unwrap_or(DEFAULT_CACHE_MAX_ENTRIES),
            eviction_policy: cli
                .cache_eviction_policy
                .or(memory.eviction_policy)
                .unwrap_or_default(),
        };

        let redis = (cache_backend == CacheBackendType::Redis).then(|| {
            let section = database.redis.unwrap_or_default();
            RedisConfig {
                url: cli
                    .cache_redis_url
                    .clone()
                    .or(section.url)
                    .unwrap_or_default(),
            }
        });

        // The PostgreSQL URL additionally falls back to the bare env var so
        // `CADENCE_POSTGRES_URL=... cadence` works with no other setup.
        let pg = database.postgres.unwrap_or_default();
        let postgres = PostgresConfig {
            url: cli
                .postgres_url
                .clone()
                .or_else(|| std::env::var(ENV_POSTGRES_URL).ok())
                .or(pg.url)
                .unwrap_or_default(),
            max_connections: pg
                .max_connections
                .unwrap_or(POSTGRES_DEFAULT_MAX_CONNECTIONS),
            min_connections: pg
                .min_connections
                .unwrap_or(POSTGRES_DEFAULT_MIN_CONNECTIONS),
            acquire_timeout_secs: pg
                .acquire_timeout_secs
                .unwrap_or(POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS),
            idle_timeout_secs: pg
                .idle_timeout_secs
                .unwrap_or(POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS),
            max_lifetime_secs: pg
                .max_lifetime_secs
                .unwrap_or(POSTGRES_DEFAULT_MAX_LIFETIME_SECS),
            statement_timeout_secs: pg
                .statement_timeout_secs
                .unwrap_or(POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS),
        };

        let config = Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                postgres,
                cache: cache_backend,
                redis,
                memory_cache,
            },
            debug,
        };
        config.validate()?;

        tracing::debug!(config = ?config, "Configuration resolved");
        Ok(config)
    }

    /// Merge every config file that applies, lowest priority first
    fn file_layers(cli: &CliConfig) -> Result<ConfigFile> {
        let mut merged = ConfigFile::default();
        let mut loaded: Vec<String> = Vec::new();

        if let Some(profile) = profile_config_path()
            && profile.exists()
        {
            merged.merge(ConfigFile::read(&profile)?);
            loaded.push(profile.display().to_string());
        }

        let local = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file {} does not exist", expanded.display());
            }
            Some(expanded)
        } else {
            Some(PathBuf::from(CONFIG_FILE_NAME)).filter(|p| p.exists())
        };

        if let Some(path) = local {
            merged.merge(ConfigFile::read(&path)?);
            loaded.push(path.display().to_string());
        }

        tracing::debug!(files = ?loaded, "Config files merged");
        Ok(merged)
    }

    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Invalid configuration: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Invalid configuration: server.port must be greater than 0");
        }
        if self.database.postgres.url.is_empty() {
            anyhow::bail!(
                "Invalid configuration: database.postgres.url is required. \
                 Set {} or --postgres-url, or add database.postgres.url to a config file.",
                ENV_POSTGRES_URL
            );
        }
        if self.database.cache == CacheBackendType::Redis
            && self
                .database
                .redis
                .as_ref()
                .is_none_or(|r| r.url.is_empty())
        {
            anyhow::bail!(
                "Invalid configuration: database.redis.url is required when database.cache is \
                 'redis'. Set CADENCE_CACHE_REDIS_URL or add database.redis.url to a config file."
            );
        }

        // No authentication layer in front of this server; make open binds loud.
        if is_all_interfaces(&self.server.host) {
            tracing::warn!(
                host = %self.server.host,
                "Binding to all network interfaces. This exposes an unauthenticated \
                 server to your network."
            );
        }

        Ok(())
    }
}

/// Profile config file under the user's home directory
fn profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// True when `host` binds every interface
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}

/// Expand a leading `~` and anchor relative paths to the working directory
fn expand_path(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if raw.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let path = match raw.strip_prefix('~') {
        Some("") => dirs::home_dir().unwrap_or_else(|| PathBuf::from(raw)),
        Some(rest) if rest.starts_with('/') => match dirs::home_dir() {
            Some(home) => home.join(&rest[1..]),
            None => PathBuf::from(raw),
        },
        _ => PathBuf::from(raw),
    };

    if path.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&path))
            .unwrap_or(path)
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_backend_serde_round_trip() {
        for (json, backend) in [
            (r#""memory""#, CacheBackendType::Memory),
            (r#""redis""#, CacheBackendType::Redis),
            (r#""disabled""#, CacheBackendType::Disabled),
        ] {
            let parsed: CacheBackendType = serde_json::from_str(json).unwrap();
            assert_eq!(parsed, backend);
            assert_eq!(serde_json::to_string(&backend).unwrap(), json);
        }
    }

    #[test]
    fn test_backend_and_policy_names() {
        assert_eq!(CacheBackendType::Memory.to_string(), "memory");
        assert_eq!(CacheBackendType::Redis.to_string(), "redis");
        assert_eq!(CacheBackendType::Disabled.to_string(), "disabled");
        assert_eq!(EvictionPolicy::TinyLfu.to_string(), "tinylfu");
        assert_eq!(EvictionPolicy::Lru.to_string(), "lru");
    }

    #[test]
    fn test_config_file_parse() {
        let parsed: ConfigFile = serde_json::from_str(
            r#"{
                "server": { "host": "0.0.0.0", "port": 6100 },
                "database": {
                    "cache": "redis",
                    "postgres": { "url": "postgres://localhost/cadence", "max_connections": 50 },
                    "memory_cache": { "max_entries": 5000, "eviction_policy": "lru" }
                }
            }"#,
        )
        .unwrap();

        let server = parsed.server.as_ref().unwrap();
        assert_eq!(server.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(server.port, Some(6100));

        let database = parsed.database.as_ref().unwrap();
        assert_eq!(database.cache, Some(CacheBackendType::Redis));
        let pg = database.postgres.as_ref().unwrap();
        assert_eq!(pg.url.as_deref(), Some("postgres://localhost/cadence"));
        assert_eq!(pg.max_connections, Some(50));
        assert!(pg.min_connections.is_none());
        let mc = database.memory_cache.as_ref().unwrap();
        assert_eq!(mc.max_entries, Some(5000));
        assert_eq!(mc.eviction_policy, Some(EvictionPolicy::Lru));
    }

    #[test]
    fn test_config_file_parse_sparse() {
        let parsed: ConfigFile = serde_json::from_str(r#"{ "server": { "port": 9000 } }"#).unwrap();
        assert!(parsed.server.as_ref().unwrap().host.is_none());
        assert_eq!(parsed.server.as_ref().unwrap().port, Some(9000));
        assert!(parsed.database.is_none());

        let empty: ConfigFile = serde_json::from_str("{}").unwrap();
        assert!(empty.server.is_none());
        assert!(empty.database.is_none());
        assert!(empty.debug.is_none());
    }

    #[test]
    fn test_config_file_collects_unknown_keys() {
        let parsed: ConfigFile =
            serde_json::from_str(r#"{ "server": { "host": "localhost" }, "prot": 9000 }"#).unwrap();
        assert_eq!(parsed.server.as_ref().unwrap().host.as_deref(), Some("localhost"));
        assert_eq!(parsed.extra.get("prot").unwrap(), 9000);
    }

    #[test]
    fn test_config_file_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cadence.json");

        fs::write(&path, r#"{ "server": { "port": 6100 } }"#).unwrap();
        let parsed = ConfigFile::read(&path).unwrap();
        assert_eq!(parsed.server.unwrap().port, Some(6100));

        fs::write(&path, "{ \"server\": ").unwrap();
        let err = ConfigFile::read(&path).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));

        assert!(ConfigFile::read(&dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_merge_higher_layer_wins_per_field() {
        let mut base: ConfigFile = serde_json::from_str(
            r#"{
                "server": { "host": "base.host", "port": 1000 },
                "database": {
                    "cache": "memory",
                    "postgres": { "url": "postgres://base/cadence", "max_connections": 10 },
                    "memory_cache": { "max_entries": 1000 }
                },
                "debug": false
            }"#,
        )
        .unwrap();
        let higher: ConfigFile = serde_json::from_str(
            r#"{
                "server": { "port": 2000 },
                "database": {
                    "cache": "redis",
                    "postgres": { "max_connections": 40 },
                    "redis": { "url": "redis://overlay:6379/0" }
                },
                "debug": true
            }"#,
        )
        .unwrap();

        base.merge(higher);

        let server = base.server.as_ref().unwrap();
        assert_eq!(server.host.as_deref(), Some("base.host"));
        assert_eq!(server.port, Some(2000));

        let database = base.database.as_ref().unwrap();
        assert_eq!(database.cache, Some(CacheBackendType::Redis));
        let pg = database.postgres.as_ref().unwrap();
        assert_eq!(pg.url.as_deref(), Some("postgres://base/cadence"));
        assert_eq!(pg.max_connections, Some(40));
        assert_eq!(
            database.redis.as_ref().unwrap().url.as_deref(),
            Some("redis://overlay:6379/0")
        );
        assert_eq!(
            database.memory_cache.as_ref().unwrap().max_entries,
            Some(1000)
        );
        assert_eq!(base.debug, Some(true));
    }

    #[test]
    fn test_cache_config_projection() {
        let database = DatabaseConfig {
            postgres: PostgresConfig {
                url: "postgres://localhost/cadence".to_string(),
                max_connections: POSTGRES_DEFAULT_MAX_CONNECTIONS,
                min_connections: POSTGRES_DEFAULT_MIN_CONNECTIONS,
                acquire_timeout_secs: POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS,
                idle_timeout_secs: POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS,
                max_lifetime_secs: POSTGRES_DEFAULT_MAX_LIFETIME_SECS,
                statement_timeout_secs: POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS,
            },
            cache: CacheBackendType::Redis,
            redis: Some(RedisConfig {
                url: "redis://127.0.0.1:6379/1".to_string(),
            }),
            memory_cache: MemoryCacheConfig {
                max_entries: 42,
                eviction_policy: EvictionPolicy::Lru,
            },
        };

        let cache = database.cache_config();
        assert_eq!(cache.backend, CacheBackendType::Redis);
        assert_eq!(cache.max_entries, 42);
        assert_eq!(cache.eviction_policy, EvictionPolicy::Lru);
        assert_eq!(cache.redis_url.as_deref(), Some("redis://127.0.0.1:6379/1"));
    }

    #[test]
    fn test_load_prefers_cli_values() {
        let cli = CliConfig {
            host: Some("metrics.internal".to_string()),
            port: Some(4991),
            debug: true,
            cache_backend: Some(CacheBackendType::Disabled),
            postgres_url: Some("postgres://localhost/cadence".to_string()),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();

        assert_eq!(config.server.host, "metrics.internal");
        assert_eq!(config.server.port, 4991);
        assert!(config.debug);
        assert_eq!(config.database.cache, CacheBackendType::Disabled);
        assert_eq!(config.database.postgres.url, "postgres://localhost/cadence");
        assert_eq!(
            config.database.postgres.max_connections,
            POSTGRES_DEFAULT_MAX_CONNECTIONS
        );
        assert!(config.database.redis.is_none());
    }

    #[test]
    fn test_load_redis_backend_requires_url() {
        let cli = CliConfig {
            cache_backend: Some(CacheBackendType::Redis),
            postgres_url: Some("postgres://localhost/cadence".to_string()),
            ..Default::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("database.redis.url"));

        let cli = CliConfig {
            cache_backend: Some(CacheBackendType::Redis),
            cache_redis_url: Some("redis://127.0.0.1:6379/0".to_string()),
            postgres_url: Some("postgres://localhost/cadence".to_string()),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert_eq!(config.database.cache, CacheBackendType::Redis);
        assert_eq!(
            config.database.redis.as_ref().unwrap().url,
            "redis://127.0.0.1:6379/0"
        );
    }

    #[test]
    fn test_is_all_interfaces() {
        for host in ["0.0.0.0", "::", "[::]"] {
            assert!(is_all_interfaces(host), "{host}");
        }
        for host in ["127.0.0.1", "localhost", "::1", "192.168.1.10"] {
            assert!(!is_all_interfaces(host), "{host}");
        }
    }

    #[test]
    fn test_expand_path_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~"), home);
            assert_eq!(expand_path("~/cadence.json"), home.join("cadence.json"));
        }
        // A bare ~user form is left alone.
        assert!(expand_path("~other").ends_with("~other"));
    }
}
