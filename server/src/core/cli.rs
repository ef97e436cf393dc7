use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::config::{CacheBackendType, EvictionPolicy};
use super::constants::{
    ENV_CACHE_BACKEND, ENV_CACHE_EVICTION_POLICY, ENV_CACHE_MAX_ENTRIES, ENV_CACHE_REDIS_URL,
    ENV_CONFIG, ENV_DEBUG, ENV_HOST, ENV_LOG, ENV_PORT, ENV_POSTGRES_URL,
};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(version, about = "Agile delivery reporting server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Host address to bind
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Verbose per-request logging
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,

    /// Config file to load instead of ./cadence.json
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "info,sqlx=warn" (wins over RUST_LOG)
    #[arg(long, global = true, env = ENV_LOG)]
    pub log: Option<String>,

    /// Report cache backend: memory, redis, or disabled
    #[arg(long, global = true, env = ENV_CACHE_BACKEND, value_parser = parse_cache_backend_type)]
    pub cache_backend: Option<CacheBackendType>,

    /// Entry cap for the in-memory cache
    #[arg(long, global = true, env = ENV_CACHE_MAX_ENTRIES)]
    pub cache_max_entries: Option<u64>,

    /// Eviction policy for the in-memory cache: tinylfu or lru
    #[arg(long, global = true, env = ENV_CACHE_EVICTION_POLICY, value_parser = parse_eviction_policy)]
    pub cache_eviction_policy: Option<EvictionPolicy>,

    /// URL of a Redis-compatible cache (Redis, Sentinel, Valkey, Dragonfly),
    /// e.g. redis://host:port/db or redis+sentinel://s1:port,s2:port/master/db
    #[arg(long, global = true, env = ENV_CACHE_REDIS_URL)]
    pub cache_redis_url: Option<String>,

    /// PostgreSQL URL of the report store
    #[arg(long, global = true, env = ENV_POSTGRES_URL)]
    pub postgres_url: Option<String>,
}

impl Cli {
    fn into_parts(self) -> (CliConfig, Option<Commands>) {
        let Cli {
            command,
            host,
            port,
            debug,
            config,
            log,
            cache_backend,
            cache_max_entries,
            cache_eviction_policy,
            cache_redis_url,
            postgres_url,
        } = self;
        let flags = CliConfig {
            host,
            port,
            debug,
            config,
            log,
            cache_backend,
            cache_max_entries,
            cache_eviction_policy,
            cache_redis_url,
            postgres_url,
        };
        (flags, command)
    }
}

fn parse_cache_backend_type(raw: &str) -> Result<CacheBackendType, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "memory" => Ok(CacheBackendType::Memory),
        "redis" => Ok(CacheBackendType::Redis),
        "disabled" | "none" => Ok(CacheBackendType::Disabled),
        other => Err(format!(
            "unrecognized cache backend '{other}' (expected memory, redis, or disabled)"
        )),
    }
}

fn parse_eviction_policy(raw: &str) -> Result<EvictionPolicy, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "tinylfu" => Ok(EvictionPolicy::TinyLfu),
        "lru" => Ok(EvictionPolicy::Lru),
        other => Err(format!(
            "unrecognized eviction policy '{other}' (expected tinylfu or lru)"
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Run the HTTP server (the default when no command is given)
    Start,
    /// Reconcile the built-in report catalog into the database, then exit
    Seed,
}

/// Flag values from a parsed command line, decoupled from clap
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug: bool,
    pub config: Option<PathBuf>,
    pub log: Option<String>,
    pub cache_backend: Option<CacheBackendType>,
    pub cache_max_entries: Option<u64>,
    pub cache_eviction_policy: Option<EvictionPolicy>,
    pub cache_redis_url: Option<String>,
    pub postgres_url: Option<String>,
}

/// Parse the process arguments into flag values plus the chosen command
pub fn parse() -> (CliConfig, Option<Commands>) {
    Cli::parse().into_parts()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parser_accepts_aliases() {
        assert_eq!(
            parse_cache_backend_type("Redis"),
            Ok(CacheBackendType::Redis)
        );
        assert_eq!(
            parse_cache_backend_type("none"),
            Ok(CacheBackendType::Disabled)
        );
        assert_eq!(
            parse_cache_backend_type(" memory "),
            Ok(CacheBackendType::Memory)
        );
        assert!(parse_cache_backend_type("both").is_err());
    }

    #[test]
    fn test_eviction_parser() {
        assert_eq!(parse_eviction_policy("TinyLFU"), Ok(EvictionPolicy::TinyLfu));
        assert_eq!(parse_eviction_policy("lru"), Ok(EvictionPolicy::Lru));
        assert!(parse_eviction_policy("fifo").is_err());
    }
}
