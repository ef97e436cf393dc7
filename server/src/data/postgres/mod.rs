//! PostgreSQL service for the report store
//!
//! Owns the sqlx pool and the schema migrations that run before the first
//! query. Pool sizing, idle cleanup, lifetime cycling, and the server-side
//! statement timeout all come from `PostgresConfig`.

pub mod error;
mod migrations;
pub mod repositories;
pub mod schema;

pub use error::PostgresError;
pub use sqlx::PgPool;

use std::sync::Arc;
use std::time::Duration;

use sqlx::ConnectOptions;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::log::LevelFilter;

use crate::core::config::PostgresConfig;
use crate::core::constants::{
    POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS, POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS,
    POSTGRES_DEFAULT_MAX_CONNECTIONS, POSTGRES_DEFAULT_MAX_LIFETIME_SECS,
    POSTGRES_DEFAULT_MIN_CONNECTIONS, POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS,
};

/// Zeroed pool knobs fall back to the compiled defaults
fn nonzero_or<T: PartialOrd + Default>(value: T, fallback: T) -> T {
    if value > T::default() { value } else { fallback }
}

/// Owner of the connection pool
///
/// Built once at startup and shared behind an `Arc`; `init` runs migrations,
/// so a successfully constructed service always sees a current schema.
pub struct PostgresService {
    pool: PgPool,
}

impl PostgresService {
    pub async fn init(config: &PostgresConfig) -> Result<Self, PostgresError> {
        if config.url.is_empty() {
            return Err(PostgresError::Config("no PostgreSQL URL configured".into()));
        }

        let max_conns = nonzero_or(config.max_connections, POSTGRES_DEFAULT_MAX_CONNECTIONS);
        let min_conns = nonzero_or(config.min_connections, POSTGRES_DEFAULT_MIN_CONNECTIONS);
        let acquire = nonzero_or(
            config.acquire_timeout_secs,
            POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS,
        );
        let idle = nonzero_or(config.idle_timeout_secs, POSTGRES_DEFAULT_IDLE_TIMEOUT_SECS);
        let lifetime = nonzero_or(config.max_lifetime_secs, POSTGRES_DEFAULT_MAX_LIFETIME_SECS);
        let stmt_secs = nonzero_or(
            config.statement_timeout_secs,
            POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS,
        );

        let mut options: PgConnectOptions = config
            .url
            .parse()
            .map_err(|e| PostgresError::Config(format!("Invalid PostgreSQL URL: {e}")))?;
        options = options.log_statements(LevelFilter::Trace);
        if stmt_secs > 0 {
            // Enforced server-side, so it also covers queries stuck in the
            // database rather than in this process.
            options = options.options([("statement_timeout", format!("{stmt_secs}s"))]);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_conns)
            .min_connections(min_conns)
            .acquire_timeout(Duration::from_secs(acquire))
            .idle_timeout(Duration::from_secs(idle))
            .max_lifetime(Duration::from_secs(lifetime))
            .test_before_acquire(true)
            .connect_with(options)
            .await?;

        migrations::run_migrations(&pool).await?;

        tracing::debug!(
            max_connections = max_conns,
            min_connections = min_conns,
            acquire_timeout_secs = acquire,
            idle_timeout_secs = idle,
            max_lifetime_secs = lifetime,
            statement_timeout_secs = stmt_secs,
            "PostgreSQL service ready"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Drain and close the pool
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("PostgreSQL pool closed");
    }

    /// Probe the database once a minute until shutdown
    ///
    /// Failures only log; the pool re-establishes connections on its own
    /// once the database comes back.
    pub fn spawn_health_task(
        self: &Arc<Self>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(60));
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("Stopping PostgreSQL health probe");
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = sqlx::query("SELECT 1").execute(service.pool()).await {
                            tracing::warn!(error = %e, "PostgreSQL health probe failed");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    // Everything here needs a live PostgreSQL; covered by integration runs.
}
