//! Schema bootstrap and versioned migrations
//!
//! A fresh database gets the full schema in one shot; existing databases
//! step through `MIGRATIONS` until they reach `SCHEMA_VERSION`.

use std::cmp::Ordering;

use sqlx::PgPool;

use super::error::PostgresError;
use super::schema::{SCHEMA, SCHEMA_VERSION};

/// Versioned migrations in order; each entry is `(version, name, sql)`
///
/// Version 1 is the baseline applied through `SCHEMA`, so entries start at 2.
const MIGRATIONS: &[(i32, &str, &str)] = &[];

/// Bring the schema up to `SCHEMA_VERSION`
pub async fn run_migrations(pool: &PgPool) -> Result<(), PostgresError> {
    let Some(installed) = installed_version(pool).await? else {
        tracing::debug!(version = SCHEMA_VERSION, "Installing PostgreSQL schema");
        return install_baseline(pool).await;
    };

    match installed.cmp(&SCHEMA_VERSION) {
        Ordering::Less => {
            tracing::debug!(
                from = installed,
                to = SCHEMA_VERSION,
                "Migrating PostgreSQL schema"
            );
            for next in (installed + 1)..=SCHEMA_VERSION {
                apply_migration(pool, next).await?;
            }
        }
        Ordering::Greater => {
            tracing::warn!(
                installed,
                expected = SCHEMA_VERSION,
                "Database schema is newer than this build; proceed with care"
            );
        }
        Ordering::Equal => {
            tracing::debug!(version = SCHEMA_VERSION, "PostgreSQL schema is current");
        }
    }
    Ok(())
}

/// Installed schema version; `None` means a fresh database
async fn installed_version(pool: &PgPool) -> Result<Option<i32>, PostgresError> {
    let table_exists: bool =
        sqlx::query_scalar("SELECT to_regclass('public.schema_version') IS NOT NULL")
            .fetch_one(pool)
            .await?;
    if !table_exists {
        return Ok(None);
    }

    // A version table with no row counts as fresh too.
    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(version)
}

async fn install_baseline(pool: &PgPool) -> Result<(), PostgresError> {
    sqlx::query(SCHEMA).execute(pool).await?;

    sqlx::query(
        "INSERT INTO schema_version (id, version, description)
         VALUES (1, $1, 'Initial schema')
         ON CONFLICT (id) DO UPDATE SET version = $1, applied_at = now()",
    )
    .bind(SCHEMA_VERSION)
    .execute(pool)
    .await?;

    tracing::debug!(version = SCHEMA_VERSION, "PostgreSQL schema installed");
    Ok(())
}

/// Apply one entry from `MIGRATIONS` and record it
async fn apply_migration(pool: &PgPool, version: i32) -> Result<(), PostgresError> {
    let Some(&(_, name, sql)) = MIGRATIONS.iter().find(|(v, _, _)| *v == version) else {
        return Err(PostgresError::MigrationFailed {
            version,
            name: "unregistered".into(),
            error: format!("No migration defined for version {version}"),
        });
    };

    let started = std::time::Instant::now();
    sqlx::query(sql)
        .execute(pool)
        .await
        .map_err(|e| PostgresError::MigrationFailed {
            version,
            name: name.to_string(),
            error: e.to_string(),
        })?;
    let elapsed_ms = started.elapsed().as_millis() as i64;

    sqlx::query(
        "INSERT INTO schema_migrations (version, name, checksum, execution_time_ms, success)
         VALUES ($1, $2, $3, $4, TRUE)",
    )
    .bind(version)
    .bind(name)
    .bind(checksum(sql))
    .bind(elapsed_ms)
    .execute(pool)
    .await?;

    sqlx::query("UPDATE schema_version SET version = $1, applied_at = now() WHERE id = 1")
        .bind(version)
        .execute(pool)
        .await?;

    tracing::debug!(version, name, elapsed_ms, "Migration applied");
    Ok(())
}

/// Content hash of a migration script, stored with its record
fn checksum(sql: &str) -> String {
    format!("{:x}", md5::compute(sql))
}
