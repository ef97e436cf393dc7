//! Team lookups shared by the report data sources

use sqlx::PgPool;

use crate::data::postgres::PostgresError;

/// List all team names, sorted
pub async fn list_team_names(pool: &PgPool) -> Result<Vec<String>, PostgresError> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM teams ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// Resolve a team name to its id
pub async fn find_team_id(pool: &PgPool, name: &str) -> Result<Option<i64>, PostgresError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM teams WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(id,)| id))
}
