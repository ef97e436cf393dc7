//! Insight, recommendation, and transcript queries backing the activity data sources

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::data::postgres::PostgresError;

/// Insight counts per category and severity since the window start
///
/// An empty `categories` slice selects every category.
pub async fn insight_counts(
    pool: &PgPool,
    team_id: Option<i64>,
    since: DateTime<Utc>,
    categories: &[String],
) -> Result<Vec<(String, String, i64)>, PostgresError> {
    let rows: Vec<(String, String, i64)> = sqlx::query_as(
        "SELECT category, severity, COUNT(*)::bigint \
         FROM insights \
         WHERE created_at >= $2 \
           AND ($1::bigint IS NULL OR team_id = $1) \
           AND (cardinality($3::text[]) = 0 OR category = ANY($3::text[])) \
         GROUP BY category, severity \
         ORDER BY category, severity",
    )
    .bind(team_id)
    .bind(since)
    .bind(categories)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Recommendation counts per pipeline status
///
/// An empty `statuses` slice selects every status.
pub async fn recommendation_counts(
    pool: &PgPool,
    team_id: Option<i64>,
    statuses: &[String],
) -> Result<Vec<(String, i64)>, PostgresError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*)::bigint \
         FROM recommendations \
         WHERE ($1::bigint IS NULL OR team_id = $1) \
           AND (cardinality($2::text[]) = 0 OR status = ANY($2::text[])) \
         GROUP BY status \
         ORDER BY status",
    )
    .bind(team_id)
    .bind(statuses)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Meeting transcript counts per ISO week and meeting type
///
/// An empty `meeting_types` slice selects every meeting type.
pub async fn transcript_volume_by_week(
    pool: &PgPool,
    team_id: Option<i64>,
    since: DateTime<Utc>,
    meeting_types: &[String],
) -> Result<Vec<(String, String, i64)>, PostgresError> {
    let rows: Vec<(String, String, i64)> = sqlx::query_as(
        "SELECT to_char(date_trunc('week', occurred_at), 'IYYY-IW'), meeting_type, COUNT(*)::bigint \
         FROM transcripts \
         WHERE occurred_at >= $2 \
           AND ($1::bigint IS NULL OR team_id = $1) \
           AND (cardinality($3::text[]) = 0 OR meeting_type = ANY($3::text[])) \
         GROUP BY 1, 2 \
         ORDER BY 1, 2",
    )
    .bind(team_id)
    .bind(since)
    .bind(meeting_types)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
