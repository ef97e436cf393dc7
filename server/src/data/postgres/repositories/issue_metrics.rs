//! Issue metric queries backing the issue-area data sources

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::data::postgres::PostgresError;

/// Work-in-progress issues grouped by workflow status, busiest first
pub async fn wip_by_status(
    pool: &PgPool,
    team_id: Option<i64>,
    issue_type: Option<&str>,
) -> Result<Vec<(String, i64, f64)>, PostgresError> {
    let rows: Vec<(String, i64, f64)> = sqlx::query_as(
        "SELECT i.status, COUNT(*)::bigint, \
                COALESCE(SUM(i.story_points), 0)::double precision \
         FROM issues i \
         WHERE i.status_category = 'in_progress' \
           AND ($1::bigint IS NULL OR i.team_id = $1) \
           AND ($2::text IS NULL OR i.issue_type = $2) \
         GROUP BY i.status \
         ORDER BY COUNT(*) DESC, i.status",
    )
    .bind(team_id)
    .bind(issue_type)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Blocked, unresolved issues with their age in days, oldest first
pub async fn list_active_blockers(
    pool: &PgPool,
    team_id: Option<i64>,
    priority: Option<&str>,
) -> Result<Vec<(String, String, String, f64)>, PostgresError> {
    let rows: Vec<(String, String, String, f64)> = sqlx::query_as(
        "SELECT i.issue_key, COALESCE(i.summary, ''), i.status, \
                GREATEST(EXTRACT(EPOCH FROM (now() - i.created_at)) / 86400.0, 0)::double precision AS days_open \
         FROM issues i \
         WHERE i.blocked AND i.status_category <> 'done' \
           AND ($1::bigint IS NULL OR i.team_id = $1) \
           AND ($2::text IS NULL OR i.priority = $2) \
         ORDER BY days_open DESC",
    )
    .bind(team_id)
    .bind(priority)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Issues closed per month since the window start
pub async fn closed_counts_by_month(
    pool: &PgPool,
    team_id: Option<i64>,
    since: DateTime<Utc>,
    issue_type: Option<&str>,
) -> Result<Vec<(String, i64, f64)>, PostgresError> {
    let rows: Vec<(String, i64, f64)> = sqlx::query_as(
        "SELECT to_char(date_trunc('month', i.resolved_at), 'YYYY-MM'), \
                COUNT(*)::bigint, \
                COALESCE(SUM(i.story_points), 0)::double precision \
         FROM issues i \
         WHERE i.status_category = 'done' AND i.resolved_at >= $2 \
           AND ($1::bigint IS NULL OR i.team_id = $1) \
           AND ($3::text IS NULL OR i.issue_type = $3) \
         GROUP BY 1 \
         ORDER BY 1",
    )
    .bind(team_id)
    .bind(since)
    .bind(issue_type)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Cycle time percentiles (created to resolved, in days) per issue type
pub async fn cycle_time_percentiles(
    pool: &PgPool,
    team_id: Option<i64>,
    since: DateTime<Utc>,
    issue_type: Option<&str>,
) -> Result<Vec<(String, f64, f64, f64, i64)>, PostgresError> {
    let rows: Vec<(String, f64, f64, f64, i64)> = sqlx::query_as(
        "SELECT i.issue_type, \
                percentile_cont(0.5) WITHIN GROUP (ORDER BY EXTRACT(EPOCH FROM (i.resolved_at - i.created_at)) / 86400.0)::double precision, \
                percentile_cont(0.85) WITHIN GROUP (ORDER BY EXTRACT(EPOCH FROM (i.resolved_at - i.created_at)) / 86400.0)::double precision, \
                percentile_cont(0.95) WITHIN GROUP (ORDER BY EXTRACT(EPOCH FROM (i.resolved_at - i.created_at)) / 86400.0)::double precision, \
                COUNT(*)::bigint \
         FROM issues i \
         WHERE i.status_category = 'done' AND i.resolved_at IS NOT NULL AND i.resolved_at >= $2 \
           AND ($1::bigint IS NULL OR i.team_id = $1) \
           AND ($3::text IS NULL OR i.issue_type = $3) \
         GROUP BY i.issue_type \
         ORDER BY i.issue_type",
    )
    .bind(team_id)
    .bind(since)
    .bind(issue_type)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Issues created per type since the window start, most common first
pub async fn issue_type_counts(
    pool: &PgPool,
    team_id: Option<i64>,
    since: DateTime<Utc>,
) -> Result<Vec<(String, i64)>, PostgresError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT i.issue_type, COUNT(*)::bigint \
         FROM issues i \
         WHERE i.created_at >= $2 \
           AND ($1::bigint IS NULL OR i.team_id = $1) \
         GROUP BY i.issue_type \
         ORDER BY COUNT(*) DESC, i.issue_type",
    )
    .bind(team_id)
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Defects created vs resolved per ISO week since the window start
pub async fn defect_flow_by_week(
    pool: &PgPool,
    team_id: Option<i64>,
    since: DateTime<Utc>,
) -> Result<Vec<(String, i64, i64)>, PostgresError> {
    let rows: Vec<(String, i64, i64)> = sqlx::query_as(
        "SELECT week, SUM(created)::bigint, SUM(resolved)::bigint FROM ( \
             SELECT to_char(date_trunc('week', i.created_at), 'IYYY-IW') AS week, 1 AS created, 0 AS resolved \
             FROM issues i \
             WHERE i.issue_type = 'bug' AND i.created_at >= $2 \
               AND ($1::bigint IS NULL OR i.team_id = $1) \
             UNION ALL \
             SELECT to_char(date_trunc('week', i.resolved_at), 'IYYY-IW'), 0, 1 \
             FROM issues i \
             WHERE i.issue_type = 'bug' AND i.resolved_at IS NOT NULL AND i.resolved_at >= $2 \
               AND ($1::bigint IS NULL OR i.team_id = $1) \
         ) flow \
         GROUP BY week \
         ORDER BY week",
    )
    .bind(team_id)
    .bind(since)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Unresolved defect count (for the defect arrival meta block)
pub async fn count_open_defects(
    pool: &PgPool,
    team_id: Option<i64>,
) -> Result<i64, PostgresError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*)::bigint FROM issues i \
         WHERE i.issue_type = 'bug' AND i.status_category <> 'done' \
           AND ($1::bigint IS NULL OR i.team_id = $1)",
    )
    .bind(team_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Per-team open/WIP issue counts with recent average velocity
pub async fn team_summaries(pool: &PgPool) -> Result<Vec<(String, i64, i64, f64)>, PostgresError> {
    let rows: Vec<(String, i64, i64, f64)> = sqlx::query_as(
        "SELECT t.name, \
                COUNT(i.id) FILTER (WHERE i.status_category <> 'done')::bigint, \
                COUNT(i.id) FILTER (WHERE i.status_category = 'in_progress')::bigint, \
                COALESCE((SELECT AVG(recent.completed_points) FROM ( \
                    SELECT s.completed_points FROM sprints s \
                    WHERE s.team_id = t.id AND s.state = 'closed' \
                    ORDER BY s.start_date DESC NULLS LAST LIMIT 6 \
                ) recent), 0)::double precision \
         FROM teams t \
         LEFT JOIN issues i ON i.team_id = t.id \
         GROUP BY t.id, t.name \
         ORDER BY t.name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
