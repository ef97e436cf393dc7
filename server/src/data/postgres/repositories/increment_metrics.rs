//! Program increment metric queries backing the increment-area data sources

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::data::postgres::PostgresError;
use crate::data::types::IncrementRow;

/// Find a program increment by name
pub async fn find_increment_by_name(
    pool: &PgPool,
    name: &str,
) -> Result<Option<IncrementRow>, PostgresError> {
    let row: Option<(i64, String, Option<NaiveDate>, Option<NaiveDate>, String)> = sqlx::query_as(
        "SELECT id, name, start_date, end_date, status \
         FROM program_increments WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id, name, start_date, end_date, status)| IncrementRow {
        id,
        name,
        start_date,
        end_date,
        status,
    }))
}

/// Committed and completed points per sprint inside an increment, in sprint order
pub async fn burnup_by_sprint(
    pool: &PgPool,
    pi_id: i64,
    team_id: Option<i64>,
) -> Result<Vec<(String, f64, f64)>, PostgresError> {
    let rows: Vec<(String, f64, f64)> = sqlx::query_as(
        "SELECT s.name, \
                COALESCE(s.committed_points, 0)::double precision, \
                COALESCE(s.completed_points, 0)::double precision \
         FROM sprints s \
         WHERE s.pi_id = $1 \
           AND ($2::bigint IS NULL OR s.team_id = $2) \
         ORDER BY s.start_date ASC NULLS LAST, s.name",
    )
    .bind(pi_id)
    .bind(team_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Planned points, issues added after start, and delivered points per increment
///
/// An empty `names` slice selects every increment.
pub async fn scope_change_by_increment(
    pool: &PgPool,
    names: &[String],
) -> Result<Vec<(String, f64, i64, f64)>, PostgresError> {
    let rows: Vec<(String, f64, i64, f64)> = sqlx::query_as(
        "SELECT p.name, \
                COALESCE(SUM(s.committed_points), 0)::double precision, \
                (SELECT COUNT(*) FROM issues i \
                 WHERE i.pi_id = p.id AND p.start_date IS NOT NULL \
                   AND i.created_at::date > p.start_date)::bigint, \
                COALESCE(SUM(s.completed_points), 0)::double precision \
         FROM program_increments p \
         LEFT JOIN sprints s ON s.pi_id = p.id \
         WHERE cardinality($1::text[]) = 0 OR p.name = ANY($1::text[]) \
         GROUP BY p.id, p.name, p.start_date \
         ORDER BY p.start_date ASC NULLS LAST, p.name",
    )
    .bind(names)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Committed vs delivered points per increment, optionally scoped to a team
pub async fn predictability_by_increment(
    pool: &PgPool,
    names: &[String],
    team_id: Option<i64>,
) -> Result<Vec<(String, f64, f64)>, PostgresError> {
    let rows: Vec<(String, f64, f64)> = sqlx::query_as(
        "SELECT p.name, \
                COALESCE(SUM(s.committed_points), 0)::double precision, \
                COALESCE(SUM(s.completed_points), 0)::double precision \
         FROM program_increments p \
         LEFT JOIN sprints s ON s.pi_id = p.id \
            AND ($2::bigint IS NULL OR s.team_id = $2) \
         WHERE cardinality($1::text[]) = 0 OR p.name = ANY($1::text[]) \
         GROUP BY p.id, p.name, p.start_date \
         ORDER BY p.start_date ASC NULLS LAST, p.name",
    )
    .bind(names)
    .bind(team_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Issues closed per calendar quarter (labels like `2025-Q3`)
///
/// An empty `quarters` slice selects every quarter present in the data.
pub async fn closed_by_quarter(
    pool: &PgPool,
    team_id: Option<i64>,
    quarters: &[String],
) -> Result<Vec<(String, i64, f64)>, PostgresError> {
    let rows: Vec<(String, i64, f64)> = sqlx::query_as(
        "SELECT to_char(date_trunc('quarter', i.resolved_at), 'YYYY-\"Q\"Q'), \
                COUNT(*)::bigint, \
                COALESCE(SUM(i.story_points), 0)::double precision \
         FROM issues i \
         WHERE i.status_category = 'done' AND i.resolved_at IS NOT NULL \
           AND ($1::bigint IS NULL OR i.team_id = $1) \
           AND (cardinality($2::text[]) = 0 \
                OR to_char(date_trunc('quarter', i.resolved_at), 'YYYY-\"Q\"Q') = ANY($2::text[])) \
         GROUP BY 1 \
         ORDER BY 1",
    )
    .bind(team_id)
    .bind(quarters)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
