//! Sprint metric queries backing the sprint-area data sources

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::data::postgres::PostgresError;
use crate::data::types::SprintRow;

type SprintTuple = (
    i64,
    String,
    Option<NaiveDate>,
    Option<NaiveDate>,
    String,
    Option<f64>,
    Option<f64>,
);

fn sprint_from_tuple(tuple: SprintTuple) -> SprintRow {
    let (id, name, start_date, end_date, state, committed_points, completed_points) = tuple;
    SprintRow {
        id,
        name,
        start_date,
        end_date,
        state,
        committed_points,
        completed_points,
    }
}

/// Find the team's active sprint (latest start date wins if several overlap)
pub async fn find_active_sprint(
    pool: &PgPool,
    team_id: i64,
) -> Result<Option<SprintRow>, PostgresError> {
    let row: Option<SprintTuple> = sqlx::query_as(
        "SELECT id, name, start_date, end_date, state, committed_points, completed_points \
         FROM sprints WHERE team_id = $1 AND state = 'active' \
         ORDER BY start_date DESC NULLS LAST LIMIT 1",
    )
    .bind(team_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(sprint_from_tuple))
}

/// Find a sprint by name within a team
pub async fn find_sprint_by_name(
    pool: &PgPool,
    team_id: i64,
    name: &str,
) -> Result<Option<SprintRow>, PostgresError> {
    let row: Option<SprintTuple> = sqlx::query_as(
        "SELECT id, name, start_date, end_date, state, committed_points, completed_points \
         FROM sprints WHERE team_id = $1 AND name = $2",
    )
    .bind(team_id)
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(sprint_from_tuple))
}

/// Remaining story points at the end of each day across the sprint window
///
/// An issue stops counting as remaining on the day it is resolved.
pub async fn burndown_remaining_by_day(
    pool: &PgPool,
    sprint_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    issue_type: Option<&str>,
) -> Result<Vec<(NaiveDate, f64)>, PostgresError> {
    let rows: Vec<(NaiveDate, f64)> = sqlx::query_as(
        "SELECT d::date, \
                COALESCE(SUM(i.story_points) FILTER ( \
                    WHERE i.resolved_at IS NULL OR i.resolved_at::date > d::date \
                ), 0)::double precision \
         FROM generate_series($2::date, $3::date, interval '1 day') AS d \
         LEFT JOIN issues i \
             ON i.sprint_id = $1 \
            AND ($4::text IS NULL OR i.issue_type = $4) \
         GROUP BY d::date \
         ORDER BY d::date",
    )
    .bind(sprint_id)
    .bind(start)
    .bind(end)
    .bind(issue_type)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Issue counts and points per status category for a sprint
pub async fn progress_by_status(
    pool: &PgPool,
    sprint_id: i64,
) -> Result<Vec<(String, i64, f64)>, PostgresError> {
    let rows: Vec<(String, i64, f64)> = sqlx::query_as(
        "SELECT i.status_category, COUNT(*)::bigint, \
                COALESCE(SUM(i.story_points), 0)::double precision \
         FROM issues i WHERE i.sprint_id = $1 \
         GROUP BY i.status_category \
         ORDER BY i.status_category",
    )
    .bind(sprint_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Most recently closed sprints for a team, oldest first
pub async fn recent_closed_sprints(
    pool: &PgPool,
    team_id: i64,
    count: i64,
) -> Result<Vec<SprintRow>, PostgresError> {
    let rows: Vec<SprintTuple> = sqlx::query_as(
        "SELECT id, name, start_date, end_date, state, committed_points, completed_points \
         FROM ( \
             SELECT id, name, start_date, end_date, state, committed_points, completed_points \
             FROM sprints WHERE team_id = $1 AND state = 'closed' \
             ORDER BY start_date DESC NULLS LAST LIMIT $2 \
         ) recent \
         ORDER BY start_date ASC NULLS FIRST",
    )
    .bind(team_id)
    .bind(count)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(sprint_from_tuple).collect())
}
