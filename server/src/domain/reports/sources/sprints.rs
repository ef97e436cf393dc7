//! Sprint-scoped data sources: burndown, progress, velocity, predictability

use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;

use super::{
    FetchError, FilterSet, ReportResult, optional_count, optional_issue_type, optional_str,
    require_team_id, round1,
};
use crate::data::postgres::repositories::sprint_metrics;

/// Remaining points per day against an ideal line from committed to zero.
///
/// Targets the named sprint when `sprint_name` is set, otherwise the team's
/// active sprint.
pub async fn sprint_burndown(
    pool: &PgPool,
    filters: &FilterSet,
) -> Result<ReportResult, FetchError> {
    let team_id = require_team_id(pool, filters).await?;
    let team = optional_str(filters, "team_name")?.unwrap_or_default().to_string();

    let sprint = match optional_str(filters, "sprint_name")? {
        Some(name) => sprint_metrics::find_sprint_by_name(pool, team_id, name)
            .await?
            .ok_or_else(|| {
                FetchError::InvalidFilter(format!("Unknown sprint '{name}' for team '{team}'"))
            })?,
        None => sprint_metrics::find_active_sprint(pool, team_id)
            .await?
            .ok_or_else(|| {
                FetchError::InvalidFilter(format!("No active sprint for team '{team}'"))
            })?,
    };

    let (start, end) = match (sprint.start_date, sprint.end_date) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(FetchError::InvalidFilter(format!(
                "Sprint '{}' has no scheduled window",
                sprint.name
            )));
        }
    };

    let issue_type = optional_issue_type(filters)?;
    let committed = sprint.committed_points.unwrap_or(0.0);
    let points = sprint_metrics::burndown_remaining_by_day(pool, sprint.id, start, end, issue_type)
        .await?;

    // Ideal line: committed on day one, zero on the last day.
    let denom = points.len().saturating_sub(1).max(1) as f64;
    let rows = points
        .iter()
        .enumerate()
        .map(|(i, (day, remaining))| {
            json!({
                "day": day.to_string(),
                "remaining_points": remaining,
                "ideal_points": round1(committed * (1.0 - i as f64 / denom)),
            })
        })
        .collect();

    Ok(ReportResult {
        rows,
        meta: json!({
            "sprint": sprint.name,
            "start_date": start.to_string(),
            "end_date": end.to_string(),
            "committed_points": committed,
        }),
    })
}

/// Issue and point counts per status category for the team's active sprint
pub async fn sprint_progress(
    pool: &PgPool,
    filters: &FilterSet,
) -> Result<ReportResult, FetchError> {
    let team_id = require_team_id(pool, filters).await?;
    let team = optional_str(filters, "team_name")?.unwrap_or_default().to_string();

    let sprint = sprint_metrics::find_active_sprint(pool, team_id)
        .await?
        .ok_or_else(|| FetchError::InvalidFilter(format!("No active sprint for team '{team}'")))?;

    let rows = sprint_metrics::progress_by_status(pool, sprint.id)
        .await?
        .into_iter()
        .map(|(status, issues, points)| {
            json!({
                "status_category": status,
                "issues": issues,
                "points": points,
            })
        })
        .collect();

    let today = Utc::now().date_naive();
    let days_remaining = sprint.end_date.map(|end| (end - today).num_days().max(0));

    Ok(ReportResult {
        rows,
        meta: json!({
            "sprint": sprint.name,
            "days_remaining": days_remaining,
        }),
    })
}

/// Committed versus completed points across the most recent closed sprints
pub async fn velocity_trend(
    pool: &PgPool,
    filters: &FilterSet,
) -> Result<ReportResult, FetchError> {
    let team_id = require_team_id(pool, filters).await?;
    let count = optional_count(filters, "sprints", 6)?;

    let sprints = sprint_metrics::recent_closed_sprints(pool, team_id, count).await?;
    let rows: Vec<_> = sprints
        .iter()
        .map(|s| {
            json!({
                "sprint": s.name,
                "committed": s.committed_points.unwrap_or(0.0),
                "completed": s.completed_points.unwrap_or(0.0),
            })
        })
        .collect();

    let avg_velocity = if sprints.is_empty() {
        0.0
    } else {
        round1(
            sprints
                .iter()
                .map(|s| s.completed_points.unwrap_or(0.0))
                .sum::<f64>()
                / sprints.len() as f64,
        )
    };

    Ok(ReportResult {
        rows,
        meta: json!({
            "avg_velocity": avg_velocity,
            "sprint_count": sprints.len(),
        }),
    })
}

/// Completed-over-committed percentage per closed sprint.
///
/// Sprints with no committed points chart as zero and are excluded from the
/// average.
pub async fn sprint_predictability(
    pool: &PgPool,
    filters: &FilterSet,
) -> Result<ReportResult, FetchError> {
    let team_id = require_team_id(pool, filters).await?;
    let count = optional_count(filters, "sprints", 6)?;

    let sprints = sprint_metrics::recent_closed_sprints(pool, team_id, count).await?;
    let mut ratios = Vec::new();
    let rows = sprints
        .iter()
        .map(|s| {
            let committed = s.committed_points.unwrap_or(0.0);
            let completed = s.completed_points.unwrap_or(0.0);
            let predictability = if committed > 0.0 {
                let pct = round1(completed / committed * 100.0);
                ratios.push(pct);
                pct
            } else {
                0.0
            };
            json!({
                "sprint": s.name,
                "predictability": predictability,
            })
        })
        .collect();

    let avg_predictability = if ratios.is_empty() {
        0.0
    } else {
        round1(ratios.iter().sum::<f64>() / ratios.len() as f64)
    };

    Ok(ReportResult {
        rows,
        meta: json!({ "avg_predictability": avg_predictability }),
    })
}
