//! Issue-scoped data sources: WIP, blockers, throughput, cycle time,
//! defects, and the cross-team portfolio summary

use serde_json::json;
use sqlx::PgPool;

use super::{
    FetchError, FilterSet, ReportResult, months_window, optional_issue_type, optional_str,
    optional_team_id, round1,
};
use crate::data::postgres::repositories::issue_metrics;

/// Work-in-progress issue and point counts per status
pub async fn wip_breakdown(pool: &PgPool, filters: &FilterSet) -> Result<ReportResult, FetchError> {
    let team_id = optional_team_id(pool, filters).await?;
    let issue_type = optional_issue_type(filters)?;

    let breakdown = issue_metrics::wip_by_status(pool, team_id, issue_type).await?;
    let total_wip: i64 = breakdown.iter().map(|(_, issues, _)| issues).sum();
    let rows = breakdown
        .into_iter()
        .map(|(status, issues, points)| {
            json!({
                "status": status,
                "issues": issues,
                "points": points,
            })
        })
        .collect();

    Ok(ReportResult {
        rows,
        meta: json!({ "total_wip": total_wip }),
    })
}

/// Open flagged issues, longest-blocked first
pub async fn active_blockers(
    pool: &PgPool,
    filters: &FilterSet,
) -> Result<ReportResult, FetchError> {
    let team_id = optional_team_id(pool, filters).await?;
    let priority = optional_str(filters, "priority")?;

    let blockers = issue_metrics::list_active_blockers(pool, team_id, priority).await?;
    let count = blockers.len();
    let rows = blockers
        .into_iter()
        .map(|(issue_key, summary, status, days_open)| {
            json!({
                "issue_key": issue_key,
                "summary": summary,
                "status": status,
                "days_open": round1(days_open),
            })
        })
        .collect();

    Ok(ReportResult {
        rows,
        meta: json!({ "count": count }),
    })
}

/// Closed issue and point totals per calendar month
pub async fn closed_issue_counts(
    pool: &PgPool,
    filters: &FilterSet,
) -> Result<ReportResult, FetchError> {
    let team_id = optional_team_id(pool, filters).await?;
    let issue_type = optional_issue_type(filters)?;
    let (since, now) = months_window(filters)?;

    let rows = issue_metrics::closed_counts_by_month(pool, team_id, since, issue_type)
        .await?
        .into_iter()
        .map(|(month, issues, points)| {
            json!({
                "month": month,
                "issues": issues,
                "points": points,
            })
        })
        .collect();

    Ok(ReportResult {
        rows,
        meta: json!({
            "start_date": since.date_naive().to_string(),
            "end_date": now.date_naive().to_string(),
        }),
    })
}

/// Cycle time percentiles (p50/p85/p95, in days) per issue type
pub async fn cycle_time_percentiles(
    pool: &PgPool,
    filters: &FilterSet,
) -> Result<ReportResult, FetchError> {
    let team_id = optional_team_id(pool, filters).await?;
    let issue_type = optional_issue_type(filters)?;
    let (since, now) = months_window(filters)?;

    let rows = issue_metrics::cycle_time_percentiles(pool, team_id, since, issue_type)
        .await?
        .into_iter()
        .map(|(issue_type, p50, p85, p95, sample)| {
            json!({
                "issue_type": issue_type,
                "p50_days": round1(p50),
                "p85_days": round1(p85),
                "p95_days": round1(p95),
                "sample": sample,
            })
        })
        .collect();

    Ok(ReportResult {
        rows,
        meta: json!({
            "start_date": since.date_naive().to_string(),
            "end_date": now.date_naive().to_string(),
        }),
    })
}

/// Share of closed issues per issue type over the window
pub async fn issue_type_distribution(
    pool: &PgPool,
    filters: &FilterSet,
) -> Result<ReportResult, FetchError> {
    let team_id = optional_team_id(pool, filters).await?;
    let (since, _) = months_window(filters)?;

    let counts = issue_metrics::issue_type_counts(pool, team_id, since).await?;
    let total: i64 = counts.iter().map(|(_, issues)| issues).sum();
    let rows = counts
        .into_iter()
        .map(|(issue_type, issues)| {
            let share = if total > 0 {
                round1(issues as f64 / total as f64 * 100.0)
            } else {
                0.0
            };
            json!({
                "issue_type": issue_type,
                "issues": issues,
                "share": share,
            })
        })
        .collect();

    Ok(ReportResult {
        rows,
        meta: json!({ "total": total }),
    })
}

/// Defects created versus resolved per week, with the current open backlog
pub async fn defect_arrival(
    pool: &PgPool,
    filters: &FilterSet,
) -> Result<ReportResult, FetchError> {
    let team_id = optional_team_id(pool, filters).await?;
    let (since, _) = months_window(filters)?;

    let rows = issue_metrics::defect_flow_by_week(pool, team_id, since)
        .await?
        .into_iter()
        .map(|(week, created, resolved)| {
            json!({
                "week": week,
                "created": created,
                "resolved": resolved,
            })
        })
        .collect();
    let open_defects = issue_metrics::count_open_defects(pool, team_id).await?;

    Ok(ReportResult {
        rows,
        meta: json!({ "open_defects": open_defects }),
    })
}

/// One row per team: open issues, WIP, and recent average velocity
pub async fn team_summary(pool: &PgPool, _filters: &FilterSet) -> Result<ReportResult, FetchError> {
    let summaries = issue_metrics::team_summaries(pool).await?;
    let team_count = summaries.len();
    let rows = summaries
        .into_iter()
        .map(|(team, open_issues, wip, avg_velocity)| {
            json!({
                "team": team,
                "open_issues": open_issues,
                "wip": wip,
                "avg_velocity": round1(avg_velocity),
            })
        })
        .collect();

    Ok(ReportResult {
        rows,
        meta: json!({ "team_count": team_count }),
    })
}
