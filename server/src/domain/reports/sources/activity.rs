//! Activity data sources: insight volume, recommendation pipeline, and
//! meeting transcript throughput

use serde_json::json;
use sqlx::PgPool;

use super::{FetchError, FilterSet, ReportResult, months_window, optional_team_id, string_list};
use crate::data::postgres::repositories::activity_metrics;

/// Generated insight counts per category and severity over the window
pub async fn insight_activity(
    pool: &PgPool,
    filters: &FilterSet,
) -> Result<ReportResult, FetchError> {
    let team_id = optional_team_id(pool, filters).await?;
    let categories = string_list(filters, "categories")?;
    let (since, _) = months_window(filters)?;

    let counts = activity_metrics::insight_counts(pool, team_id, since, &categories).await?;
    let total: i64 = counts.iter().map(|(_, _, count)| count).sum();
    let rows = counts
        .into_iter()
        .map(|(category, severity, count)| {
            json!({
                "category": category,
                "severity": severity,
                "count": count,
            })
        })
        .collect();

    Ok(ReportResult {
        rows,
        meta: json!({ "total": total }),
    })
}

/// Recommendation counts per pipeline status
pub async fn recommendation_status(
    pool: &PgPool,
    filters: &FilterSet,
) -> Result<ReportResult, FetchError> {
    let team_id = optional_team_id(pool, filters).await?;
    let statuses = string_list(filters, "statuses")?;

    let counts = activity_metrics::recommendation_counts(pool, team_id, &statuses).await?;
    let total: i64 = counts.iter().map(|(_, count)| count).sum();
    let rows = counts
        .into_iter()
        .map(|(status, count)| {
            json!({
                "status": status,
                "count": count,
            })
        })
        .collect();

    Ok(ReportResult {
        rows,
        meta: json!({ "total": total }),
    })
}

/// Meeting transcript counts per week and meeting type
pub async fn transcript_volume(
    pool: &PgPool,
    filters: &FilterSet,
) -> Result<ReportResult, FetchError> {
    let team_id = optional_team_id(pool, filters).await?;
    let meeting_types = string_list(filters, "meeting_types")?;
    let (since, _) = months_window(filters)?;

    let volume =
        activity_metrics::transcript_volume_by_week(pool, team_id, since, &meeting_types).await?;
    let total_meetings: i64 = volume.iter().map(|(_, _, count)| count).sum();
    let rows = volume
        .into_iter()
        .map(|(week, meeting_type, count)| {
            json!({
                "week": week,
                "meeting_type": meeting_type,
                "count": count,
            })
        })
        .collect();

    Ok(ReportResult {
        rows,
        meta: json!({ "total_meetings": total_meetings }),
    })
}
