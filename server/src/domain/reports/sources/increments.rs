//! Program-increment data sources: burnup, scope change, predictability,
//! and quarterly delivery

use serde_json::json;
use sqlx::PgPool;

use super::{
    FetchError, FilterSet, ReportResult, optional_str, optional_team_id, round1, string_list,
};
use crate::data::postgres::repositories::increment_metrics;

/// Cumulative planned versus completed points per sprint of one increment
pub async fn pi_burnup(pool: &PgPool, filters: &FilterSet) -> Result<ReportResult, FetchError> {
    let pi_name = optional_str(filters, "pi")?
        .ok_or_else(|| FetchError::InvalidFilter("Filter 'pi' is required".to_string()))?;
    let increment = increment_metrics::find_increment_by_name(pool, pi_name)
        .await?
        .ok_or_else(|| {
            FetchError::InvalidFilter(format!("Unknown program increment '{pi_name}'"))
        })?;
    let team_id = optional_team_id(pool, filters).await?;

    let mut planned_cum = 0.0;
    let mut completed_cum = 0.0;
    let rows = increment_metrics::burnup_by_sprint(pool, increment.id, team_id)
        .await?
        .into_iter()
        .map(|(sprint, committed, completed)| {
            planned_cum += committed;
            completed_cum += completed;
            json!({
                "sprint": sprint,
                "planned_cum": round1(planned_cum),
                "completed_cum": round1(completed_cum),
            })
        })
        .collect();

    Ok(ReportResult {
        rows,
        meta: json!({
            "pi": increment.name,
            "start_date": increment.start_date.map(|d| d.to_string()),
            "end_date": increment.end_date.map(|d| d.to_string()),
            "status": increment.status,
        }),
    })
}

/// Planned points, issues added after start, and delivered points per
/// increment. An empty `pi_names` list covers every known increment.
pub async fn pi_scope_change(
    pool: &PgPool,
    filters: &FilterSet,
) -> Result<ReportResult, FetchError> {
    let names = string_list(filters, "pi_names")?;

    let changes = increment_metrics::scope_change_by_increment(pool, &names).await?;
    let pi_count = changes.len();
    let rows = changes
        .into_iter()
        .map(|(pi, planned, added, delivered)| {
            json!({
                "pi": pi,
                "planned": planned,
                "added": added,
                "delivered": delivered,
            })
        })
        .collect();

    Ok(ReportResult {
        rows,
        meta: json!({ "pi_count": pi_count }),
    })
}

/// Delivered-over-committed percentage per increment.
///
/// Increments with no committed points chart as zero and are excluded from
/// the average.
pub async fn pi_predictability(
    pool: &PgPool,
    filters: &FilterSet,
) -> Result<ReportResult, FetchError> {
    let names = string_list(filters, "pi_names")?;
    let team_id = optional_team_id(pool, filters).await?;

    let mut ratios = Vec::new();
    let rows = increment_metrics::predictability_by_increment(pool, &names, team_id)
        .await?
        .into_iter()
        .map(|(pi, committed, delivered)| {
            let predictability = if committed > 0.0 {
                let pct = round1(delivered / committed * 100.0);
                ratios.push(pct);
                pct
            } else {
                0.0
            };
            json!({
                "pi": pi,
                "committed": committed,
                "delivered": delivered,
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

/// Closed issue and point totals per calendar quarter.
///
/// Quarter labels use the `YYYY-Qn` form; an empty list covers every quarter
/// with closed work.
pub async fn quarterly_delivery(
    pool: &PgPool,
    filters: &FilterSet,
) -> Result<ReportResult, FetchError> {
    let quarters = string_list(filters, "quarters")?;
    for label in &quarters {
        if !valid_quarter_label(label) {
            return Err(FetchError::InvalidFilter(format!(
                "Invalid quarter '{label}', expected YYYY-Qn"
            )));
        }
    }
    let team_id = optional_team_id(pool, filters).await?;

    let closed = increment_metrics::closed_by_quarter(pool, team_id, &quarters).await?;
    let covered: Vec<String> = if quarters.is_empty() {
        closed.iter().map(|(quarter, _, _)| quarter.clone()).collect()
    } else {
        quarters
    };
    let rows = closed
        .into_iter()
        .map(|(quarter, issues_closed, points)| {
            json!({
                "quarter": quarter,
                "issues_closed": issues_closed,
                "points": points,
            })
        })
        .collect();

    Ok(ReportResult {
        rows,
        meta: json!({ "quarters": covered }),
    })
}

fn valid_quarter_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    bytes.len() == 7
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5] == b'Q'
        && matches!(bytes[6], b'1'..=b'4')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_quarter_labels() {
        for label in ["2024-Q1", "2025-Q2", "2025-Q3", "2026-Q4"] {
            assert!(valid_quarter_label(label), "{label} should be valid");
        }
    }

    #[test]
    fn test_invalid_quarter_labels() {
        for label in [
            "2025-Q5",
            "2025-Q0",
            "25-Q1",
            "2025Q1",
            "2025-q1",
            "2025-Q12",
            "Q1-2025",
            "",
        ] {
            assert!(!valid_quarter_label(label), "{label} should be rejected");
        }
    }
}
