//! Data source dispatch for report resolution
//!
//! Every report definition names a `data_source`, a key into the closed
//! [`DataSource`] set. Each source is one SQL query plus light
//! post-processing, grouped by area:
//! - `sprints` - burndown, progress, velocity, predictability
//! - `issues` - WIP, blockers, throughput, cycle time, defects, portfolio
//! - `increments` - PI burnup, scope change, predictability, quarters
//! - `activity` - insights, recommendations, transcripts
//!
//! The filter-extraction helpers here enforce each source's filter contract
//! and turn violations into [`FetchError::InvalidFilter`] (HTTP 400 at the
//! boundary).

mod activity;
mod increments;
mod issues;
mod sprints;

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use utoipa::ToSchema;

use super::filters::{FilterSet, FilterValue};
use crate::data::postgres::PostgresError;
use crate::data::postgres::repositories::teams;

// --- Data source set ---

/// The closed set of registered data sources.
///
/// Persisted definitions store the snake_case key; parsing happens once at
/// seed validation and once per resolution, never inside a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    SprintBurndown,
    SprintProgress,
    WipBreakdown,
    VelocityTrend,
    SprintPredictability,
    ActiveBlockers,
    ClosedIssueCounts,
    CycleTimePercentiles,
    IssueTypeDistribution,
    DefectArrival,
    PiBurnup,
    PiScopeChange,
    PiPredictability,
    QuarterlyDelivery,
    TeamSummary,
    InsightActivity,
    RecommendationStatus,
    TranscriptVolume,
}

impl DataSource {
    /// Every registered data source, used for seed validation and tests.
    pub const ALL: [DataSource; 18] = [
        DataSource::SprintBurndown,
        DataSource::SprintProgress,
        DataSource::WipBreakdown,
        DataSource::VelocityTrend,
        DataSource::SprintPredictability,
        DataSource::ActiveBlockers,
        DataSource::ClosedIssueCounts,
        DataSource::CycleTimePercentiles,
        DataSource::IssueTypeDistribution,
        DataSource::DefectArrival,
        DataSource::PiBurnup,
        DataSource::PiScopeChange,
        DataSource::PiPredictability,
        DataSource::QuarterlyDelivery,
        DataSource::TeamSummary,
        DataSource::InsightActivity,
        DataSource::RecommendationStatus,
        DataSource::TranscriptVolume,
    ];

    /// Parse a persisted `data_source` key
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "sprint_burndown" => Some(Self::SprintBurndown),
            "sprint_progress" => Some(Self::SprintProgress),
            "wip_breakdown" => Some(Self::WipBreakdown),
            "velocity_trend" => Some(Self::VelocityTrend),
            "sprint_predictability" => Some(Self::SprintPredictability),
            "active_blockers" => Some(Self::ActiveBlockers),
            "closed_issue_counts" => Some(Self::ClosedIssueCounts),
            "cycle_time_percentiles" => Some(Self::CycleTimePercentiles),
            "issue_type_distribution" => Some(Self::IssueTypeDistribution),
            "defect_arrival" => Some(Self::DefectArrival),
            "pi_burnup" => Some(Self::PiBurnup),
            "pi_scope_change" => Some(Self::PiScopeChange),
            "pi_predictability" => Some(Self::PiPredictability),
            "quarterly_delivery" => Some(Self::QuarterlyDelivery),
            "team_summary" => Some(Self::TeamSummary),
            "insight_activity" => Some(Self::InsightActivity),
            "recommendation_status" => Some(Self::RecommendationStatus),
            "transcript_volume" => Some(Self::TranscriptVolume),
            _ => None,
        }
    }

    /// The persisted key for this data source
    pub fn key(self) -> &'static str {
        match self {
            Self::SprintBurndown => "sprint_burndown",
            Self::SprintProgress => "sprint_progress",
            Self::WipBreakdown => "wip_breakdown",
            Self::VelocityTrend => "velocity_trend",
            Self::SprintPredictability => "sprint_predictability",
            Self::ActiveBlockers => "active_blockers",
            Self::ClosedIssueCounts => "closed_issue_counts",
            Self::CycleTimePercentiles => "cycle_time_percentiles",
            Self::IssueTypeDistribution => "issue_type_distribution",
            Self::DefectArrival => "defect_arrival",
            Self::PiBurnup => "pi_burnup",
            Self::PiScopeChange => "pi_scope_change",
            Self::PiPredictability => "pi_predictability",
            Self::QuarterlyDelivery => "quarterly_delivery",
            Self::TeamSummary => "team_summary",
            Self::InsightActivity => "insight_activity",
            Self::RecommendationStatus => "recommendation_status",
            Self::TranscriptVolume => "transcript_volume",
        }
    }
}

// --- Fetch contract ---

/// Rows plus derived metadata returned by every fetch adapter
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResult {
    /// Flat row objects, one per chart point
    pub rows: Vec<Value>,
    /// Derived facts about the result (date windows, totals, context)
    pub meta: Value,
}

#[derive(Error, Debug)]
pub enum FetchError {
    /// User-correctable: a filter value the source cannot satisfy (HTTP 400)
    #[error("{0}")]
    InvalidFilter(String),

    /// Registry names a source with no fetch implementation, a deployment
    /// defect rather than user error (HTTP 500)
    #[error("No fetch function registered for data source '{0}'")]
    UnsupportedSource(String),

    #[error(transparent)]
    Database(#[from] PostgresError),
}

/// Dispatch a resolved filter set to the named data source
pub async fn fetch(
    pool: &PgPool,
    source: DataSource,
    filters: &FilterSet,
) -> Result<ReportResult, FetchError> {
    match source {
        DataSource::SprintBurndown => sprints::sprint_burndown(pool, filters).await,
        DataSource::SprintProgress => sprints::sprint_progress(pool, filters).await,
        DataSource::VelocityTrend => sprints::velocity_trend(pool, filters).await,
        DataSource::SprintPredictability => sprints::sprint_predictability(pool, filters).await,
        DataSource::WipBreakdown => issues::wip_breakdown(pool, filters).await,
        DataSource::ActiveBlockers => issues::active_blockers(pool, filters).await,
        DataSource::ClosedIssueCounts => issues::closed_issue_counts(pool, filters).await,
        DataSource::CycleTimePercentiles => issues::cycle_time_percentiles(pool, filters).await,
        DataSource::IssueTypeDistribution => issues::issue_type_distribution(pool, filters).await,
        DataSource::DefectArrival => issues::defect_arrival(pool, filters).await,
        DataSource::TeamSummary => issues::team_summary(pool, filters).await,
        DataSource::PiBurnup => increments::pi_burnup(pool, filters).await,
        DataSource::PiScopeChange => increments::pi_scope_change(pool, filters).await,
        DataSource::PiPredictability => increments::pi_predictability(pool, filters).await,
        DataSource::QuarterlyDelivery => increments::quarterly_delivery(pool, filters).await,
        DataSource::InsightActivity => activity::insight_activity(pool, filters).await,
        DataSource::RecommendationStatus => activity::recommendation_status(pool, filters).await,
        DataSource::TranscriptVolume => activity::transcript_volume(pool, filters).await,
    }
}

// --- Filter extraction helpers ---

/// Non-empty string filter, or `None` when absent/null/blank
pub fn optional_str<'a>(filters: &'a FilterSet, name: &str) -> Result<Option<&'a str>, FetchError> {
    match filters.get(name) {
        None | Some(FilterValue::Null) => Ok(None),
        Some(FilterValue::Str(s)) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then_some(trimmed))
        }
        Some(_) => Err(FetchError::InvalidFilter(format!(
            "Filter '{name}' must be a string"
        ))),
    }
}

/// The `issue_type` filter, with the `"all"` sentinel meaning unfiltered
pub fn optional_issue_type(filters: &FilterSet) -> Result<Option<&str>, FetchError> {
    Ok(optional_str(filters, "issue_type")?.filter(|t| !t.eq_ignore_ascii_case("all")))
}

/// Positive integer filter, accepting a JSON number or a numeric string
pub fn optional_count(filters: &FilterSet, name: &str, default: i64) -> Result<i64, FetchError> {
    let value = match filters.get(name) {
        None | Some(FilterValue::Null) => return Ok(default),
        Some(FilterValue::Number(n)) => n.as_i64(),
        Some(FilterValue::Str(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };
    match value {
        Some(n) if n > 0 => Ok(n),
        _ => Err(FetchError::InvalidFilter(format!(
            "Filter '{name}' must be a positive integer"
        ))),
    }
}

/// List filter: a `List` as-is, a single string as a one-element list,
/// absent/null as empty
pub fn string_list(filters: &FilterSet, name: &str) -> Result<Vec<String>, FetchError> {
    match filters.get(name) {
        None | Some(FilterValue::Null) => Ok(vec![]),
        Some(FilterValue::List(items)) => Ok(items.clone()),
        Some(FilterValue::Str(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(vec![])
            } else {
                Ok(vec![trimmed.to_string()])
            }
        }
        Some(_) => Err(FetchError::InvalidFilter(format!(
            "Filter '{name}' must be a list of strings"
        ))),
    }
}

/// Resolve `team_name` to a team id when present; unknown teams are a
/// user error, not an empty result
pub async fn optional_team_id(
    pool: &PgPool,
    filters: &FilterSet,
) -> Result<Option<i64>, FetchError> {
    let Some(name) = optional_str(filters, "team_name")? else {
        return Ok(None);
    };
    match teams::find_team_id(pool, name).await? {
        Some(id) => Ok(Some(id)),
        None => Err(FetchError::InvalidFilter(format!("Unknown team '{name}'"))),
    }
}

/// Resolve `team_name` to a team id, required
pub async fn require_team_id(pool: &PgPool, filters: &FilterSet) -> Result<i64, FetchError> {
    match optional_team_id(pool, filters).await? {
        Some(id) => Ok(id),
        None => Err(FetchError::InvalidFilter(
            "Filter 'team_name' is required".to_string(),
        )),
    }
}

/// Time window reaching back `months` (default 6) from now
pub fn months_window(filters: &FilterSet) -> Result<(DateTime<Utc>, DateTime<Utc>), FetchError> {
    let months = optional_count(filters, "months", 6)?;
    let now = Utc::now();
    let since = u32::try_from(months)
        .ok()
        .and_then(|m| now.checked_sub_months(Months::new(m)))
        .ok_or_else(|| {
            FetchError::InvalidFilter("Filter 'months' is out of range".to_string())
        })?;
    Ok((since, now))
}

/// Round to one decimal place for human-facing derived values
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filters(value: serde_json::Value) -> FilterSet {
        crate::domain::reports::filters::filter_set_from_json(&value).unwrap()
    }

    #[test]
    fn test_data_source_key_round_trip() {
        for source in DataSource::ALL {
            assert_eq!(DataSource::from_key(source.key()), Some(source));
        }
    }

    #[test]
    fn test_data_source_keys_are_distinct() {
        let mut keys: Vec<&str> = DataSource::ALL.iter().map(|s| s.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), DataSource::ALL.len());
    }

    #[test]
    fn test_from_key_unknown() {
        assert_eq!(DataSource::from_key("made_up"), None);
        assert_eq!(DataSource::from_key(""), None);
        // Keys are exact, not case-insensitive.
        assert_eq!(DataSource::from_key("Sprint_Burndown"), None);
    }

    #[test]
    fn test_optional_str() {
        let f = filters(json!({"team_name": " Phoenix ", "sprint_name": null, "blank": "  "}));
        assert_eq!(optional_str(&f, "team_name").unwrap(), Some("Phoenix"));
        assert_eq!(optional_str(&f, "sprint_name").unwrap(), None);
        assert_eq!(optional_str(&f, "blank").unwrap(), None);
        assert_eq!(optional_str(&f, "absent").unwrap(), None);
    }

    #[test]
    fn test_optional_str_rejects_wrong_type() {
        let f = filters(json!({"team_name": 3}));
        assert!(matches!(
            optional_str(&f, "team_name"),
            Err(FetchError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_optional_issue_type_all_sentinel() {
        let f = filters(json!({"issue_type": "all"}));
        assert_eq!(optional_issue_type(&f).unwrap(), None);

        let f = filters(json!({"issue_type": "bug"}));
        assert_eq!(optional_issue_type(&f).unwrap(), Some("bug"));
    }

    #[test]
    fn test_optional_count() {
        let f = filters(json!({"months": 12, "sprints": "3", "zero": 0, "bad": "many"}));
        assert_eq!(optional_count(&f, "months", 6).unwrap(), 12);
        assert_eq!(optional_count(&f, "sprints", 6).unwrap(), 3);
        assert_eq!(optional_count(&f, "absent", 6).unwrap(), 6);
        assert!(matches!(
            optional_count(&f, "zero", 6),
            Err(FetchError::InvalidFilter(_))
        ));
        assert!(matches!(
            optional_count(&f, "bad", 6),
            Err(FetchError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_string_list() {
        let f = filters(json!({
            "quarters": ["2025-Q1", "2025-Q2"],
            "single": "open",
            "empty": null
        }));
        assert_eq!(
            string_list(&f, "quarters").unwrap(),
            vec!["2025-Q1".to_string(), "2025-Q2".to_string()]
        );
        assert_eq!(string_list(&f, "single").unwrap(), vec!["open".to_string()]);
        assert!(string_list(&f, "empty").unwrap().is_empty());
        assert!(string_list(&f, "absent").unwrap().is_empty());

        let f = filters(json!({"quarters": 4}));
        assert!(matches!(
            string_list(&f, "quarters"),
            Err(FetchError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_months_window() {
        let f = filters(json!({"months": 6}));
        let (since, now) = months_window(&f).unwrap();
        let days = (now - since).num_days();
        // 6 calendar months, whatever their lengths
        assert!((150..=190).contains(&days), "window was {days} days");
    }

    #[test]
    fn test_months_window_rejects_nonsense() {
        let f = filters(json!({"months": -3}));
        assert!(matches!(
            months_window(&f),
            Err(FetchError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(3.14159), 3.1);
        assert_eq!(round1(2.55), 2.6);
        assert_eq!(round1(0.0), 0.0);
    }

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::InvalidFilter("Unknown team 'X'".to_string());
        assert_eq!(err.to_string(), "Unknown team 'X'");

        let err = FetchError::UnsupportedSource("legacy_source".to_string());
        assert!(err.to_string().contains("legacy_source"));
    }
}
