//! Built-in report catalog
//!
//! The catalog ships with the binary and is reconciled into the
//! `report_definitions` table at startup, so a fresh database serves every
//! report immediately and upgrades pick up definition changes without a
//! migration. Reconciliation then validates the whole registry: a definition
//! naming a data source this build cannot serve fails startup instead of
//! failing the first request.

use serde_json::{Value, json};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use super::sources::DataSource;
use crate::data::postgres::PostgresError;
use crate::data::postgres::repositories::report_definitions::{self, ReportDefinitionSeed};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Report '{report_id}' names unknown data source '{data_source}'")]
    UnknownSource {
        report_id: String,
        data_source: String,
    },

    #[error(transparent)]
    Database(#[from] PostgresError),
}

/// Reconcile the built-in catalog into the database, then validate that every
/// registered definition (seeded or pre-existing) names a servable source
pub async fn seed_catalog(pool: &PgPool) -> Result<u64, CatalogError> {
    let seeds = builtin_definitions();
    let written = report_definitions::upsert_definitions(pool, &seeds).await?;

    // Covers rows left behind by older deployments, not just this build's
    // seeds.
    for definition in report_definitions::list_definitions(pool).await? {
        if DataSource::from_key(&definition.data_source).is_none() {
            return Err(CatalogError::UnknownSource {
                report_id: definition.report_id,
                data_source: definition.data_source,
            });
        }
    }

    info!(definitions = seeds.len(), written, "Report catalog reconciled");
    Ok(written)
}

// --- Built-in definitions ---

fn def(
    report_id: &str,
    report_name: &str,
    chart_type: &str,
    data_source: DataSource,
    description: &str,
    default_filters: Value,
    meta_schema: Value,
) -> ReportDefinitionSeed {
    ReportDefinitionSeed {
        report_id: report_id.to_string(),
        report_name: report_name.to_string(),
        chart_type: chart_type.to_string(),
        data_source: data_source.key().to_string(),
        description: Some(description.to_string()),
        default_filters,
        meta_schema,
    }
}

/// The definitions this build ships with
pub fn builtin_definitions() -> Vec<ReportDefinitionSeed> {
    vec![
        def(
            "team-sprint-burndown",
            "Sprint Burndown",
            "line",
            DataSource::SprintBurndown,
            "Remaining points per day of a sprint against the ideal line",
            json!({"team_name": null, "issue_type": "all", "sprint_name": null}),
            json!({
                "required_filters": ["team_name"],
                "optional_filters": ["sprint_name", "issue_type"],
                "parameters": {
                    "team_name": {"type": "string", "description": "Team the sprint belongs to"},
                    "sprint_name": {"type": "string", "description": "Sprint to chart, defaults to the active sprint"},
                    "issue_type": {"type": "string", "description": "Issue type filter, 'all' for every type"}
                },
                "allowed_views": ["team", "sprint"]
            }),
        ),
        def(
            "current-sprint-progress",
            "Current Sprint Progress",
            "stacked_bar",
            DataSource::SprintProgress,
            "Issue and point counts per status category for the active sprint",
            json!({"team_name": null}),
            json!({
                "required_filters": ["team_name"],
                "optional_filters": [],
                "parameters": {
                    "team_name": {"type": "string", "description": "Team whose active sprint to report"}
                },
                "allowed_views": ["team", "sprint"]
            }),
        ),
        def(
            "team-wip-breakdown",
            "WIP Breakdown",
            "bar",
            DataSource::WipBreakdown,
            "Work in progress per status, optionally scoped to one team",
            json!({"team_name": null, "issue_type": "all"}),
            json!({
                "required_filters": [],
                "optional_filters": ["team_name", "issue_type"],
                "parameters": {
                    "team_name": {"type": "string", "description": "Team to scope the breakdown to"},
                    "issue_type": {"type": "string", "description": "Issue type filter, 'all' for every type"}
                },
                "allowed_views": ["team", "portfolio"]
            }),
        ),
        def(
            "team-velocity-trend",
            "Velocity Trend",
            "bar",
            DataSource::VelocityTrend,
            "Committed versus completed points across recent closed sprints",
            json!({"team_name": null, "sprints": 6}),
            json!({
                "required_filters": ["team_name"],
                "optional_filters": ["sprints"],
                "parameters": {
                    "team_name": {"type": "string", "description": "Team the velocity belongs to"},
                    "sprints": {"type": "integer", "description": "How many recent closed sprints to include"}
                },
                "allowed_views": ["team"]
            }),
        ),
        def(
            "sprint-predictability",
            "Sprint Predictability",
            "line",
            DataSource::SprintPredictability,
            "Completed-over-committed percentage per closed sprint",
            json!({"team_name": null, "sprints": 6}),
            json!({
                "required_filters": ["team_name"],
                "optional_filters": ["sprints"],
                "parameters": {
                    "team_name": {"type": "string", "description": "Team the sprints belong to"},
                    "sprints": {"type": "integer", "description": "How many recent closed sprints to include"}
                },
                "allowed_views": ["team"]
            }),
        ),
        def(
            "active-blockers",
            "Active Blockers",
            "table",
            DataSource::ActiveBlockers,
            "Open flagged issues, longest-blocked first",
            json!({"team_name": null, "priority": null}),
            json!({
                "required_filters": [],
                "optional_filters": ["team_name", "priority"],
                "parameters": {
                    "team_name": {"type": "string", "description": "Team to scope the blockers to"},
                    "priority": {"type": "string", "description": "Priority to filter blockers by"}
                },
                "allowed_views": ["team", "portfolio"]
            }),
        ),
        def(
            "closed-issues-by-month",
            "Closed Issues by Month",
            "bar",
            DataSource::ClosedIssueCounts,
            "Closed issue and point totals per calendar month",
            json!({"team_name": null, "months": 6, "issue_type": "all"}),
            json!({
                "required_filters": [],
                "optional_filters": ["team_name", "months", "issue_type"],
                "parameters": {
                    "team_name": {"type": "string", "description": "Team to scope the totals to"},
                    "months": {"type": "integer", "description": "How many months of history to include"},
                    "issue_type": {"type": "string", "description": "Issue type filter, 'all' for every type"}
                },
                "allowed_views": ["team", "portfolio"]
            }),
        ),
        def(
            "historical-cycle-time",
            "Historical Cycle Time",
            "table",
            DataSource::CycleTimePercentiles,
            "Cycle time percentiles in days per issue type",
            json!({"team_name": null, "months": 6, "issue_type": "all"}),
            json!({
                "required_filters": [],
                "optional_filters": ["team_name", "months", "issue_type"],
                "parameters": {
                    "team_name": {"type": "string", "description": "Team to scope the sample to"},
                    "months": {"type": "integer", "description": "How many months of history to include"},
                    "issue_type": {"type": "string", "description": "Issue type filter, 'all' for every type"}
                },
                "allowed_views": ["team", "portfolio"]
            }),
        ),
        def(
            "issue-type-distribution",
            "Issue Type Distribution",
            "pie",
            DataSource::IssueTypeDistribution,
            "Share of closed issues per issue type",
            json!({"team_name": null, "months": 6}),
            json!({
                "required_filters": [],
                "optional_filters": ["team_name", "months"],
                "parameters": {
                    "team_name": {"type": "string", "description": "Team to scope the distribution to"},
                    "months": {"type": "integer", "description": "How many months of history to include"}
                },
                "allowed_views": ["team", "portfolio"]
            }),
        ),
        def(
            "defect-arrival-trend",
            "Defect Arrival Trend",
            "line",
            DataSource::DefectArrival,
            "Defects created versus resolved per week",
            json!({"team_name": null, "months": 3}),
            json!({
                "required_filters": [],
                "optional_filters": ["team_name", "months"],
                "parameters": {
                    "team_name": {"type": "string", "description": "Team to scope the defects to"},
                    "months": {"type": "integer", "description": "How many months of history to include"}
                },
                "allowed_views": ["team", "portfolio"]
            }),
        ),
        def(
            "pi-burnup",
            "PI Burnup",
            "area",
            DataSource::PiBurnup,
            "Cumulative planned versus completed points per sprint of an increment",
            json!({"pi": null, "team_name": null}),
            json!({
                "required_filters": ["pi"],
                "optional_filters": ["team_name"],
                "parameters": {
                    "pi": {"type": "string", "description": "Program increment to chart"},
                    "team_name": {"type": "string", "description": "Team to scope the burnup to"}
                },
                "allowed_views": ["pi", "team"]
            }),
        ),
        def(
            "pi-scope-change",
            "PI Scope Change",
            "bar",
            DataSource::PiScopeChange,
            "Planned points, scope added after start, and delivered points per increment",
            json!({"pi_names": []}),
            json!({
                "required_filters": [],
                "optional_filters": ["pi_names"],
                "parameters": {
                    "pi_names": {"type": "list", "description": "Program increments to include, empty for all"}
                },
                "allowed_views": ["pi", "portfolio"]
            }),
        ),
        def(
            "pi-predictability",
            "PI Predictability",
            "bar",
            DataSource::PiPredictability,
            "Delivered-over-committed percentage per increment",
            json!({"pi_names": [], "team_name": null}),
            json!({
                "required_filters": [],
                "optional_filters": ["pi_names", "team_name"],
                "parameters": {
                    "pi_names": {"type": "list", "description": "Program increments to include, empty for all"},
                    "team_name": {"type": "string", "description": "Team to scope the commitments to"}
                },
                "allowed_views": ["pi", "team", "portfolio"]
            }),
        ),
        def(
            "quarterly-delivery-summary",
            "Quarterly Delivery Summary",
            "bar",
            DataSource::QuarterlyDelivery,
            "Closed issue and point totals per calendar quarter",
            json!({"quarters": [], "team_name": null}),
            json!({
                "required_filters": [],
                "optional_filters": ["quarters", "team_name"],
                "parameters": {
                    "quarters": {"type": "list", "description": "Quarter labels in YYYY-Qn form, empty for all with closed work"},
                    "team_name": {"type": "string", "description": "Team to scope the totals to"}
                },
                "allowed_views": ["portfolio", "team"]
            }),
        ),
        def(
            "portfolio-summary",
            "Portfolio Summary",
            "table",
            DataSource::TeamSummary,
            "Open issues, WIP, and recent velocity for every team",
            json!({}),
            json!({
                "required_filters": [],
                "optional_filters": [],
                "parameters": {},
                "allowed_views": ["portfolio"]
            }),
        ),
        def(
            "insight-activity-summary",
            "Insight Activity",
            "stacked_bar",
            DataSource::InsightActivity,
            "Generated insight counts per category and severity",
            json!({"team_name": null, "months": 3, "categories": []}),
            json!({
                "required_filters": [],
                "optional_filters": ["team_name", "months", "categories"],
                "parameters": {
                    "team_name": {"type": "string", "description": "Team to scope the insights to"},
                    "months": {"type": "integer", "description": "How many months of history to include"},
                    "categories": {"type": "list", "description": "Insight categories to include, empty for all"}
                },
                "allowed_views": ["team", "portfolio"]
            }),
        ),
        def(
            "recommendation-pipeline",
            "Recommendation Pipeline",
            "bar",
            DataSource::RecommendationStatus,
            "Recommendation counts per pipeline status",
            json!({"team_name": null, "statuses": []}),
            json!({
                "required_filters": [],
                "optional_filters": ["team_name", "statuses"],
                "parameters": {
                    "team_name": {"type": "string", "description": "Team to scope the recommendations to"},
                    "statuses": {"type": "list", "description": "Pipeline statuses to include, empty for all"}
                },
                "allowed_views": ["team", "portfolio"]
            }),
        ),
        def(
            "transcript-volume",
            "Transcript Volume",
            "stacked_bar",
            DataSource::TranscriptVolume,
            "Meeting transcript counts per week and meeting type",
            json!({"team_name": null, "months": 3, "meeting_types": []}),
            json!({
                "required_filters": [],
                "optional_filters": ["team_name", "months", "meeting_types"],
                "parameters": {
                    "team_name": {"type": "string", "description": "Team to scope the meetings to"},
                    "months": {"type": "integer", "description": "How many months of history to include"},
                    "meeting_types": {"type": "list", "description": "Meeting types to include, empty for all"}
                },
                "allowed_views": ["team", "portfolio"]
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::{
        CACHE_TTL_REPORT_LONG, CACHE_TTL_REPORT_MEDIUM, CACHE_TTL_REPORT_SHORT,
    };
    use crate::domain::reports::ttl::ttl_for_report;

    #[test]
    fn test_report_ids_are_unique() {
        let seeds = builtin_definitions();
        let mut ids: Vec<&str> = seeds.iter().map(|s| s.report_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), seeds.len());
        assert_eq!(seeds.len(), DataSource::ALL.len());
    }

    #[test]
    fn test_every_data_source_is_servable() {
        for seed in builtin_definitions() {
            assert!(
                DataSource::from_key(&seed.data_source).is_some(),
                "'{}' names unservable source '{}'",
                seed.report_id,
                seed.data_source
            );
        }
    }

    #[test]
    fn test_every_data_source_has_a_definition() {
        let seeds = builtin_definitions();
        for source in DataSource::ALL {
            assert!(
                seeds.iter().any(|s| s.data_source == source.key()),
                "no definition serves '{}'",
                source.key()
            );
        }
    }

    #[test]
    fn test_sprint_burndown_contract() {
        let seeds = builtin_definitions();
        let burndown = seeds
            .iter()
            .find(|s| s.report_id == "team-sprint-burndown")
            .unwrap();
        assert_eq!(
            burndown.default_filters,
            json!({"team_name": null, "issue_type": "all", "sprint_name": null})
        );
        assert_eq!(
            burndown.meta_schema["required_filters"],
            json!(["team_name"])
        );
        assert_eq!(burndown.chart_type, "line");
    }

    #[test]
    fn test_meta_schema_shape() {
        for seed in builtin_definitions() {
            let schema = &seed.meta_schema;
            let parameters = schema["parameters"]
                .as_object()
                .unwrap_or_else(|| panic!("'{}' has no parameters map", seed.report_id));

            for key in ["required_filters", "optional_filters", "allowed_views"] {
                assert!(
                    schema[key].is_array(),
                    "'{}' is missing '{key}'",
                    seed.report_id
                );
            }
            assert!(!schema["allowed_views"].as_array().unwrap().is_empty());

            // Every advertised filter is described, and every described
            // parameter carries a type and description.
            let advertised = schema["required_filters"]
                .as_array()
                .unwrap()
                .iter()
                .chain(schema["optional_filters"].as_array().unwrap());
            for name in advertised {
                let name = name.as_str().unwrap();
                assert!(
                    parameters.contains_key(name),
                    "'{}' advertises undescribed filter '{name}'",
                    seed.report_id
                );
            }
            for (name, spec) in parameters {
                assert!(
                    spec["type"].is_string() && spec["description"].is_string(),
                    "'{}' parameter '{name}' is underspecified",
                    seed.report_id
                );
            }
        }
    }

    #[test]
    fn test_default_filters_are_described() {
        for seed in builtin_definitions() {
            let defaults = seed.default_filters.as_object().unwrap();
            let parameters = seed.meta_schema["parameters"].as_object().unwrap();
            for name in defaults.keys() {
                assert!(
                    parameters.contains_key(name),
                    "'{}' defaults undescribed filter '{name}'",
                    seed.report_id
                );
            }
        }
    }

    #[test]
    fn test_catalog_spans_every_ttl_tier() {
        assert_eq!(
            ttl_for_report("current-sprint-progress"),
            CACHE_TTL_REPORT_SHORT
        );
        assert_eq!(
            ttl_for_report("team-sprint-burndown"),
            CACHE_TTL_REPORT_MEDIUM
        );
        assert_eq!(
            ttl_for_report("closed-issues-by-month"),
            CACHE_TTL_REPORT_LONG
        );
        assert_eq!(
            ttl_for_report("insight-activity-summary"),
            CACHE_TTL_REPORT_LONG
        );
        // No marker matches, so the default tier applies.
        assert_eq!(ttl_for_report("pi-burnup"), CACHE_TTL_REPORT_MEDIUM);
    }
}
