//! Report definition registry storage
//!
//! The registry is reconciled from the in-code catalog at startup; these
//! functions only read rows and apply the reconciliation upsert.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::data::postgres::PostgresError;
use crate::data::types::ReportDefinitionRow;

/// Catalog listing, ordered for deterministic API responses
const LIST_SQL: &str = "SELECT report_id, report_name, chart_type, data_source, description, \
     default_filters::text, meta_schema::text, created_at, updated_at \
     FROM report_definitions ORDER BY report_id";

/// Reconciliation upsert: insert new definitions, refresh existing ones
const UPSERT_SQL: &str = "INSERT INTO report_definitions \
     (report_id, report_name, chart_type, data_source, description, default_filters, meta_schema) \
     VALUES ($1, $2, $3, $4, $5, $6::jsonb, $7::jsonb) \
     ON CONFLICT (report_id) DO UPDATE SET \
     report_name = EXCLUDED.report_name, \
     chart_type = EXCLUDED.chart_type, \
     data_source = EXCLUDED.data_source, \
     description = EXCLUDED.description, \
     default_filters = EXCLUDED.default_filters, \
     meta_schema = EXCLUDED.meta_schema, \
     updated_at = now()";

/// A definition to reconcile into the registry
#[derive(Debug, Clone)]
pub struct ReportDefinitionSeed {
    pub report_id: String,
    pub report_name: String,
    pub chart_type: String,
    pub data_source: String,
    pub description: Option<String>,
    pub default_filters: serde_json::Value,
    pub meta_schema: serde_json::Value,
}

type DefinitionTuple = (
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn row_from_tuple(tuple: DefinitionTuple) -> Result<ReportDefinitionRow, PostgresError> {
    let (
        report_id,
        report_name,
        chart_type,
        data_source,
        description,
        default_filters,
        meta_schema,
        created_at,
        updated_at,
    ) = tuple;
    Ok(ReportDefinitionRow {
        report_id,
        report_name,
        chart_type,
        data_source,
        description,
        default_filters: serde_json::from_str(&default_filters)?,
        meta_schema: serde_json::from_str(&meta_schema)?,
        created_at,
        updated_at,
    })
}

/// List all report definitions ordered by report id
pub async fn list_definitions(pool: &PgPool) -> Result<Vec<ReportDefinitionRow>, PostgresError> {
    let rows: Vec<DefinitionTuple> = sqlx::query_as(LIST_SQL).fetch_all(pool).await?;

    rows.into_iter().map(row_from_tuple).collect()
}

/// Get a report definition by id
pub async fn get_definition(
    pool: &PgPool,
    report_id: &str,
) -> Result<Option<ReportDefinitionRow>, PostgresError> {
    let row: Option<DefinitionTuple> = sqlx::query_as(
        "SELECT report_id, report_name, chart_type, data_source, description, \
         default_filters::text, meta_schema::text, created_at, updated_at \
         FROM report_definitions WHERE report_id = $1",
    )
    .bind(report_id)
    .fetch_optional(pool)
    .await?;

    row.map(row_from_tuple).transpose()
}

/// Upsert a batch of definitions inside one transaction
///
/// Returns the number of rows written. Safe to run repeatedly.
pub async fn upsert_definitions(
    pool: &PgPool,
    seeds: &[ReportDefinitionSeed],
) -> Result<u64, PostgresError> {
    let mut tx = pool.begin().await?;
    let mut written = 0u64;

    for seed in seeds {
        let result = sqlx::query(UPSERT_SQL)
            .bind(&seed.report_id)
            .bind(&seed.report_name)
            .bind(&seed.chart_type)
            .bind(&seed.data_source)
            .bind(&seed.description)
            .bind(seed.default_filters.to_string())
            .bind(seed.meta_schema.to_string())
            .execute(&mut *tx)
            .await?;
        written += result.rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_sql_is_idempotent_by_report_id() {
        assert!(UPSERT_SQL.contains("ON CONFLICT (report_id) DO UPDATE"));
        assert!(UPSERT_SQL.contains("updated_at = now()"));
        // created_at is never refreshed on conflict
        assert!(!UPSERT_SQL.contains("created_at = "));
    }

    #[test]
    fn test_list_sql_orders_deterministically() {
        assert!(LIST_SQL.ends_with("ORDER BY report_id"));
    }

    #[test]
    fn test_row_from_tuple_parses_json_columns() {
        let now = Utc::now();
        let row = row_from_tuple((
            "team-sprint-burndown".to_string(),
            "Sprint Burndown".to_string(),
            "line".to_string(),
            "sprint_burndown".to_string(),
            None,
            r#"{"team_name":null,"issue_type":"all"}"#.to_string(),
            r#"{"required_filters":["team_name"]}"#.to_string(),
            now,
            now,
        ))
        .unwrap();

        assert_eq!(row.report_id, "team-sprint-burndown");
        assert!(row.default_filters.get("issue_type").is_some());
        assert_eq!(
            row.meta_schema["required_filters"][0],
            serde_json::json!("team_name")
        );
    }

    #[test]
    fn test_row_from_tuple_rejects_corrupt_json() {
        let now = Utc::now();
        let result = row_from_tuple((
            "x".to_string(),
            "X".to_string(),
            "line".to_string(),
            "sprint_burndown".to_string(),
            None,
            "{not json".to_string(),
            "{}".to_string(),
            now,
            now,
        ));
        assert!(matches!(result, Err(PostgresError::Serialization(_))));
    }
}
