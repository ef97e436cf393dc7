//! Report resolution orchestrator
//!
//! One entry point per API operation:
//! - [`ReportResolver::resolve`] - merge filters, validate, read through the
//!   cache, dispatch to the data source, wrap and cache the payload
//! - [`ReportResolver::list_catalog`] - summarized definitions under a fixed
//!   cache key
//! - [`ReportResolver::invalidate`] - pattern invalidation, one report or all
//! - [`ReportResolver::cache_stats`] - backend health plus process-local
//!   hit/miss counters
//!
//! Cache failures never fail a request here: reads degrade to misses and
//! writes to no-ops, each with a `warn` log. Concurrent misses on the same
//! key all fetch and all write; entries are deterministic for a given
//! database state, so last-write-wins is acceptable.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::filters::{
    FilterSet, filter_set_from_json, merge_filters, missing_required, normalize_overrides,
};
use super::sources::{self, DataSource, FetchError};
use super::ttl::ttl_for_report;
use crate::core::constants::CACHE_TTL_REPORT_CATALOG;
use crate::data::cache::{CacheKey, CacheService};
use crate::data::postgres::PostgresError;
use crate::data::postgres::repositories::report_definitions;
use crate::data::types::ReportDefinitionRow;

// --- Error type ---

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report '{0}' not found")]
    NotFound(String),

    #[error("Missing required filters: {}", .0.join(", "))]
    MissingFilters(Vec<String>),

    #[error("{0}")]
    InvalidFilter(String),

    /// Stored `default_filters` that no longer parse as a flat filter object,
    /// only reachable through hand-edited registry rows
    #[error("Report '{0}' has malformed stored filters")]
    MalformedDefinition(String),

    #[error("No fetch function registered for data source '{0}'")]
    UnsupportedSource(String),

    #[error(transparent)]
    Database(#[from] PostgresError),

    #[error("Failed to encode filters: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<FetchError> for ReportError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidFilter(message) => Self::InvalidFilter(message),
            FetchError::UnsupportedSource(key) => Self::UnsupportedSource(key),
            FetchError::Database(e) => Self::Database(e),
        }
    }
}

// --- Payload types ---

/// Definition header embedded in a resolved report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DefinitionSummary {
    pub report_id: String,
    pub report_name: String,
    pub chart_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&ReportDefinitionRow> for DefinitionSummary {
    fn from(row: &ReportDefinitionRow) -> Self {
        Self {
            report_id: row.report_id.clone(),
            report_name: row.report_name.clone(),
            chart_type: row.chart_type.clone(),
            description: row.description.clone(),
        }
    }
}

/// One definition as listed by the catalog endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogEntry {
    pub report_id: String,
    pub report_name: String,
    pub chart_type: String,
    pub data_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[schema(value_type = Object)]
    pub default_filters: Value,
    #[schema(value_type = Object)]
    pub meta_schema: Value,
}

impl From<ReportDefinitionRow> for CatalogEntry {
    fn from(row: ReportDefinitionRow) -> Self {
        Self {
            report_id: row.report_id,
            report_name: row.report_name,
            chart_type: row.chart_type,
            data_source: row.data_source,
            description: row.description,
            default_filters: row.default_filters,
            meta_schema: row.meta_schema,
        }
    }
}

/// The cacheable resolved-report payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportPayload {
    pub definition: DefinitionSummary,
    /// The merged filter set the result was produced under
    #[schema(value_type = Object)]
    pub filters: FilterSet,
    /// Flat row objects, one per chart point
    #[schema(value_type = Vec<Object>)]
    pub result: Vec<Value>,
    /// Derived facts about the result (date windows, totals, context)
    #[schema(value_type = Object)]
    pub meta: Value,
}

/// A resolved report plus where it came from
#[derive(Debug, Clone)]
pub struct ResolvedReport {
    pub payload: ReportPayload,
    pub cached: bool,
}

/// Endpoint-level knobs, parsed from reserved query parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    pub bypass_cache: bool,
    /// Seconds; overrides the report-id TTL heuristic when set
    pub cache_ttl: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvalidationOutcome {
    pub invalidated: u64,
    /// The key pattern that was cleared
    pub scope: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CacheStats {
    /// Whether the backend answered a health check just now
    pub available: bool,
    pub backend: String,
    pub hits: u64,
    pub misses: u64,
    /// Fraction of reads served from cache, 0.0 when nothing was read yet
    pub hit_rate: f64,
}

// --- Resolver ---

pub struct ReportResolver {
    pool: PgPool,
    cache: Arc<CacheService>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ReportResolver {
    pub fn new(pool: PgPool, cache: Arc<CacheService>) -> Self {
        Self {
            pool,
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Resolve one report: merge request filters over registry defaults,
    /// validate, read through the cache, dispatch on miss
    pub async fn resolve(
        &self,
        report_id: &str,
        raw_filters: &[(String, String)],
        options: ResolveOptions,
    ) -> Result<ResolvedReport, ReportError> {
        let Some(definition) = report_definitions::get_definition(&self.pool, report_id).await?
        else {
            debug!(report_id, "Unknown report requested");
            return Err(ReportError::NotFound(report_id.to_string()));
        };

        let defaults = filter_set_from_json(&definition.default_filters)
            .map_err(|_| ReportError::MalformedDefinition(report_id.to_string()))?;
        let merged = merge_filters(&defaults, normalize_overrides(raw_filters));

        let required = required_filters(&definition.meta_schema);
        let missing = missing_required(&merged, &required);
        if !missing.is_empty() {
            debug!(report_id, ?missing, "Request is missing required filters");
            return Err(ReportError::MissingFilters(missing));
        }

        let canonical = serde_json::to_string(&merged)?;
        let key = CacheKey::report(report_id, &canonical);

        if !options.bypass_cache
            && let Some(payload) = self.read_cache::<ReportPayload>(&key).await
        {
            return Ok(ResolvedReport {
                payload,
                cached: true,
            });
        }

        let source = DataSource::from_key(&definition.data_source)
            .ok_or_else(|| ReportError::UnsupportedSource(definition.data_source.clone()))?;
        let fetched = sources::fetch(&self.pool, source, &merged).await?;

        let payload = ReportPayload {
            definition: DefinitionSummary::from(&definition),
            filters: merged,
            result: fetched.rows,
            meta: fetched.meta,
        };

        let ttl = options.cache_ttl.unwrap_or_else(|| ttl_for_report(report_id));
        self.write_cache(&key, &payload, ttl).await;

        Ok(ResolvedReport {
            payload,
            cached: false,
        })
    }

    /// Summarized definitions, cached under the fixed catalog key.
    /// `bypass_cache` skips the read but still refreshes the entry.
    pub async fn list_catalog(&self, bypass_cache: bool) -> Result<Vec<CatalogEntry>, ReportError> {
        let key = CacheKey::catalog();
        if !bypass_cache
            && let Some(entries) = self.read_cache::<Vec<CatalogEntry>>(&key).await
        {
            return Ok(entries);
        }

        let entries: Vec<CatalogEntry> = report_definitions::list_definitions(&self.pool)
            .await?
            .into_iter()
            .map(CatalogEntry::from)
            .collect();
        self.write_cache(&key, &entries, CACHE_TTL_REPORT_CATALOG).await;
        Ok(entries)
    }

    /// Drop cached entries for one report, or every report (catalog
    /// included) when no id is given. Backend failures degrade to a zero
    /// count.
    pub async fn invalidate(&self, report_id: Option<&str>) -> InvalidationOutcome {
        let scope = match report_id {
            Some(id) => CacheKey::report_scope(id),
            None => CacheKey::all_reports(),
        };
        let invalidated = match self.cache.invalidate(&scope).await {
            Ok(count) => count,
            Err(e) => {
                warn!(scope = %scope, error = %e, "Cache invalidation failed");
                0
            }
        };
        InvalidationOutcome { invalidated, scope }
    }

    /// Backend health plus the hit/miss counters accumulated since startup
    pub async fn cache_stats(&self) -> CacheStats {
        let available = self.cache.health_check().await.is_ok();
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };
        CacheStats {
            available,
            backend: self.cache.backend_name().to_string(),
            hits,
            misses,
            hit_rate,
        }
    }

    async fn read_cache<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get::<T>(key).await {
            Ok(Some(value)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    async fn write_cache<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let ttl = Some(Duration::from_secs(ttl_secs));
        if let Err(e) = self.cache.set(key, value, ttl).await {
            warn!(key, error = %e, "Cache write failed, serving uncached");
        }
    }
}

/// Names listed under `meta_schema.required_filters`; anything non-string
/// in a hand-edited row is ignored
fn required_filters(meta_schema: &Value) -> Vec<String> {
    meta_schema
        .get("required_filters")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn definition_row() -> ReportDefinitionRow {
        ReportDefinitionRow {
            report_id: "team-sprint-burndown".to_string(),
            report_name: "Sprint Burndown".to_string(),
            chart_type: "line".to_string(),
            data_source: "sprint_burndown".to_string(),
            description: Some("Remaining points per day".to_string()),
            default_filters: json!({"team_name": null, "issue_type": "all", "sprint_name": null}),
            meta_schema: json!({"required_filters": ["team_name"]}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_required_filters_extraction() {
        let row = definition_row();
        assert_eq!(required_filters(&row.meta_schema), vec!["team_name"]);

        assert!(required_filters(&json!({})).is_empty());
        assert!(required_filters(&json!({"required_filters": "team_name"})).is_empty());
        // Non-string entries are dropped, not errors.
        assert_eq!(
            required_filters(&json!({"required_filters": ["pi", 7]})),
            vec!["pi"]
        );
    }

    #[test]
    fn test_definition_summary_from_row() {
        let summary = DefinitionSummary::from(&definition_row());
        assert_eq!(summary.report_id, "team-sprint-burndown");
        assert_eq!(summary.chart_type, "line");
        assert_eq!(summary.description.as_deref(), Some("Remaining points per day"));
    }

    #[test]
    fn test_catalog_entry_keeps_schemas() {
        let entry = CatalogEntry::from(definition_row());
        assert_eq!(entry.data_source, "sprint_burndown");
        assert_eq!(entry.meta_schema["required_filters"], json!(["team_name"]));
        assert_eq!(entry.default_filters["issue_type"], json!("all"));
    }

    #[test]
    fn test_fetch_error_mapping() {
        let err: ReportError = FetchError::InvalidFilter("Unknown team 'X'".to_string()).into();
        assert!(matches!(err, ReportError::InvalidFilter(_)));

        let err: ReportError = FetchError::UnsupportedSource("legacy".to_string()).into();
        assert!(matches!(err, ReportError::UnsupportedSource(_)));
    }

    #[test]
    fn test_missing_filters_display() {
        let err = ReportError::MissingFilters(vec!["team_name".to_string(), "pi".to_string()]);
        assert_eq!(err.to_string(), "Missing required filters: team_name, pi");
    }

    #[test]
    fn test_report_payload_msgpack_round_trip() {
        let payload = ReportPayload {
            definition: DefinitionSummary::from(&definition_row()),
            filters: crate::domain::reports::filters::filter_set_from_json(
                &json!({"team_name": "Phoenix", "issue_type": "all", "sprint_name": null}),
            )
            .unwrap(),
            result: vec![
                json!({"day": "2025-03-01", "remaining_points": 40.0, "ideal_points": 40.0}),
                json!({"day": "2025-03-02", "remaining_points": 37.5, "ideal_points": 36.0}),
            ],
            meta: json!({"sprint": "2025-S05", "committed_points": 40.0}),
        };

        let bytes = rmp_serde::to_vec(&payload).unwrap();
        let decoded: ReportPayload = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(decoded.definition.report_id, "team-sprint-burndown");
        assert_eq!(decoded.filters, payload.filters);
        assert_eq!(decoded.result, payload.result);
        assert_eq!(decoded.meta, payload.meta);
    }

    #[test]
    fn test_resolve_options_default() {
        let options = ResolveOptions::default();
        assert!(!options.bypass_cache);
        assert_eq!(options.cache_ttl, None);
    }
}
