//! Report catalog and resolution endpoints
//!
//! Query parameters on the single-report endpoint double as filter
//! overrides; `bypass_cache` and `cache_ttl` are control parameters and
//! never reach the filter set.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::types::ApiError;
use crate::domain::reports::{
    CacheStats, CatalogEntry, InvalidationOutcome, ReportPayload, ReportResolver, ResolveOptions,
};

// --- State ---

#[derive(Clone)]
pub struct ReportsApiState {
    pub resolver: Arc<ReportResolver>,
}

// --- Request/Response DTOs ---

#[derive(Debug, Deserialize)]
pub struct InvalidateQuery {
    pub report_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogResponse {
    pub success: bool,
    pub data: Vec<CatalogEntry>,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    pub success: bool,
    pub data: ReportPayload,
    pub message: String,
    pub cached: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvalidateResponse {
    pub success: bool,
    pub data: InvalidationOutcome,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CacheStatsResponse {
    pub success: bool,
    pub data: CacheStats,
    pub message: String,
}

// --- Routes ---

pub fn routes(resolver: Arc<ReportResolver>) -> Router<()> {
    let state = ReportsApiState { resolver };
    Router::new()
        .route("/", get(list_reports))
        .route("/cache/invalidate", post(invalidate_cache))
        .route("/cache/stats", get(cache_stats))
        .route("/{report_id}", get(get_report))
        .with_state(state)
}

// --- Handlers ---

/// List every report definition in the catalog
#[utoipa::path(
    get,
    path = "/api/v1/reports",
    tag = "reports",
    params(
        ("bypass_cache" = Option<bool>, Query, description = "Skip the catalog cache and read from PostgreSQL")
    ),
    responses(
        (status = 200, description = "Report definitions", body = CatalogResponse)
    )
)]
pub async fn list_reports(
    State(state): State<ReportsApiState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let bypass = params.iter().any(|(k, v)| k == "bypass_cache" && parse_flag(v));
    let entries = state.resolver.list_catalog(bypass).await?;

    Ok(Json(CatalogResponse {
        success: true,
        data: entries,
        message: "Report definitions retrieved".to_string(),
    }))
}

/// Resolve a report: merge filters, fetch data, cache the payload
#[utoipa::path(
    get,
    path = "/api/v1/reports/{report_id}",
    tag = "reports",
    params(
        ("report_id" = String, Path, description = "Report identifier, e.g. team-sprint-burndown"),
        ("bypass_cache" = Option<bool>, Query, description = "Recompute even when a cached payload exists"),
        ("cache_ttl" = Option<u64>, Query, description = "Override the cache TTL for this resolution, in seconds")
    ),
    responses(
        (status = 200, description = "Resolved report payload", body = ReportResponse),
        (status = 400, description = "Missing or invalid filters"),
        (status = 404, description = "Unknown report")
    )
)]
pub async fn get_report(
    State(state): State<ReportsApiState>,
    Path(report_id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ReportResponse>, ApiError> {
    let options = resolve_options(&params)?;
    let resolved = state.resolver.resolve(&report_id, &params, options).await?;

    Ok(Json(ReportResponse {
        success: true,
        data: resolved.payload,
        message: "Report resolved".to_string(),
        cached: resolved.cached,
    }))
}

/// Drop cached payloads for one report, or for all of them
#[utoipa::path(
    post,
    path = "/api/v1/reports/cache/invalidate",
    tag = "reports",
    params(
        ("report_id" = Option<String>, Query, description = "Limit invalidation to a single report")
    ),
    responses(
        (status = 200, description = "Invalidation outcome", body = InvalidateResponse)
    )
)]
pub async fn invalidate_cache(
    State(state): State<ReportsApiState>,
    Query(query): Query<InvalidateQuery>,
) -> Result<Json<InvalidateResponse>, ApiError> {
    let scope = invalidation_scope(query.report_id.as_deref());
    let outcome = state.resolver.invalidate(scope).await;

    Ok(Json(InvalidateResponse {
        success: true,
        data: outcome,
        message: "Cache invalidated".to_string(),
    }))
}

/// Cache backend health and hit-rate counters
#[utoipa::path(
    get,
    path = "/api/v1/reports/cache/stats",
    tag = "reports",
    responses(
        (status = 200, description = "Cache statistics", body = CacheStatsResponse)
    )
)]
pub async fn cache_stats(
    State(state): State<ReportsApiState>,
) -> Result<Json<CacheStatsResponse>, ApiError> {
    let stats = state.resolver.cache_stats().await;

    Ok(Json(CacheStatsResponse {
        success: true,
        data: stats,
        message: "Cache statistics retrieved".to_string(),
    }))
}

// --- Query parameter helpers ---

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

fn resolve_options(params: &[(String, String)]) -> Result<ResolveOptions, ApiError> {
    let mut options = ResolveOptions::default();
    for (key, value) in params {
        match key.as_str() {
            "bypass_cache" => options.bypass_cache = parse_flag(value),
            "cache_ttl" => {
                let ttl = value.trim().parse::<u64>().map_err(|_| {
                    ApiError::bad_request(format!("Invalid cache_ttl '{value}', expected seconds"))
                })?;
                options.cache_ttl = Some(ttl);
            }
            _ => {}
        }
    }
    Ok(options)
}

/// Blank report ids mean "everything", same as omitting the parameter
fn invalidation_scope(report_id: Option<&str>) -> Option<&str> {
    report_id.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("maybe"));
    }

    #[test]
    fn test_resolve_options_defaults() {
        let options = resolve_options(&pairs(&[("team_name", "Phoenix")])).unwrap();
        assert!(!options.bypass_cache);
        assert_eq!(options.cache_ttl, None);
    }

    #[test]
    fn test_resolve_options_controls() {
        let options =
            resolve_options(&pairs(&[("bypass_cache", "true"), ("cache_ttl", "900")])).unwrap();
        assert!(options.bypass_cache);
        assert_eq!(options.cache_ttl, Some(900));
    }

    #[test]
    fn test_resolve_options_rejects_bad_ttl() {
        let err = resolve_options(&pairs(&[("cache_ttl", "soon")])).unwrap_err();
        match err {
            ApiError::BadRequest { message } => {
                assert!(message.contains("Invalid cache_ttl 'soon'"));
            }
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_invalidation_scope_blank_means_all() {
        assert_eq!(invalidation_scope(None), None);
        assert_eq!(invalidation_scope(Some("")), None);
        assert_eq!(invalidation_scope(Some("   ")), None);
        assert_eq!(
            invalidation_scope(Some(" team-sprint-burndown ")),
            Some("team-sprint-burndown")
        );
    }
}
