//! OpenAPI document assembly and the Swagger UI page

use axum::http::header;
use axum::response::{Html, IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::routes::{health, reports, teams};
use crate::domain::reports::resolver::{
    CacheStats, CatalogEntry, DefinitionSummary, InvalidationOutcome, ReportPayload,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cadence API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Delivery metrics and reporting service"
    ),
    tags(
        (name = "health", description = "Liveness probe"),
        (name = "reports", description = "Report catalog, resolution, and cache control"),
        (name = "teams", description = "Team lookups for filter pickers")
    ),
    paths(
        health::health,
        reports::list_reports,
        reports::get_report,
        reports::invalidate_cache,
        reports::cache_stats,
        teams::list_teams,
    ),
    components(schemas(
        health::HealthResponse,
        reports::CatalogResponse,
        reports::ReportResponse,
        reports::InvalidateResponse,
        reports::CacheStatsResponse,
        CatalogEntry,
        DefinitionSummary,
        ReportPayload,
        InvalidationOutcome,
        CacheStats,
        teams::TeamsResponse,
    ))
)]
pub struct ApiDoc;

/// The generated document as JSON
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}

/// Interactive docs; assets come from the unpkg CDN
pub async fn swagger_ui_html() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Cadence API docs</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
  <style>body { margin: 0; background: #fafafa; }</style>
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({
        url: "/api/openapi.json",
        dom_id: "#swagger-ui",
        deepLinking: true
      });
    };
  </script>
</body>
</html>"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/api/v1/health",
            "/api/v1/reports",
            "/api/v1/reports/{report_id}",
            "/api/v1/reports/cache/invalidate",
            "/api/v1/reports/cache/stats",
            "/api/v1/teams",
        ] {
            assert!(paths.contains(&expected), "missing path {expected}");
        }
    }

    #[test]
    fn test_swagger_page_points_at_the_document() {
        assert!(SWAGGER_UI_HTML.contains("/api/openapi.json"));
    }
}
