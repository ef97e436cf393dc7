//! HTTP server assembly and startup

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::{self, AllowedOrigins};
use super::openapi::{openapi_json, swagger_ui_html};
use super::routes::{health, reports, teams};
use crate::core::App;
use crate::core::constants::DEFAULT_BODY_LIMIT;

pub struct ApiServer {
    app: App,
    origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: App) -> Self {
        let origins = AllowedOrigins::new(&app.config.server.host, app.config.server.port);
        Self { app, origins }
    }

    /// Serve until the shutdown switch flips, then hand `App` back so
    /// the caller can drain and close resources
    pub async fn start(self) -> Result<App> {
        let Self { app, origins } = self;

        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);
        let router = build_router(&app, &origins);

        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on http://{addr}");

        let service = router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, service)
            .with_graceful_shutdown(app.shutdown.wait())
            .await?;

        Ok(app)
    }
}

/// Routes, docs, and the middleware stack
fn build_router(app: &App, origins: &AllowedOrigins) -> Router {
    let router = Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/health", get(health::health))
        .route("/api/openapi.json", get(openapi_json))
        .route("/api/docs", get(swagger_ui_html))
        .route("/api/docs/", get(swagger_ui_html))
        .nest("/api/v1/reports", reports::routes(app.resolver.clone()))
        .nest("/api/v1/teams", teams::routes(app.database.pool().clone()))
        .fallback(middleware::not_found)
        .layer(CompressionLayer::new())
        .layer(middleware::cors_layer(origins))
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT));

    // Per-request tracing is opt-in through --debug / "debug": true.
    if app.config.debug {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}
