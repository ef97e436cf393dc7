//! Liveness endpoint

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::core::constants::APP_NAME_LOWER;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Liveness probe; answers 200 as long as the process serves requests
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: APP_NAME_LOWER,
        version: env!("CARGO_PKG_VERSION"),
    })
}
