//! Team listing endpoint
//!
//! Serves the team names dashboards use to populate filter pickers.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;

use crate::api::types::ApiError;
use crate::data::postgres::repositories::teams;

#[derive(Clone)]
pub struct TeamsApiState {
    pub pool: PgPool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeamsResponse {
    pub success: bool,
    pub data: Vec<String>,
    pub message: String,
}

pub fn routes(pool: PgPool) -> Router<()> {
    Router::new()
        .route("/", get(list_teams))
        .with_state(TeamsApiState { pool })
}

/// List team names in alphabetical order
#[utoipa::path(
    get,
    path = "/api/v1/teams",
    tag = "teams",
    responses(
        (status = 200, description = "Team names retrieved", body = TeamsResponse)
    )
)]
pub async fn list_teams(
    State(state): State<TeamsApiState>,
) -> Result<Json<TeamsResponse>, ApiError> {
    let names = teams::list_team_names(&state.pool)
        .await
        .map_err(ApiError::from_postgres)?;

    Ok(Json(TeamsResponse {
        success: true,
        data: names,
        message: "Teams retrieved".to_string(),
    }))
}
