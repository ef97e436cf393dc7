//! Shared row types returned by the PostgreSQL repositories

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// --- Report definition types ---

/// Report definition row from database
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportDefinitionRow {
    pub report_id: String,
    pub report_name: String,
    pub chart_type: String,
    pub data_source: String,
    pub description: Option<String>,
    pub default_filters: serde_json::Value,
    pub meta_schema: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Sprint types ---

/// Sprint row from database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintRow {
    pub id: i64,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub state: String,
    pub committed_points: Option<f64>,
    pub completed_points: Option<f64>,
}

// --- Program increment types ---

/// Program increment row from database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementRow {
    pub id: i64,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: String,
}
