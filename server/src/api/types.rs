//! Shared API types
//!
//! The single error type every handler maps into, producing the uniform
//! `{"error": <message>, "code": <http status>}` body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::data::postgres::PostgresError;
use crate::domain::reports::ReportError;

/// Standard API error response
///
/// The missing-filters case also carries `missing_filters` in the body so
/// clients can prompt for exactly what is absent.
#[derive(Debug)]
pub enum ApiError {
    BadRequest { message: String },
    MissingFilters { missing: Vec<String> },
    NotFound { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn from_postgres(e: PostgresError) -> Self {
        tracing::error!(error = %e, "PostgreSQL error");
        Self::Internal {
            message: "Database operation failed".to_string(),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::NotFound(_) => Self::NotFound {
                message: err.to_string(),
            },
            ReportError::MissingFilters(missing) => Self::MissingFilters { missing },
            ReportError::InvalidFilter(message) => Self::BadRequest { message },
            ReportError::UnsupportedSource(_) | ReportError::MalformedDefinition(_) => {
                tracing::error!(error = %err, "Report registry is misconfigured");
                Self::Internal {
                    message: err.to_string(),
                }
            }
            ReportError::Database(e) => Self::from_postgres(e),
            ReportError::Encode(e) => {
                tracing::error!(error = %e, "Filter encoding error");
                Self::Internal {
                    message: "Failed to encode report filters".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, missing) = match self {
            Self::BadRequest { message } => (StatusCode::BAD_REQUEST, message, None),
            Self::MissingFilters { missing } => (
                StatusCode::BAD_REQUEST,
                format!("Missing required filters: {}", missing.join(", ")),
                Some(missing),
            ),
            Self::NotFound { message } => (StatusCode::NOT_FOUND, message, None),
            Self::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message, None),
        };

        let mut body = json!({
            "error": message,
            "code": status.as_u16(),
        });
        if let Some(missing) = missing {
            body["missing_filters"] = json!(missing);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_body_shape() {
        let response = ApiError::not_found("Report 'nope' not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Report 'nope' not found");
        assert_eq!(body["code"], 404);
        assert!(body.get("missing_filters").is_none());
    }

    #[tokio::test]
    async fn test_missing_filters_body() {
        let err = ApiError::MissingFilters {
            missing: vec!["team_name".to_string()],
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], 400);
        assert_eq!(body["missing_filters"], json!(["team_name"]));
        assert_eq!(body["error"], "Missing required filters: team_name");
    }

    #[tokio::test]
    async fn test_internal_body_shape() {
        let response = ApiError::internal("Database operation failed").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["code"], 500);
    }

    #[test]
    fn test_report_error_statuses() {
        let err: ApiError = ReportError::NotFound("x".to_string()).into();
        assert!(matches!(err, ApiError::NotFound { .. }));

        let err: ApiError = ReportError::MissingFilters(vec!["pi".to_string()]).into();
        assert!(matches!(err, ApiError::MissingFilters { .. }));

        let err: ApiError = ReportError::InvalidFilter("bad".to_string()).into();
        assert!(matches!(err, ApiError::BadRequest { .. }));

        let err: ApiError = ReportError::UnsupportedSource("legacy".to_string()).into();
        assert!(matches!(err, ApiError::Internal { .. }));
    }
}
