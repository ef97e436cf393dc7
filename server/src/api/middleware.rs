//! HTTP middleware: CORS policy and the 404 fallback

use axum::extract::Request;
use axum::http::{HeaderValue, Method, header};
use axum::response::IntoResponse;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::debug;

use crate::api::types::ApiError;
use crate::core::config::is_all_interfaces;

/// Origins the browser may call this API from
#[derive(Debug, Clone)]
pub struct AllowedOrigins {
    origins: Vec<String>,
}

impl AllowedOrigins {
    /// Derive the origin allowlist from the bind address
    ///
    /// Local and all-interface binds accept both `localhost` and `127.0.0.1`
    /// spellings; a concrete host is taken as-is. Each host is allowed on the
    /// API port, the next port up (a front-end dev server), and bare.
    pub fn new(host: &str, port: u16) -> Self {
        let local = is_all_interfaces(host) || matches!(host, "127.0.0.1" | "localhost");
        let hosts: &[&str] = if local {
            &["localhost", "127.0.0.1"]
        } else {
            std::slice::from_ref(&host)
        };

        let dev_port = port.saturating_add(1);
        let origins = hosts
            .iter()
            .flat_map(|h| {
                [
                    format!("http://{h}:{port}"),
                    format!("http://{h}:{dev_port}"),
                    format!("http://{h}"),
                ]
            })
            .collect();

        Self { origins }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == origin)
    }

    fn header_values(&self) -> Vec<HeaderValue> {
        self.origins.iter().filter_map(|o| o.parse().ok()).collect()
    }
}

/// Build the CORS layer from the allowlist
pub fn cors_layer(allowed: &AllowedOrigins) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed.header_values()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
            header::CACHE_CONTROL,
        ])
        .allow_credentials(true)
}

/// Fallback for unmatched routes, answering with the standard error body
pub async fn not_found(req: Request) -> impl IntoResponse {
    debug!(method = %req.method(), uri = %req.uri(), "No route matched");
    ApiError::not_found("Route not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localhost_origins() {
        let allowed = AllowedOrigins::new("127.0.0.1", 5480);

        assert!(allowed.is_allowed("http://localhost:5480"));
        assert!(allowed.is_allowed("http://localhost:5481"));
        assert!(allowed.is_allowed("http://127.0.0.1:5480"));
        assert!(allowed.is_allowed("http://127.0.0.1"));
        assert!(!allowed.is_allowed("http://evil.example:5480"));
    }

    #[test]
    fn test_all_interfaces_expands_to_local_aliases() {
        let allowed = AllowedOrigins::new("0.0.0.0", 5480);

        assert!(allowed.is_allowed("http://localhost:5480"));
        assert!(allowed.is_allowed("http://127.0.0.1:5481"));
    }

    #[test]
    fn test_explicit_host_kept_verbatim() {
        let allowed = AllowedOrigins::new("metrics.internal", 8080);

        assert!(allowed.is_allowed("http://metrics.internal:8080"));
        assert!(allowed.is_allowed("http://metrics.internal:8081"));
        assert!(allowed.is_allowed("http://metrics.internal"));
        assert!(!allowed.is_allowed("http://localhost:8080"));
    }

    #[test]
    fn test_header_values_parse() {
        let allowed = AllowedOrigins::new("localhost", 5480);
        assert_eq!(allowed.header_values().len(), 6);
    }
}
