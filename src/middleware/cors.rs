//! CORS policy for browser clients.
//!
//! Policy:
//! - Development: any origin, no credentials (bearer clients, local tooling).
//! - Production: allowlist from `CORS_ALLOWED_ORIGINS`, WITH credentials so the
//!   browser sends the session cookie. An empty allowlist emits no CORS headers.

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;
use crate::services::auth::antiforgery;

pub fn apply(router: Router, config: &Config) -> Router {
    let cors = if config.app_env.is_production() {
        let allowed: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        // Credentials require an explicit origin, never `Any`.
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_credentials(true)
    } else {
        CorsLayer::new().allow_origin(Any)
    }
    .allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ])
    .allow_headers([
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        HeaderName::from_static("x-request-id"),
        HeaderName::from_static(antiforgery::HEADER_NAME),
    ])
    .max_age(std::time::Duration::from_secs(60 * 10));

    router.layer(cors)
}
