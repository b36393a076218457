//! Deployment-mode configuration for the HTTP/WebSocket surface.

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Environment variable selecting the deployment mode
const APP_ENV: &str = "APP_ENV";
/// Comma-separated origin allow-list used in production
const ALLOWED_ORIGINS: &str = "ALLOWED_ORIGINS";
/// Origin of the local development client
const DEV_CLIENT_ORIGIN: &str = "http://localhost:3000";

/// Cross-origin allow-list, varying by deployment mode.
///
/// Production reads `ALLOWED_ORIGINS`; any other mode allows the local
/// development client only.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    allowed_origins: Vec<HeaderValue>,
}

impl CorsConfig {
    pub fn from_env() -> Self {
        let mode = std::env::var(APP_ENV).unwrap_or_else(|_| "development".to_string());
        if mode == "production" {
            let raw = std::env::var(ALLOWED_ORIGINS).unwrap_or_default();
            Self::from_origin_list(&raw)
        } else {
            Self {
                allowed_origins: vec![HeaderValue::from_static(DEV_CLIENT_ORIGIN)],
            }
        }
    }

    fn from_origin_list(raw: &str) -> Self {
        let allowed_origins = raw
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Ignoring invalid allowed origin '{}': {}", origin, e);
                    None
                }
            })
            .collect();
        Self { allowed_origins }
    }

    /// Build the CORS layer for the router
    pub fn layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.allowed_origins.iter().cloned()))
            .allow_methods([Method::GET, Method::POST])
            .allow_credentials(true)
    }
}
