//! API key authentication.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};

/// Server-side security settings.
#[derive(Clone, Debug, Default)]
pub struct ApiConfig {
    /// Bearer key every table request must carry (from CLASSROOM_API_KEY).
    /// `None` leaves the API open, for local use.
    pub api_key: Option<String>,
}

impl ApiConfig {
    /// Load security configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("CLASSROOM_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
        }
    }

    /// No authentication (for local development/testing).
    pub fn disabled() -> Self {
        Self { api_key: None }
    }

    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
        }
    }
}

/// Reject requests without `Authorization: Bearer <api_key>` when a key is set.
pub async fn auth_middleware(
    State(config): State<ApiConfig>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let expected_key = match &config.api_key {
        Some(key) => key,
        None => return Ok(next.run(request).await),
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match auth_header.map(|h| h.strip_prefix("Bearer ")) {
        Some(Some(token)) if token == expected_key => Ok(next.run(request).await),
        Some(Some(_)) => {
            tracing::warn!("Invalid API key provided");
            Err(StatusCode::UNAUTHORIZED)
        }
        Some(None) => {
            tracing::warn!("Invalid Authorization header format");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Missing Authorization header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
