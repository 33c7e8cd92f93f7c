//! HTTP service for template-driven PDF field extraction.
//!
//! Endpoints:
//! - `GET /health`: liveness probe
//! - `POST /extract`: multipart upload of a `pdf` part and a `template` JSON part

mod handlers;
mod types;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use plx_core::PlxConfig;

pub use handlers::*;
pub use types::*;

/// State shared across handlers.
#[derive(Clone, Default)]
pub struct ApiState {
    /// Limits and heuristics applied to every request.
    pub config: Arc<PlxConfig>,
}

impl ApiState {
    #[must_use]
    pub fn new(config: PlxConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Build the API router with all endpoints.
pub fn build_router(state: ApiState) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/extract", post(extract))
        .layer(DefaultBodyLimit::max(state.config.limits.max_upload_bytes))
        .layer(TraceLayer::new_for_http());

    let router = if state.config.server.permissive_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}

/// Serve the API on an already bound listener.
pub async fn serve(listener: tokio::net::TcpListener, state: ApiState) -> Result<(), std::io::Error> {
    axum::serve(listener, build_router(state)).await
}

/// Bind `addr` and serve the API.
pub async fn start_server(addr: &str, state: ApiState) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    serve(listener, state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_api_state_keeps_config() {
        let mut config = PlxConfig::default();
        config.limits.max_pages = 3;
        let state = ApiState::new(config);
        assert_eq!(state.config.limits.max_pages, 3);
    }

    #[test]
    fn test_api_state_default() {
        let state = ApiState::default();
        assert_eq!(state.config.limits.max_pages, 50);
    }
}
