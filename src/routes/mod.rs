//! API Routes
//!
//! - `POST /api/files/analyze` - Describe an uploaded attachment (session required)
//! - `POST /api/files/test-pdf` - First-page PDF probe (session required)
//! - `GET /api/health` - Health check

pub mod files;
pub mod health;

use std::time::Duration;

use axum::{http::StatusCode, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the main application router
///
/// The extraction core has no timeouts of its own; the transport bounds every
/// request with `REQUEST_TIMEOUT_SECS`.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);
    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    Router::new()
        .merge(files::router(state))
        .merge(health::router())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
