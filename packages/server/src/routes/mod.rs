//! HTTP route modules
//!
//! Each module exposes a `routes(state)` function; `create_router` merges
//! them.

use axum::{response::Json, routing::get, Router};
use serde::Serialize;

pub mod profession_endpoints;
pub mod progress_endpoints;
pub mod quest_endpoints;
pub mod skill_endpoints;
pub mod theory_endpoints;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// ```bash
/// curl http://localhost:3001/api/health
/// ```
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn health_routes() -> Router {
    Router::new().route("/api/health", get(health_check))
}
