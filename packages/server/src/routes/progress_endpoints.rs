//! User Progress Endpoints
//!
//! # Endpoints
//!
//! - `GET /api/user-progress` - The learner's progress
//! - `POST /api/user-progress` - Create it (`{"userName": ...}`), once
//! - `PUT /api/user-progress/:kind/:target_id` - Record a completion or selection
//! - `DELETE /api/user-progress/:kind/:target_id` - Remove it again
//!
//! `kind` is one of `completed-theories`, `completed-quests`,
//! `selected-professions`.

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};

use crate::extract::{ApiJson, ApiPath};
use crate::{AppState, HttpError};
use learner_core::models::{NewUserProgress, ProgressLink, UserProgress};

async fn get_progress(State(state): State<AppState>) -> Result<Json<UserProgress>, HttpError> {
    Ok(Json(state.progress.get_progress().await?))
}

async fn create_progress(
    State(state): State<AppState>,
    ApiJson(progress): ApiJson<NewUserProgress>,
) -> Result<(StatusCode, Json<UserProgress>), HttpError> {
    let created = state.progress.create_progress(progress).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Record an id under one of the progress sets
///
/// # Example
///
/// ```bash
/// curl -X PUT http://localhost:3001/api/user-progress/completed-theories/4
/// ```
async fn record(
    State(state): State<AppState>,
    ApiPath((kind, target_id)): ApiPath<(ProgressLink, i64)>,
) -> Result<Json<UserProgress>, HttpError> {
    Ok(Json(state.progress.record(kind, target_id).await?))
}

async fn clear(
    State(state): State<AppState>,
    ApiPath((kind, target_id)): ApiPath<(ProgressLink, i64)>,
) -> Result<Json<UserProgress>, HttpError> {
    Ok(Json(state.progress.clear(kind, target_id).await?))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/user-progress",
            get(get_progress).post(create_progress),
        )
        .route(
            "/api/user-progress/:kind/:target_id",
            put(record).delete(clear),
        )
        .with_state(state)
}
