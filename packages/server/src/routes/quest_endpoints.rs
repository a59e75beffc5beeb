//! Quest Endpoints
//!
//! # Endpoints
//!
//! - `GET /api/quests` - List quests with their linked theory ids
//! - `POST /api/quests` - Create a quest
//! - `GET /api/quests/:id` - One quest
//! - `DELETE /api/quests/:id` - Delete a quest
//! - `PUT /api/quests/:id/theories/:theory_id` - Link a theory
//! - `DELETE /api/quests/:id/theories/:theory_id` - Unlink a theory

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};

use crate::extract::{ApiJson, ApiPath};
use crate::{AppState, HttpError};
use learner_core::models::{NewQuest, Quest};

async fn list_quests(State(state): State<AppState>) -> Result<Json<Vec<Quest>>, HttpError> {
    Ok(Json(state.quests.list_quests().await?))
}

/// Create a quest
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:3001/api/quests \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Ship a CLI", "rewardPoints": 20}'
/// ```
async fn create_quest(
    State(state): State<AppState>,
    ApiJson(quest): ApiJson<NewQuest>,
) -> Result<(StatusCode, Json<Quest>), HttpError> {
    let created = state.quests.create_quest(quest).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_quest(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Quest>, HttpError> {
    Ok(Json(state.quests.get_quest(id).await?))
}

async fn delete_quest(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, HttpError> {
    state.quests.delete_quest(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn link_theory(
    State(state): State<AppState>,
    ApiPath((id, theory_id)): ApiPath<(i64, i64)>,
) -> Result<Json<Quest>, HttpError> {
    Ok(Json(state.quests.link_theory(id, theory_id).await?))
}

async fn unlink_theory(
    State(state): State<AppState>,
    ApiPath((id, theory_id)): ApiPath<(i64, i64)>,
) -> Result<Json<Quest>, HttpError> {
    Ok(Json(state.quests.unlink_theory(id, theory_id).await?))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/quests", get(list_quests).post(create_quest))
        .route("/api/quests/:id", get(get_quest).delete(delete_quest))
        .route(
            "/api/quests/:id/theories/:theory_id",
            put(link_theory).delete(unlink_theory),
        )
        .with_state(state)
}
