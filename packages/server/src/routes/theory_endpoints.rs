//! Theory Endpoints
//!
//! Flat access to individual theories. Moves are scoped to a skill and live
//! in `skill_endpoints`.
//!
//! # Endpoints
//!
//! - `GET /api/theories` - All theories ordered by id
//! - `POST /api/theories` - Append a theory to the skill named in the body
//! - `GET /api/theories/:id` - One theory
//! - `PUT /api/theories/:id` - Edit title, content, difficultyLevel
//! - `DELETE /api/theories/:id` - Delete a theory and its subtree

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::extract::{ApiJson, ApiPath};
use crate::{AppState, HttpError};
use learner_core::models::{NewTheory, Theory, TheoryUpdate};

/// Body of the flat create endpoint: a theory plus its owning skill
#[derive(Debug, Deserialize)]
pub struct NewSkillTheory {
    #[serde(alias = "skillId")]
    pub skill: i64,

    #[serde(flatten)]
    pub theory: NewTheory,
}

async fn list_theories(State(state): State<AppState>) -> Result<Json<Vec<Theory>>, HttpError> {
    Ok(Json(state.theories.list_theories().await?))
}

/// Same insertion rules as `POST /api/skills/:id/theories`
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:3001/api/theories \
///   -H "Content-Type: application/json" \
///   -d '{"skill": 1, "title": "Scales", "content": "C major"}'
/// ```
async fn create_theory(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<NewSkillTheory>,
) -> Result<(StatusCode, Json<Theory>), HttpError> {
    let created = state
        .theories
        .add_theory(request.skill, request.theory)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_theory(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Theory>, HttpError> {
    Ok(Json(state.theories.get_theory(id).await?))
}

/// Partial update of the theory's own fields
///
/// # Example
///
/// ```bash
/// curl -X PUT http://localhost:3001/api/theories/4 \
///   -H "Content-Type: application/json" \
///   -d '{"difficultyLevel": 2}'
/// ```
async fn update_theory(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<TheoryUpdate>,
) -> Result<Json<Theory>, HttpError> {
    Ok(Json(state.theories.update_theory(id, update).await?))
}

async fn delete_theory(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, HttpError> {
    let removed = state.theories.delete_theory(id).await?;
    tracing::debug!("Deleted theory {} ({} rows)", id, removed);
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/theories", get(list_theories).post(create_theory))
        .route(
            "/api/theories/:id",
            get(get_theory).put(update_theory).delete(delete_theory),
        )
        .with_state(state)
}
