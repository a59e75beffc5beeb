//! Skill Endpoints
//!
//! # Endpoints
//!
//! - `GET /api/skills` - List skills
//! - `POST /api/skills` - Create a skill
//! - `PUT /api/skills/:id` - Update name and/or icon
//! - `DELETE /api/skills/:id` - Delete a skill and its theories
//! - `GET /api/skills/:id/theories` - Nested theory forest
//! - `POST /api/skills/:id/theories` - Append a theory
//! - `PUT /api/skills/:id/theories/move-theory` - Move a theory
//! - `GET /api/skills/:id/theories/verify` - Sibling order report

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};

use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{AppState, HttpError};
use learner_core::models::{MoveTheory, NewSkill, NewTheory, Skill, SkillUpdate, Theory, TheoryTree};
use learner_core::services::ContiguityReport;

async fn list_skills(State(state): State<AppState>) -> Result<Json<Vec<Skill>>, HttpError> {
    Ok(Json(state.skills.list_skills().await?))
}

/// Create a skill
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:3001/api/skills \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Guitar", "icon": "🎸"}'
/// ```
async fn create_skill(
    State(state): State<AppState>,
    ApiJson(skill): ApiJson<NewSkill>,
) -> Result<(StatusCode, Json<Skill>), HttpError> {
    let created = state.skills.create_skill(skill).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_skill(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<SkillUpdate>,
) -> Result<Json<Skill>, HttpError> {
    Ok(Json(state.skills.update_skill(id, update).await?))
}

async fn delete_skill(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, HttpError> {
    state.skills.delete_skill(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Materialized theory forest of a skill
///
/// # Example
///
/// ```bash
/// curl http://localhost:3001/api/skills/1/theories
/// ```
async fn get_theory_tree(
    State(state): State<AppState>,
    ApiPath(skill_id): ApiPath<i64>,
) -> Result<Json<Vec<TheoryTree>>, HttpError> {
    Ok(Json(state.theories.get_tree(skill_id).await?))
}

/// Append a theory to a skill, optionally under a parent
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:3001/api/skills/1/theories \
///   -H "Content-Type: application/json" \
///   -d '{"title": "Chords", "content": "C, G, Am, F", "parent": 3}'
/// ```
async fn add_theory(
    State(state): State<AppState>,
    ApiPath(skill_id): ApiPath<i64>,
    ApiJson(theory): ApiJson<NewTheory>,
) -> Result<(StatusCode, Json<Theory>), HttpError> {
    let created = state.theories.add_theory(skill_id, theory).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Move a theory to a new parent and sibling position
///
/// `newParentId` omitted means "make root".
///
/// # Example
///
/// ```bash
/// curl -X PUT "http://localhost:3001/api/skills/1/theories/move-theory?targetTheoryId=7&newIndexPosition=0&newParentId=3"
/// ```
async fn move_theory(
    State(state): State<AppState>,
    ApiPath(skill_id): ApiPath<i64>,
    ApiQuery(request): ApiQuery<MoveTheory>,
) -> Result<StatusCode, HttpError> {
    state.theories.move_theory(skill_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn verify_skill(
    State(state): State<AppState>,
    ApiPath(skill_id): ApiPath<i64>,
) -> Result<Json<ContiguityReport>, HttpError> {
    Ok(Json(state.theories.verify_skill(skill_id).await?))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/skills", get(list_skills).post(create_skill))
        .route("/api/skills/:id", put(update_skill).delete(delete_skill))
        .route(
            "/api/skills/:id/theories",
            get(get_theory_tree).post(add_theory),
        )
        .route("/api/skills/:id/theories/move-theory", put(move_theory))
        .route("/api/skills/:id/theories/verify", get(verify_skill))
        .with_state(state)
}
