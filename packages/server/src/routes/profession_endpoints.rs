//! Profession Endpoints
//!
//! # Endpoints
//!
//! - `GET /api/professions` - List professions
//! - `POST /api/professions` - Create a profession
//! - `DELETE /api/professions/:id` - Delete a profession (its skills stay)
//! - `GET /api/professions/:id/skills` - Skills of a profession
//! - `POST /api/professions/:id/skills` - Create a skill inside a profession
//! - `PUT /api/professions/:id/skills/:skill_id` - Attach an existing skill
//! - `DELETE /api/professions/:id/skills/:skill_id` - Detach a skill

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{delete, get, put},
    Router,
};

use crate::extract::{ApiJson, ApiPath};
use crate::{AppState, HttpError};
use learner_core::models::{NewProfession, NewSkill, Profession, Skill};

async fn list_professions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Profession>>, HttpError> {
    Ok(Json(state.professions.list_professions().await?))
}

/// Create a profession
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:3001/api/professions \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Backend developer", "icon": "🗄"}'
/// ```
async fn create_profession(
    State(state): State<AppState>,
    ApiJson(profession): ApiJson<NewProfession>,
) -> Result<(StatusCode, Json<Profession>), HttpError> {
    let created = state.professions.create_profession(profession).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_profession(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, HttpError> {
    state.professions.delete_profession(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_skills(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<Skill>>, HttpError> {
    Ok(Json(state.professions.list_skills(id).await?))
}

async fn add_new_skill(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(skill): ApiJson<NewSkill>,
) -> Result<(StatusCode, Json<Skill>), HttpError> {
    let created = state.professions.add_new_skill(id, skill).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Attach an existing skill; 409 when it is already attached
async fn attach_skill(
    State(state): State<AppState>,
    ApiPath((id, skill_id)): ApiPath<(i64, i64)>,
) -> Result<Json<Skill>, HttpError> {
    Ok(Json(state.professions.attach_skill(id, skill_id).await?))
}

/// Detach a skill; a skill left without professions is deleted
async fn detach_skill(
    State(state): State<AppState>,
    ApiPath((id, skill_id)): ApiPath<(i64, i64)>,
) -> Result<StatusCode, HttpError> {
    state.professions.detach_skill(id, skill_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/professions",
            get(list_professions).post(create_profession),
        )
        .route("/api/professions/:id", delete(delete_profession))
        .route(
            "/api/professions/:id/skills",
            get(list_skills).post(add_new_skill),
        )
        .route(
            "/api/professions/:id/skills/:skill_id",
            put(attach_skill).delete(detach_skill),
        )
        .with_state(state)
}
