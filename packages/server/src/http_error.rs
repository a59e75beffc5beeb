//! HTTP error handling
//!
//! Every failed request answers with the same JSON body:
//! `{"message": ..., "code": ..., "details": ...}`. The status code is derived
//! from the machine-readable `code`.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use learner_core::services::TheoryServiceError;
use serde::{Deserialize, Serialize};

/// HTTP error response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    /// Create a new HTTP error
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Create a new HTTP error with details
    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            code if code.ends_with("_NOT_FOUND") => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CROSS_SKILL" | "CIRCULAR_REFERENCE" => StatusCode::UNPROCESSABLE_ENTITY,
            "CONCURRENCY_CONFLICT" | "TIMEOUT" | "ALREADY_EXISTS" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<TheoryServiceError> for HttpError {
    fn from(err: TheoryServiceError) -> Self {
        let message = err.to_string();
        match err {
            TheoryServiceError::SkillNotFound { .. } => HttpError::new(message, "SKILL_NOT_FOUND"),
            TheoryServiceError::TheoryNotFound { .. } => {
                HttpError::new(message, "THEORY_NOT_FOUND")
            }
            TheoryServiceError::ParentNotFound { .. } => {
                HttpError::new(message, "PARENT_NOT_FOUND")
            }
            TheoryServiceError::ProfessionNotFound { .. } => {
                HttpError::new(message, "PROFESSION_NOT_FOUND")
            }
            TheoryServiceError::QuestNotFound { .. } => HttpError::new(message, "QUEST_NOT_FOUND"),
            TheoryServiceError::ProgressNotFound => HttpError::new(message, "PROGRESS_NOT_FOUND"),
            TheoryServiceError::AlreadyExists { .. } => HttpError::new(message, "ALREADY_EXISTS"),
            TheoryServiceError::LinkNotFound { .. } => HttpError::new(message, "LINK_NOT_FOUND"),
            TheoryServiceError::CrossSkill {
                theory_id,
                skill_id,
            } => HttpError::with_details(
                message,
                "CROSS_SKILL",
                format!("theory_id: {}, skill_id: {}", theory_id, skill_id),
            ),
            TheoryServiceError::CircularReference { .. } => {
                HttpError::new(message, "CIRCULAR_REFERENCE")
            }
            TheoryServiceError::ValidationFailed(_) => HttpError::new(message, "VALIDATION_ERROR"),
            TheoryServiceError::ConcurrencyConflict { .. } => {
                HttpError::new(message, "CONCURRENCY_CONFLICT")
            }
            TheoryServiceError::Timeout { .. } => HttpError::new(message, "TIMEOUT"),
            TheoryServiceError::DatabaseError(ref source) => {
                tracing::error!("Database failure: {:?}", source);
                HttpError::with_details(
                    "Internal database error",
                    "DATABASE_ERROR",
                    source.to_string(),
                )
            }
        }
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        HttpError::with_details(
            "Invalid request body",
            "VALIDATION_ERROR",
            rejection.body_text(),
        )
    }
}

impl From<QueryRejection> for HttpError {
    fn from(rejection: QueryRejection) -> Self {
        HttpError::with_details(
            "Invalid query parameters",
            "VALIDATION_ERROR",
            rejection.body_text(),
        )
    }
}

impl From<PathRejection> for HttpError {
    fn from(rejection: PathRejection) -> Self {
        HttpError::with_details(
            "Invalid path parameter",
            "VALIDATION_ERROR",
            rejection.body_text(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use learner_core::db::DatabaseError;

    #[test]
    fn test_status_codes_by_error_kind() {
        let cases = [
            (TheoryServiceError::skill_not_found(1), StatusCode::NOT_FOUND),
            (TheoryServiceError::parent_not_found(2), StatusCode::NOT_FOUND),
            (
                TheoryServiceError::cross_skill(3, 1),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                TheoryServiceError::circular_reference("loop"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                TheoryServiceError::concurrency_conflict("locked"),
                StatusCode::CONFLICT,
            ),
            (
                TheoryServiceError::already_exists("linked"),
                StatusCode::CONFLICT,
            ),
            (
                TheoryServiceError::profession_not_found(5),
                StatusCode::NOT_FOUND,
            ),
            (
                TheoryServiceError::link_not_found("unlinked"),
                StatusCode::NOT_FOUND,
            ),
            (TheoryServiceError::ProgressNotFound, StatusCode::NOT_FOUND),
            (
                DatabaseError::sql_execution("boom").into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(HttpError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_details_are_omitted_when_absent() {
        let body = serde_json::to_value(HttpError::new("Theory not found: 4", "THEORY_NOT_FOUND"))
            .unwrap();
        assert_eq!(body["code"], "THEORY_NOT_FOUND");
        assert!(body.get("details").is_none());
    }
}
