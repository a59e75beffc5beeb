//! Service Layer Error Types
//!
//! This module defines error types for service-layer operations, providing
//! detailed error handling for business logic failures.

use crate::db::DatabaseError;
use crate::models::ValidationError;
use std::time::Duration;
use thiserror::Error;

/// Service operation errors
///
/// Every failure leaves the database unchanged: services only raise these
/// before commit, and an uncommitted transaction is rolled back.
#[derive(Error, Debug)]
pub enum TheoryServiceError {
    #[error("Skill not found: {id}")]
    SkillNotFound { id: i64 },

    #[error("Theory not found: {id}")]
    TheoryNotFound { id: i64 },

    #[error("Profession not found: {id}")]
    ProfessionNotFound { id: i64 },

    #[error("Quest not found: {id}")]
    QuestNotFound { id: i64 },

    #[error("User progress not found")]
    ProgressNotFound,

    /// The record or link being created is already there
    #[error("Already exists: {context}")]
    AlreadyExists { context: String },

    /// The link being removed was never recorded
    #[error("Link not found: {context}")]
    LinkNotFound { context: String },

    /// The requested parent does not exist
    #[error("Parent theory not found: {id}")]
    ParentNotFound { id: i64 },

    /// A theory and its parent would belong to different skills
    #[error("Theory {theory_id} does not belong to skill {skill_id}")]
    CrossSkill { theory_id: i64, skill_id: i64 },

    /// Circular reference detected
    #[error("Circular reference detected: {context}")]
    CircularReference { context: String },

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Another writer held the lock past the busy timeout; safe to retry
    #[error("Concurrent modification: {context}")]
    ConcurrencyConflict { context: String },

    #[error("Operation '{operation}' exceeded its deadline of {}ms", .deadline.as_millis())]
    Timeout {
        operation: &'static str,
        deadline: Duration,
    },

    #[error("Database operation failed: {0}")]
    DatabaseError(DatabaseError),
}

impl From<DatabaseError> for TheoryServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Busy { context } => Self::ConcurrencyConflict { context },
            other => Self::DatabaseError(other),
        }
    }
}

impl TheoryServiceError {
    pub fn skill_not_found(id: i64) -> Self {
        Self::SkillNotFound { id }
    }

    pub fn theory_not_found(id: i64) -> Self {
        Self::TheoryNotFound { id }
    }

    pub fn profession_not_found(id: i64) -> Self {
        Self::ProfessionNotFound { id }
    }

    pub fn quest_not_found(id: i64) -> Self {
        Self::QuestNotFound { id }
    }

    pub fn already_exists(context: impl Into<String>) -> Self {
        Self::AlreadyExists {
            context: context.into(),
        }
    }

    pub fn link_not_found(context: impl Into<String>) -> Self {
        Self::LinkNotFound {
            context: context.into(),
        }
    }

    pub fn parent_not_found(id: i64) -> Self {
        Self::ParentNotFound { id }
    }

    pub fn cross_skill(theory_id: i64, skill_id: i64) -> Self {
        Self::CrossSkill {
            theory_id,
            skill_id,
        }
    }

    /// Create a circular reference error
    pub fn circular_reference(context: impl Into<String>) -> Self {
        Self::CircularReference {
            context: context.into(),
        }
    }

    pub fn concurrency_conflict(context: impl Into<String>) -> Self {
        Self::ConcurrencyConflict {
            context: context.into(),
        }
    }

    pub fn timeout(operation: &'static str, deadline: Duration) -> Self {
        Self::Timeout {
            operation,
            deadline,
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrencyConflict { .. } | Self::Timeout { .. }
        )
    }
}
