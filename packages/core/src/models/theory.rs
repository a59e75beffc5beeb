//! Theory Data Structures
//!
//! A theory is one unit of learning material. Theories belong to a skill and
//! form an ordered forest: every theory has at most one parent (same skill),
//! and siblings are ranked by a zero-based, gap-free `order_index`.
//!
//! # Flat rows vs. nested view
//!
//! - [`Theory`] is the persisted row. Parent/child links are plain ids.
//! - [`TheoryTree`] is the derived nested view produced by the tree
//!   materializer. Children only exist in this view and are never stored.
//!
//! # Examples
//!
//! ```rust
//! use learner_core::models::NewTheory;
//!
//! let draft = NewTheory::new("Ownership", "Every value has a single owner.");
//! assert!(draft.validate().is_ok());
//! assert_eq!(draft.parent_id, None);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for skill and theory payloads
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{0}' must not be blank")]
    BlankField(String),

    #[error("Field '{field}' must be non-negative, got {value}")]
    NegativeValue { field: String, value: i64 },
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field.to_string()));
    }
    Ok(())
}

/// A persisted theory row
///
/// Serialized field names follow the public API: `difficultyLevel`,
/// `orderIndex`, and the parent/skill ids exposed as `parent` and `skill`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theory {
    /// Store-assigned identity, immutable after creation
    pub id: i64,

    pub title: String,

    pub content: String,

    #[serde(default)]
    pub difficulty_level: i64,

    /// Rank among siblings sharing `(skill_id, parent_id)`
    pub order_index: i64,

    /// Parent theory, `None` for a root of the skill's forest
    #[serde(rename = "parent")]
    pub parent_id: Option<i64>,

    /// Owning skill
    #[serde(rename = "skill")]
    pub skill_id: Option<i64>,
}

impl Theory {
    /// Whether this row belongs to the sibling group `(skill_id, parent_id)`
    pub fn is_in_group(&self, skill_id: i64, parent_id: Option<i64>) -> bool {
        self.skill_id == Some(skill_id) && self.parent_id == parent_id
    }
}

/// Materialized tree node: a theory plus its ordered sub-theories
///
/// Serializes flat, i.e. the theory's fields followed by `subTheories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TheoryTree {
    #[serde(flatten)]
    pub node: Theory,

    #[serde(rename = "subTheories", default)]
    pub children: Vec<TheoryTree>,
}

impl TheoryTree {
    /// Number of theories in this subtree, including the root
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TheoryTree::size).sum::<usize>()
    }
}

/// Payload for creating a theory under a skill
///
/// The order index is never supplied by callers; the insertion policy
/// appends the new theory after its last sibling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTheory {
    pub title: String,

    pub content: String,

    #[serde(default)]
    pub difficulty_level: i64,

    /// Optional parent theory (must belong to the same skill)
    #[serde(default, rename = "parent")]
    pub parent_id: Option<i64>,
}

impl NewTheory {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            difficulty_level: 0,
            parent_id: None,
        }
    }

    /// Builder-style parent assignment
    pub fn under(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_difficulty(mut self, difficulty_level: i64) -> Self {
        self.difficulty_level = difficulty_level;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("content", &self.content)?;
        if self.difficulty_level < 0 {
            return Err(ValidationError::NegativeValue {
                field: "difficultyLevel".to_string(),
                value: self.difficulty_level,
            });
        }
        Ok(())
    }
}

/// Sparse field edit for a theory
///
/// Only the opaque fields can be edited here. Parent and order changes go
/// through the reorder engine so sibling groups stay contiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheoryUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<i64>,
}

impl TheoryUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.difficulty_level.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let Some(content) = &self.content {
            require_text("content", content)?;
        }
        if let Some(level) = self.difficulty_level {
            if level < 0 {
                return Err(ValidationError::NegativeValue {
                    field: "difficultyLevel".to_string(),
                    value: level,
                });
            }
        }
        Ok(())
    }
}

/// Relocation request handled by the reorder engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTheory {
    pub target_theory_id: i64,

    /// Requested zero-based position; out-of-range values are clamped
    pub new_index_position: i64,

    /// Destination parent, `None` to make the theory a root
    #[serde(default)]
    pub new_parent_id: Option<i64>,
}
