//! Learner progress
//!
//! One progress record per installation. It tracks which theories and quests
//! the learner finished and which professions they follow.

use super::theory::{require_text, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub id: i64,
    pub user_name: String,
    pub total_experience_points: i64,
    pub total_gold_points: i64,
    pub completed_theories: Vec<i64>,
    pub completed_quests: Vec<i64>,
    pub selected_professions: Vec<i64>,
}

impl UserProgress {
    /// Ids recorded under `kind`
    pub fn links(&self, kind: ProgressLink) -> &[i64] {
        match kind {
            ProgressLink::CompletedTheories => &self.completed_theories,
            ProgressLink::CompletedQuests => &self.completed_quests,
            ProgressLink::SelectedProfessions => &self.selected_professions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserProgress {
    pub user_name: String,
}

impl NewUserProgress {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("userName", &self.user_name)
    }
}

/// The id sets a progress record keeps
///
/// Serialized in kebab case so it can be used directly as a path segment,
/// e.g. `completed-theories`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressLink {
    CompletedTheories,
    CompletedQuests,
    SelectedProfessions,
}

impl ProgressLink {
    pub const ALL: [ProgressLink; 3] = [
        ProgressLink::CompletedTheories,
        ProgressLink::CompletedQuests,
        ProgressLink::SelectedProfessions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressLink::CompletedTheories => "completed-theories",
            ProgressLink::CompletedQuests => "completed-quests",
            ProgressLink::SelectedProfessions => "selected-professions",
        }
    }
}

impl fmt::Display for ProgressLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
