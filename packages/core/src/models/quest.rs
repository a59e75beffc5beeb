//! Quest records
//!
//! A quest is a practical task with point rewards. It can reference any
//! number of theories that prepare for it; the links carry no order.

use super::theory::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: i64,

    pub name: Option<String>,

    pub description: Option<String>,

    /// Short teaser shown in quest lists
    pub preview: Option<String>,

    pub reward_points: i64,
    pub reading_points: i64,
    pub listening_points: i64,
    pub speaking_points: i64,
    pub writing_points: i64,

    /// Ids of the linked theories, ascending
    #[serde(default)]
    pub theories: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub preview: Option<String>,

    #[serde(default)]
    pub reward_points: i64,
    #[serde(default)]
    pub reading_points: i64,
    #[serde(default)]
    pub listening_points: i64,
    #[serde(default)]
    pub speaking_points: i64,
    #[serde(default)]
    pub writing_points: i64,
}

impl NewQuest {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Text fields may be absent but not blank; points are non-negative
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("name", &self.name),
            ("description", &self.description),
            ("preview", &self.preview),
        ] {
            if let Some(text) = value {
                require_text(field, text)?;
            }
        }

        for (field, value) in [
            ("rewardPoints", self.reward_points),
            ("readingPoints", self.reading_points),
            ("listeningPoints", self.listening_points),
            ("speakingPoints", self.speaking_points),
            ("writingPoints", self.writing_points),
        ] {
            if value < 0 {
                return Err(ValidationError::NegativeValue {
                    field: field.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}
