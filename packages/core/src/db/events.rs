//! Domain Events for theory, skill and catalog changes
//!
//! Services emit these after a transaction commits, over a tokio broadcast
//! channel. Subscribers (HTTP push layers, tests, audit logging) receive
//! every change without coupling to the store.
//!
//! # Event Flow
//!
//! 1. A service commits a write transaction
//! 2. The matching event is sent on the broadcast channel
//! 3. Every subscriber receives it asynchronously
//!
//! Events are never sent for rolled-back work.

use crate::models::{Profession, ProgressLink, Quest, Skill, Theory, UserProgress};
use crate::operations::Placement;
use serde::{Deserialize, Serialize};

/// A committed change to a theory forest, the skill list or the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    #[serde(rename = "skill:created")]
    SkillCreated { skill: Skill },

    #[serde(rename = "skill:updated")]
    SkillUpdated { skill: Skill },

    /// Skill deleted together with all of its theories
    #[serde(rename = "skill:deleted", rename_all = "camelCase")]
    SkillDeleted { skill_id: i64 },

    #[serde(rename = "theory:created")]
    TheoryCreated { theory: Theory },

    /// Title, content or difficulty changed
    #[serde(rename = "theory:updated")]
    TheoryUpdated { theory: Theory },

    /// A move committed; `placements` lists every row that changed position
    #[serde(rename = "theory:moved", rename_all = "camelCase")]
    TheoryMoved {
        skill_id: i64,
        theory_id: i64,
        placements: Vec<Placement>,
    },

    /// A theory and its subtree were removed
    #[serde(rename = "theory:deleted", rename_all = "camelCase")]
    TheoryDeleted {
        skill_id: Option<i64>,
        theory_id: i64,
        removed: u64,
    },

    #[serde(rename = "profession:created")]
    ProfessionCreated { profession: Profession },

    #[serde(rename = "profession:deleted", rename_all = "camelCase")]
    ProfessionDeleted { profession_id: i64 },

    #[serde(rename = "profession:skillLinked", rename_all = "camelCase")]
    ProfessionSkillLinked { profession_id: i64, skill_id: i64 },

    /// `skill_removed` is set when the skill lost its last profession and
    /// was deleted with its theories
    #[serde(rename = "profession:skillUnlinked", rename_all = "camelCase")]
    ProfessionSkillUnlinked {
        profession_id: i64,
        skill_id: i64,
        skill_removed: bool,
    },

    #[serde(rename = "quest:created")]
    QuestCreated { quest: Quest },

    /// Linked theories changed
    #[serde(rename = "quest:updated")]
    QuestUpdated { quest: Quest },

    #[serde(rename = "quest:deleted", rename_all = "camelCase")]
    QuestDeleted { quest_id: i64 },

    #[serde(rename = "progress:created")]
    ProgressCreated { progress: UserProgress },

    /// `target_id` was added to (`recorded`) or removed from one id set
    #[serde(rename = "progress:updated", rename_all = "camelCase")]
    ProgressUpdated {
        kind: ProgressLink,
        target_id: i64,
        recorded: bool,
    },
}

impl DomainEvent {
    /// String form of the event type, as used in the `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::SkillCreated { .. } => "skill:created",
            DomainEvent::SkillUpdated { .. } => "skill:updated",
            DomainEvent::SkillDeleted { .. } => "skill:deleted",
            DomainEvent::TheoryCreated { .. } => "theory:created",
            DomainEvent::TheoryUpdated { .. } => "theory:updated",
            DomainEvent::TheoryMoved { .. } => "theory:moved",
            DomainEvent::TheoryDeleted { .. } => "theory:deleted",
            DomainEvent::ProfessionCreated { .. } => "profession:created",
            DomainEvent::ProfessionDeleted { .. } => "profession:deleted",
            DomainEvent::ProfessionSkillLinked { .. } => "profession:skillLinked",
            DomainEvent::ProfessionSkillUnlinked { .. } => "profession:skillUnlinked",
            DomainEvent::QuestCreated { .. } => "quest:created",
            DomainEvent::QuestUpdated { .. } => "quest:updated",
            DomainEvent::QuestDeleted { .. } => "quest:deleted",
            DomainEvent::ProgressCreated { .. } => "progress:created",
            DomainEvent::ProgressUpdated { .. } => "progress:updated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The `type` tag is flattened next to the payload fields, not nested.
    #[test]
    fn test_moved_event_serialization_contract() {
        let event = DomainEvent::TheoryMoved {
            skill_id: 1,
            theory_id: 10,
            placements: vec![Placement {
                theory_id: 10,
                parent_id: Some(2),
                order_index: 0,
            }],
        };

        let parsed: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(parsed["type"], "theory:moved");
        assert_eq!(parsed["skillId"], 1);
        assert_eq!(parsed["theoryId"], 10);
        assert_eq!(parsed["placements"][0]["parentId"], 2);
        assert_eq!(parsed["placements"][0]["orderIndex"], 0);
        assert_eq!(event.event_type(), "theory:moved");
    }

    #[test]
    fn test_event_type_matches_tag() {
        let event = DomainEvent::TheoryDeleted {
            skill_id: Some(3),
            theory_id: 7,
            removed: 2,
        };
        let parsed = serde_json::to_value(&event).unwrap();
        assert_eq!(parsed["type"], event.event_type());
        assert_eq!(parsed["removed"], 2);
    }

    #[test]
    fn test_progress_event_uses_path_segment_kind() {
        let event = DomainEvent::ProgressUpdated {
            kind: ProgressLink::CompletedQuests,
            target_id: 4,
            recorded: true,
        };
        let parsed = serde_json::to_value(&event).unwrap();
        assert_eq!(parsed["type"], "progress:updated");
        assert_eq!(parsed["kind"], "completed-quests");
        assert_eq!(parsed["targetId"], 4);
    }
}
