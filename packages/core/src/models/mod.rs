//! Data Models
//!
//! This module contains the data structures used throughout Learner:
//!
//! - `Skill` - A subject area that owns one forest of theories
//! - `Theory` - A persisted theory row (parent/child links as ids)
//! - `TheoryTree` - The derived nested view produced by materialization
//! - `Profession` - A career path grouping skills (many-to-many)
//! - `Quest` - A practical task linked to the theories it exercises
//! - `UserProgress` - Completed theories/quests and selected professions
//!
//! Request payloads (`NewTheory`, `TheoryUpdate`, `MoveTheory`, ...) live next
//! to the entity they target and carry their own validation.

mod profession;
mod progress;
mod quest;
mod skill;
mod theory;

pub use profession::{NewProfession, Profession};
pub use progress::{NewUserProgress, ProgressLink, UserProgress};
pub use quest::{NewQuest, Quest};
pub use skill::{NewSkill, Skill, SkillUpdate};
pub use theory::{MoveTheory, NewTheory, Theory, TheoryTree, TheoryUpdate, ValidationError};
