//! Business Services
//!
//! This module contains the core business logic services:
//!
//! - `TheoryService` - Tree materialization, insertion, moves and deletion
//! - `SkillService` - Skill CRUD
//! - `ProfessionService` - Professions and their skill links
//! - `QuestService` - Quests and their theory links
//! - `ProgressService` - The learner's completions and selected professions
//!
//! Services coordinate between the database layer and application logic,
//! implementing business rules and owning transaction boundaries.

pub mod error;
pub mod profession_service;
pub mod progress_service;
pub mod quest_service;
pub mod skill_service;
pub mod theory_service;

pub use error::TheoryServiceError;
pub use profession_service::ProfessionService;
pub use progress_service::{ProgressService, USER_PROGRESS_ID};
pub use quest_service::QuestService;
pub use skill_service::SkillService;
pub use theory_service::{ContiguityReport, TheoryService};
