//! CatalogStore Trait - professions, quests and learner progress
//!
//! These records sit around the theory forests without touching their
//! ordering, so they live behind their own trait. The link tables are sets:
//! linking twice or unlinking something absent is reported through the
//! return value, never as a database error.

use crate::db::error::DatabaseError;
use crate::models::{
    NewProfession, NewQuest, NewSkill, NewUserProgress, Profession, ProgressLink, Quest, Skill,
    UserProgress,
};
use async_trait::async_trait;

/// Outcome of detaching a skill from a profession
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillUnlink {
    /// The skill was not attached to that profession
    NotLinked,

    /// Detached; the skill still serves another profession
    Unlinked,

    /// Detached, and the skill was deleted with its theories because no
    /// profession referenced it any more
    UnlinkedAndDeleted,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    //
    // PROFESSIONS
    //

    async fn create_profession(
        &self,
        profession: NewProfession,
    ) -> Result<Profession, DatabaseError>;

    async fn get_profession(&self, id: i64) -> Result<Option<Profession>, DatabaseError>;

    /// All professions ordered by id
    async fn list_professions(&self) -> Result<Vec<Profession>, DatabaseError>;

    /// Delete a profession; its skills survive
    async fn delete_profession(&self, id: i64) -> Result<bool, DatabaseError>;

    /// Skills attached to a profession, ordered by id
    async fn profession_skills(&self, profession_id: i64) -> Result<Vec<Skill>, DatabaseError>;

    /// Create a skill and attach it in one transaction
    async fn create_profession_skill(
        &self,
        profession_id: i64,
        skill: NewSkill,
    ) -> Result<Skill, DatabaseError>;

    /// Attach an existing skill; `false` when it was already attached
    async fn link_skill(&self, profession_id: i64, skill_id: i64) -> Result<bool, DatabaseError>;

    /// Detach a skill, deleting it once no profession references it
    async fn unlink_skill(
        &self,
        profession_id: i64,
        skill_id: i64,
    ) -> Result<SkillUnlink, DatabaseError>;

    //
    // QUESTS
    //

    async fn create_quest(&self, quest: NewQuest) -> Result<Quest, DatabaseError>;

    async fn get_quest(&self, id: i64) -> Result<Option<Quest>, DatabaseError>;

    /// All quests ordered by id, each with its linked theory ids
    async fn list_quests(&self) -> Result<Vec<Quest>, DatabaseError>;

    async fn delete_quest(&self, id: i64) -> Result<bool, DatabaseError>;

    /// `false` when the theory was already linked
    async fn link_theory(&self, quest_id: i64, theory_id: i64) -> Result<bool, DatabaseError>;

    /// `false` when the theory was not linked
    async fn unlink_theory(&self, quest_id: i64, theory_id: i64) -> Result<bool, DatabaseError>;

    //
    // PROGRESS
    //

    async fn get_progress(&self, id: i64) -> Result<Option<UserProgress>, DatabaseError>;

    /// Insert a progress record under a caller-chosen id
    ///
    /// Returns `None` when a record with that id already exists.
    async fn create_progress(
        &self,
        id: i64,
        progress: NewUserProgress,
    ) -> Result<Option<UserProgress>, DatabaseError>;

    /// `false` when `target_id` was already recorded under `kind`
    async fn add_progress_link(
        &self,
        progress_id: i64,
        kind: ProgressLink,
        target_id: i64,
    ) -> Result<bool, DatabaseError>;

    /// `false` when `target_id` was not recorded under `kind`
    async fn remove_progress_link(
        &self,
        progress_id: i64,
        kind: ProgressLink,
        target_id: i64,
    ) -> Result<bool, DatabaseError>;
}
