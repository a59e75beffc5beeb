//! TheoryStore Trait - Persistence Abstraction
//!
//! `TheoryService` never issues SQL. It talks to a [`TheoryStore`] for simple
//! single-statement operations and to a [`TheoryTransaction`] whenever several
//! statements must observe or produce one consistent state (tree reads,
//! insertions, moves, deletions).
//!
//! # Transactions
//!
//! - [`TheoryStore::begin_read`] opens a read transaction. Every level of a
//!   breadth-first materialization sees the same snapshot.
//! - [`TheoryStore::begin_write`] takes the write lock up front. Two writers
//!   touching the same skill are serialized: the second waits (up to the busy
//!   timeout) before it can read the sibling groups the first one is
//!   rewriting.
//!
//! A transaction that is dropped without [`TheoryTransaction::commit`] is
//! rolled back.
//!
//! # Examples
//!
//! ```rust,no_run
//! use learner_core::db::{DatabaseService, LibsqlTheoryStore, TheoryStore, TheoryTransaction};
//! use learner_core::models::NewSkill;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./learner.db")).await?);
//!     let store: Arc<dyn TheoryStore> = Arc::new(LibsqlTheoryStore::new(db));
//!
//!     let skill = store.create_skill(NewSkill::new("Guitar", "🎸")).await?;
//!     let tx = store.begin_read().await?;
//!     let roots = tx.root_theories(skill.id).await?;
//!     tx.rollback().await?;
//!     assert!(roots.is_empty());
//!     Ok(())
//! }
//! ```

use crate::db::error::DatabaseError;
use crate::models::{NewSkill, NewTheory, Skill, SkillUpdate, Theory, TheoryUpdate};
use crate::operations::Placement;
use async_trait::async_trait;

/// Single-statement persistence operations
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one store is shared by every
/// request handler.
#[async_trait]
pub trait TheoryStore: Send + Sync {
    //
    // SKILLS
    //

    async fn create_skill(&self, skill: NewSkill) -> Result<Skill, DatabaseError>;

    async fn get_skill(&self, id: i64) -> Result<Option<Skill>, DatabaseError>;

    /// All skills ordered by id
    async fn list_skills(&self) -> Result<Vec<Skill>, DatabaseError>;

    /// Apply a partial update, returning `None` when the skill does not exist
    async fn update_skill(&self, id: i64, update: SkillUpdate)
        -> Result<Option<Skill>, DatabaseError>;

    /// Delete a skill and, through the foreign key, all of its theories
    ///
    /// Returns `false` when no skill had that id.
    async fn delete_skill(&self, id: i64) -> Result<bool, DatabaseError>;

    //
    // THEORIES
    //

    async fn get_theory(&self, id: i64) -> Result<Option<Theory>, DatabaseError>;

    /// Every theory of every skill, ordered by id
    async fn list_theories(&self) -> Result<Vec<Theory>, DatabaseError>;

    /// Every theory of one skill, grouped by parent and ordered within each group
    async fn list_theories_by_skill(&self, skill_id: i64) -> Result<Vec<Theory>, DatabaseError>;

    /// Rewrite title, content and difficulty; position fields are untouched
    async fn update_theory_fields(
        &self,
        id: i64,
        update: TheoryUpdate,
    ) -> Result<Option<Theory>, DatabaseError>;

    //
    // TRANSACTIONS
    //

    /// Open a consistent read snapshot
    async fn begin_read(&self) -> Result<Box<dyn TheoryTransaction>, DatabaseError>;

    /// Open a transaction holding the write lock
    async fn begin_write(&self) -> Result<Box<dyn TheoryTransaction>, DatabaseError>;

    //
    // LIFECYCLE
    //

    /// Flush pending state to disk before shutdown
    async fn close(&self) -> Result<(), DatabaseError>;
}

/// Statements executed inside one database transaction
#[async_trait]
pub trait TheoryTransaction: Send + Sync {
    async fn skill_exists(&self, skill_id: i64) -> Result<bool, DatabaseError>;

    async fn get_theory(&self, id: i64) -> Result<Option<Theory>, DatabaseError>;

    /// Root theories of a skill (`parent_id IS NULL`) in display order
    async fn root_theories(&self, skill_id: i64) -> Result<Vec<Theory>, DatabaseError>;

    /// Children of every id in `parent_ids`, in display order per parent
    ///
    /// One statement regardless of how many parents are passed.
    async fn children_of(&self, parent_ids: &[i64]) -> Result<Vec<Theory>, DatabaseError>;

    /// Members of the `(skill_id, parent_id)` sibling group in display order
    async fn sibling_group(
        &self,
        skill_id: i64,
        parent_id: Option<i64>,
    ) -> Result<Vec<Theory>, DatabaseError>;

    /// Highest order index in a sibling group, `None` when the group is empty
    async fn max_order_index(
        &self,
        skill_id: i64,
        parent_id: Option<i64>,
    ) -> Result<Option<i64>, DatabaseError>;

    async fn insert_theory(
        &self,
        skill_id: i64,
        theory: &NewTheory,
        order_index: i64,
    ) -> Result<Theory, DatabaseError>;

    /// Rewrite `(parent_id, order_index)` for each placement
    async fn apply_placements(&self, placements: &[Placement]) -> Result<(), DatabaseError>;

    /// Delete a theory with its whole subtree
    ///
    /// Returns the number of theories removed.
    async fn delete_subtree(&self, id: i64) -> Result<u64, DatabaseError>;

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError>;

    async fn rollback(self: Box<Self>) -> Result<(), DatabaseError>;
}
