//! Theory Service - Tree Engine Orchestration
//!
//! `TheoryService` applies the domain rules around the theory forest:
//!
//! - **Materialization**: breadth-first, one store query per tree level,
//!   inside one read snapshot
//! - **Insertion**: appends after the current maximum order index of the
//!   target sibling group, in the same write transaction as the insert
//! - **Moves**: validates skill membership and acyclicity, then renumbers the
//!   source and destination sibling groups and commits them as one unit
//! - **Deletion**: removes the subtree and closes the gap it leaves
//!
//! Every mutation runs in a single write transaction. Nothing is committed on
//! any error path, including a missed deadline.
//!
//! # Examples
//!
//! ```no_run
//! # use learner_core::db::{DatabaseService, LibsqlTheoryStore};
//! # use learner_core::models::{MoveTheory, NewSkill, NewTheory};
//! # use learner_core::services::{SkillService, TheoryService};
//! # use std::path::PathBuf;
//! # use std::sync::Arc;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Arc::new(DatabaseService::new(PathBuf::from("./learner.db")).await?);
//! let store = Arc::new(LibsqlTheoryStore::new(db));
//! let theories = TheoryService::new(store.clone());
//! let skills = SkillService::new(store, theories.event_sender());
//!
//! let skill = skills.create_skill(NewSkill::new("Rust", "🦀")).await?;
//! let basics = theories.add_theory(skill.id, NewTheory::new("Basics", "...")).await?;
//! let traits = theories.add_theory(skill.id, NewTheory::new("Traits", "...")).await?;
//!
//! theories
//!     .move_theory(skill.id, MoveTheory {
//!         target_theory_id: traits.id,
//!         new_index_position: 0,
//!         new_parent_id: Some(basics.id),
//!     })
//!     .await?;
//!
//! let forest = theories.get_tree(skill.id).await?;
//! assert_eq!(forest[0].children[0].node.id, traits.id);
//! # Ok(())
//! # }
//! ```

use crate::db::{DomainEvent, TheoryStore, TheoryTransaction};
use crate::models::{MoveTheory, NewTheory, Theory, TheoryTree, TheoryUpdate};
use crate::operations::{
    contiguity_violations, next_order_index, plan_gap_close, plan_move, GroupViolation, MovePlan,
    TreeAssembler,
};
use crate::services::error::TheoryServiceError;
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// Capacity of the domain event channel
pub(crate) const DOMAIN_EVENT_CHANNEL_CAPACITY: usize = 128;

/// Contiguity check result for one skill
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContiguityReport {
    pub skill_id: i64,
    pub theory_count: usize,
    /// Sibling groups whose order indices are not exactly `0..count`
    pub violations: Vec<GroupViolation>,
}

impl ContiguityReport {
    pub fn is_contiguous(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Service owning the theory forest rules
#[derive(Clone)]
pub struct TheoryService {
    store: Arc<dyn TheoryStore>,

    /// Broadcast channel for domain events (128 subscriber capacity)
    event_tx: broadcast::Sender<DomainEvent>,

    /// Upper bound on a single tree operation, `None` for no limit
    deadline: Option<Duration>,
}

impl TheoryService {
    pub fn new(store: Arc<dyn TheoryStore>) -> Self {
        let (event_tx, _) = broadcast::channel(DOMAIN_EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            event_tx,
            deadline: None,
        }
    }

    /// Abort tree operations that run longer than `deadline`
    ///
    /// An aborted operation drops its transaction before commit, so the store
    /// is left unchanged.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Subscribe to domain events
    ///
    /// Returns a receiver for every committed change made through this
    /// service or any service sharing its sender.
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.event_tx.subscribe()
    }

    /// Sender shared with sibling services so all events reach one channel
    pub fn event_sender(&self) -> broadcast::Sender<DomainEvent> {
        self.event_tx.clone()
    }

    /// Emit a domain event to all subscribers
    ///
    /// Ignores errors if no subscribers (expected in some tests).
    fn emit_event(&self, event: DomainEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Run one tree operation under the configured deadline
    ///
    /// The deadline is enforced twice: `tokio::time::timeout` abandons work
    /// that is parked on an await, and [`Budget::commit`] refuses to commit
    /// once the deadline has passed. libsql local calls complete without
    /// yielding, so only the second check catches slow work on the real
    /// store.
    async fn run_with_deadline<T, F, Fut>(
        &self,
        operation: &'static str,
        work: F,
    ) -> Result<T, TheoryServiceError>
    where
        F: FnOnce(Budget) -> Fut,
        Fut: Future<Output = Result<T, TheoryServiceError>>,
    {
        let budget = Budget::start(operation, self.deadline);
        match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, work(budget)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        "{} exceeded its deadline of {}ms, transaction abandoned",
                        operation,
                        deadline.as_millis()
                    );
                    Err(TheoryServiceError::timeout(operation, deadline))
                }
            },
            None => work(budget).await,
        }
    }

    //
    // TREE MATERIALIZATION
    //

    /// Materialize the forest of a skill in display order
    ///
    /// Returns an empty forest for a skill without theories and
    /// `SkillNotFound` for an unknown skill.
    #[tracing::instrument(skip(self))]
    pub async fn get_tree(&self, skill_id: i64) -> Result<Vec<TheoryTree>, TheoryServiceError> {
        self.run_with_deadline("get_tree", |budget| self.materialize(skill_id, budget))
            .await
    }

    async fn materialize(
        &self,
        skill_id: i64,
        budget: Budget,
    ) -> Result<Vec<TheoryTree>, TheoryServiceError> {
        let tx = self.store.begin_read().await?;

        if !tx.skill_exists(skill_id).await? {
            return Err(TheoryServiceError::skill_not_found(skill_id));
        }

        let roots = tx.root_theories(skill_id).await?;
        let (mut assembler, mut frontier) = TreeAssembler::from_roots(roots);

        let mut depth = 0usize;
        while !frontier.is_empty() {
            let level = tx.children_of(&frontier).await?;
            depth += 1;
            tracing::debug!(
                "Skill {} level {}: {} parents, {} children",
                skill_id,
                depth,
                frontier.len(),
                level.len()
            );
            frontier = assembler.attach_level(level);
        }

        tx.rollback().await?;
        budget.check()?;

        tracing::debug!(
            "Materialized {} theories for skill {} in {} levels",
            assembler.len(),
            skill_id,
            depth
        );
        Ok(assembler.into_forest())
    }

    //
    // INSERTION
    //

    /// Create a theory at the end of its sibling group
    #[tracing::instrument(skip(self, theory), fields(parent_id = ?theory.parent_id))]
    pub async fn add_theory(
        &self,
        skill_id: i64,
        theory: NewTheory,
    ) -> Result<Theory, TheoryServiceError> {
        theory.validate()?;
        self.run_with_deadline("add_theory", |budget| self.insert(skill_id, theory, budget))
            .await
    }

    async fn insert(
        &self,
        skill_id: i64,
        theory: NewTheory,
        budget: Budget,
    ) -> Result<Theory, TheoryServiceError> {
        let tx = self.store.begin_write().await?;

        if !tx.skill_exists(skill_id).await? {
            return Err(TheoryServiceError::skill_not_found(skill_id));
        }

        if let Some(parent_id) = theory.parent_id {
            let parent = tx
                .get_theory(parent_id)
                .await?
                .ok_or_else(|| TheoryServiceError::parent_not_found(parent_id))?;
            if parent.skill_id != Some(skill_id) {
                tracing::warn!(
                    "Rejected insert under theory {} which is outside skill {}",
                    parent_id,
                    skill_id
                );
                return Err(TheoryServiceError::cross_skill(parent_id, skill_id));
            }
        }

        let current_max = tx.max_order_index(skill_id, theory.parent_id).await?;
        let order_index = next_order_index(current_max);
        let created = tx.insert_theory(skill_id, &theory, order_index).await?;

        budget.commit(tx).await?;

        tracing::info!(
            "Created theory {} in skill {} at order index {}",
            created.id,
            skill_id,
            order_index
        );
        self.emit_event(DomainEvent::TheoryCreated {
            theory: created.clone(),
        });
        Ok(created)
    }

    //
    // REORDERING
    //

    /// Move a theory to a new parent (or to the roots) at a sibling position
    ///
    /// The requested index is clamped into the destination group. Returns
    /// the applied plan; a move to the current position commits nothing.
    #[tracing::instrument(skip(self))]
    pub async fn move_theory(
        &self,
        skill_id: i64,
        request: MoveTheory,
    ) -> Result<MovePlan, TheoryServiceError> {
        self.run_with_deadline("move_theory", |budget| self.relocate(skill_id, request, budget))
            .await
    }

    async fn relocate(
        &self,
        skill_id: i64,
        request: MoveTheory,
        budget: Budget,
    ) -> Result<MovePlan, TheoryServiceError> {
        let tx = self.store.begin_write().await?;

        if !tx.skill_exists(skill_id).await? {
            return Err(TheoryServiceError::skill_not_found(skill_id));
        }

        let target = tx
            .get_theory(request.target_theory_id)
            .await?
            .ok_or_else(|| TheoryServiceError::theory_not_found(request.target_theory_id))?;
        if target.skill_id != Some(skill_id) {
            tracing::warn!(
                "Rejected move of theory {} through skill {}",
                target.id,
                skill_id
            );
            return Err(TheoryServiceError::cross_skill(target.id, skill_id));
        }

        if let Some(parent_id) = request.new_parent_id {
            if parent_id == target.id {
                return Err(TheoryServiceError::circular_reference(format!(
                    "Cannot move theory {} under itself",
                    target.id
                )));
            }

            let parent = tx
                .get_theory(parent_id)
                .await?
                .ok_or_else(|| TheoryServiceError::parent_not_found(parent_id))?;
            if parent.skill_id != Some(skill_id) {
                tracing::warn!(
                    "Rejected move of theory {} under theory {} outside skill {}",
                    target.id,
                    parent_id,
                    skill_id
                );
                return Err(TheoryServiceError::cross_skill(parent_id, skill_id));
            }

            ensure_not_ancestor(tx.as_ref(), target.id, &parent).await?;
        }

        let source = tx.sibling_group(skill_id, target.parent_id).await?;
        let destination = if target.parent_id == request.new_parent_id {
            source.clone()
        } else {
            tx.sibling_group(skill_id, request.new_parent_id).await?
        };

        let plan = plan_move(
            &target,
            request.new_parent_id,
            request.new_index_position,
            &source,
            &destination,
        );

        if plan.is_noop() {
            tx.rollback().await?;
            tracing::debug!("Theory {} already at requested position", target.id);
            return Ok(plan);
        }

        tx.apply_placements(&plan.placements).await?;
        budget.commit(tx).await?;

        tracing::info!(
            "Moved theory {} to parent {:?} at index {} ({} rows renumbered)",
            target.id,
            request.new_parent_id,
            plan.final_index,
            plan.placements.len()
        );
        self.emit_event(DomainEvent::TheoryMoved {
            skill_id,
            theory_id: target.id,
            placements: plan.placements.clone(),
        });
        Ok(plan)
    }

    //
    // CRUD
    //

    /// Every theory of every skill, ordered by id
    pub async fn list_theories(&self) -> Result<Vec<Theory>, TheoryServiceError> {
        Ok(self.store.list_theories().await?)
    }

    pub async fn get_theory(&self, id: i64) -> Result<Theory, TheoryServiceError> {
        self.store
            .get_theory(id)
            .await?
            .ok_or_else(|| TheoryServiceError::theory_not_found(id))
    }

    /// Edit title, content or difficulty
    ///
    /// Position changes go through [`TheoryService::move_theory`].
    pub async fn update_theory(
        &self,
        id: i64,
        update: TheoryUpdate,
    ) -> Result<Theory, TheoryServiceError> {
        update.validate()?;

        if update.is_empty() {
            return self.get_theory(id).await;
        }

        let updated = self
            .store
            .update_theory_fields(id, update)
            .await?
            .ok_or_else(|| TheoryServiceError::theory_not_found(id))?;

        tracing::info!("Updated theory {}", id);
        self.emit_event(DomainEvent::TheoryUpdated {
            theory: updated.clone(),
        });
        Ok(updated)
    }

    /// Delete a theory with its subtree and renumber its former siblings
    ///
    /// Returns the number of theories removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete_theory(&self, id: i64) -> Result<u64, TheoryServiceError> {
        self.run_with_deadline("delete_theory", |budget| self.remove(id, budget))
            .await
    }

    async fn remove(&self, id: i64, budget: Budget) -> Result<u64, TheoryServiceError> {
        let tx = self.store.begin_write().await?;

        let target = tx
            .get_theory(id)
            .await?
            .ok_or_else(|| TheoryServiceError::theory_not_found(id))?;

        let removed = tx.delete_subtree(id).await?;

        let mut renumbered = 0;
        if let Some(skill_id) = target.skill_id {
            let remaining = tx.sibling_group(skill_id, target.parent_id).await?;
            let placements = plan_gap_close(&remaining, id);
            renumbered = placements.len();
            tx.apply_placements(&placements).await?;
        }

        budget.commit(tx).await?;

        tracing::info!(
            "Deleted theory {} ({} removed, {} siblings renumbered)",
            id,
            removed,
            renumbered
        );
        self.emit_event(DomainEvent::TheoryDeleted {
            skill_id: target.skill_id,
            theory_id: id,
            removed,
        });
        Ok(removed)
    }

    //
    // DIAGNOSTICS
    //

    /// Report every sibling group of a skill that breaks contiguity
    pub async fn verify_skill(
        &self,
        skill_id: i64,
    ) -> Result<ContiguityReport, TheoryServiceError> {
        if self.store.get_skill(skill_id).await?.is_none() {
            return Err(TheoryServiceError::skill_not_found(skill_id));
        }

        let rows = self.store.list_theories_by_skill(skill_id).await?;
        let violations = contiguity_violations(&rows);
        if !violations.is_empty() {
            tracing::warn!(
                "Skill {} has {} non-contiguous sibling groups",
                skill_id,
                violations.len()
            );
        }

        Ok(ContiguityReport {
            skill_id,
            theory_count: rows.len(),
            violations,
        })
    }
}

/// Time allowance of one tree operation
#[derive(Debug, Clone, Copy)]
struct Budget {
    operation: &'static str,
    started: Instant,
    deadline: Option<Duration>,
}

impl Budget {
    fn start(operation: &'static str, deadline: Option<Duration>) -> Self {
        Self {
            operation,
            started: Instant::now(),
            deadline,
        }
    }

    fn check(&self) -> Result<(), TheoryServiceError> {
        match self.deadline {
            Some(deadline) if self.started.elapsed() > deadline => {
                tracing::warn!(
                    "{} ran {}ms past a {}ms deadline, discarding its work",
                    self.operation,
                    (self.started.elapsed() - deadline).as_millis(),
                    deadline.as_millis()
                );
                Err(TheoryServiceError::timeout(self.operation, deadline))
            }
            _ => Ok(()),
        }
    }

    /// Commit `tx` if the deadline still holds, otherwise roll it back
    async fn commit(&self, tx: Box<dyn TheoryTransaction>) -> Result<(), TheoryServiceError> {
        if let Err(err) = self.check() {
            tx.rollback().await?;
            return Err(err);
        }
        tx.commit().await?;
        Ok(())
    }
}

/// Reject a move that would place `target_id` below itself
///
/// Walks the ancestor chain upward from `new_parent`. A chain that loops
/// without reaching the target is corrupted data and is rejected too.
async fn ensure_not_ancestor(
    tx: &dyn TheoryTransaction,
    target_id: i64,
    new_parent: &Theory,
) -> Result<(), TheoryServiceError> {
    let mut visited = HashSet::from([new_parent.id]);
    let mut next = new_parent.parent_id;

    while let Some(ancestor_id) = next {
        if ancestor_id == target_id {
            tracing::warn!(
                "Rejected move of theory {} under its descendant {}",
                target_id,
                new_parent.id
            );
            return Err(TheoryServiceError::circular_reference(format!(
                "Cannot move theory {} under its descendant {}",
                target_id, new_parent.id
            )));
        }
        if !visited.insert(ancestor_id) {
            return Err(TheoryServiceError::circular_reference(format!(
                "Ancestor chain of theory {} loops at {}",
                new_parent.id, ancestor_id
            )));
        }

        next = match tx.get_theory(ancestor_id).await? {
            Some(ancestor) => ancestor.parent_id,
            None => None,
        };
    }

    Ok(())
}
