//! Progress Service
//!
//! A single learner per installation: the progress record always lives under
//! [`USER_PROGRESS_ID`]. Recording completions does not award points.

use crate::db::{CatalogStore, DomainEvent, TheoryStore};
use crate::models::{NewUserProgress, ProgressLink, UserProgress};
use crate::services::error::TheoryServiceError;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Id of the one progress record
pub const USER_PROGRESS_ID: i64 = 1;

#[derive(Clone)]
pub struct ProgressService {
    theories: Arc<dyn TheoryStore>,
    catalog: Arc<dyn CatalogStore>,
    event_tx: broadcast::Sender<DomainEvent>,
}

impl ProgressService {
    pub fn new(
        theories: Arc<dyn TheoryStore>,
        catalog: Arc<dyn CatalogStore>,
        event_tx: broadcast::Sender<DomainEvent>,
    ) -> Self {
        Self {
            theories,
            catalog,
            event_tx,
        }
    }

    fn emit_event(&self, event: DomainEvent) {
        let _ = self.event_tx.send(event);
    }

    pub async fn get_progress(&self) -> Result<UserProgress, TheoryServiceError> {
        self.catalog
            .get_progress(USER_PROGRESS_ID)
            .await?
            .ok_or(TheoryServiceError::ProgressNotFound)
    }

    /// Create the progress record; fails when it already exists
    pub async fn create_progress(
        &self,
        progress: NewUserProgress,
    ) -> Result<UserProgress, TheoryServiceError> {
        progress.validate()?;

        let created = self
            .catalog
            .create_progress(USER_PROGRESS_ID, progress)
            .await?
            .ok_or_else(|| {
                TheoryServiceError::already_exists(format!(
                    "user progress {} already exists",
                    USER_PROGRESS_ID
                ))
            })?;

        tracing::info!("Created user progress for {}", created.user_name);
        self.emit_event(DomainEvent::ProgressCreated {
            progress: created.clone(),
        });
        Ok(created)
    }

    /// Add `target_id` to one of the progress id sets
    pub async fn record(
        &self,
        kind: ProgressLink,
        target_id: i64,
    ) -> Result<UserProgress, TheoryServiceError> {
        self.get_progress().await?;
        self.ensure_target_exists(kind, target_id).await?;

        if !self
            .catalog
            .add_progress_link(USER_PROGRESS_ID, kind, target_id)
            .await?
        {
            return Err(TheoryServiceError::already_exists(format!(
                "{} already contains {}",
                kind, target_id
            )));
        }

        tracing::debug!("Recorded {} {}", kind, target_id);
        self.emit_event(DomainEvent::ProgressUpdated {
            kind,
            target_id,
            recorded: true,
        });
        self.get_progress().await
    }

    /// Remove `target_id` from one of the progress id sets
    pub async fn clear(
        &self,
        kind: ProgressLink,
        target_id: i64,
    ) -> Result<UserProgress, TheoryServiceError> {
        self.get_progress().await?;

        if !self
            .catalog
            .remove_progress_link(USER_PROGRESS_ID, kind, target_id)
            .await?
        {
            return Err(TheoryServiceError::link_not_found(format!(
                "{} does not contain {}",
                kind, target_id
            )));
        }

        tracing::debug!("Cleared {} {}", kind, target_id);
        self.emit_event(DomainEvent::ProgressUpdated {
            kind,
            target_id,
            recorded: false,
        });
        self.get_progress().await
    }

    async fn ensure_target_exists(
        &self,
        kind: ProgressLink,
        target_id: i64,
    ) -> Result<(), TheoryServiceError> {
        let found = match kind {
            ProgressLink::CompletedTheories => {
                self.theories.get_theory(target_id).await?.is_some()
            }
            ProgressLink::CompletedQuests => self.catalog.get_quest(target_id).await?.is_some(),
            ProgressLink::SelectedProfessions => {
                self.catalog.get_profession(target_id).await?.is_some()
            }
        };
        if found {
            return Ok(());
        }

        Err(match kind {
            ProgressLink::CompletedTheories => TheoryServiceError::theory_not_found(target_id),
            ProgressLink::CompletedQuests => TheoryServiceError::quest_not_found(target_id),
            ProgressLink::SelectedProfessions => {
                TheoryServiceError::profession_not_found(target_id)
            }
        })
    }
}
