//! Skill Service
//!
//! Plain CRUD over skills. Deleting a skill removes its whole forest through
//! the `theories.skill_id` foreign key.

use crate::db::{DomainEvent, TheoryStore};
use crate::models::{NewSkill, Skill, SkillUpdate};
use crate::services::error::TheoryServiceError;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct SkillService {
    store: Arc<dyn TheoryStore>,
    event_tx: broadcast::Sender<DomainEvent>,
}

impl SkillService {
    /// Create a service publishing on an existing event channel
    ///
    /// Pass `TheoryService::event_sender()` so skill and theory events share
    /// one stream.
    pub fn new(store: Arc<dyn TheoryStore>, event_tx: broadcast::Sender<DomainEvent>) -> Self {
        Self { store, event_tx }
    }

    fn emit_event(&self, event: DomainEvent) {
        let _ = self.event_tx.send(event);
    }

    pub async fn list_skills(&self) -> Result<Vec<Skill>, TheoryServiceError> {
        Ok(self.store.list_skills().await?)
    }

    pub async fn get_skill(&self, id: i64) -> Result<Skill, TheoryServiceError> {
        self.store
            .get_skill(id)
            .await?
            .ok_or_else(|| TheoryServiceError::skill_not_found(id))
    }

    pub async fn create_skill(&self, skill: NewSkill) -> Result<Skill, TheoryServiceError> {
        skill.validate()?;

        let created = self.store.create_skill(skill).await?;

        tracing::info!("Created skill {} ({})", created.id, created.name);
        self.emit_event(DomainEvent::SkillCreated {
            skill: created.clone(),
        });
        Ok(created)
    }

    /// Partial update of name and icon
    pub async fn update_skill(
        &self,
        id: i64,
        update: SkillUpdate,
    ) -> Result<Skill, TheoryServiceError> {
        update.validate()?;

        let updated = self
            .store
            .update_skill(id, update)
            .await?
            .ok_or_else(|| TheoryServiceError::skill_not_found(id))?;

        tracing::info!("Updated skill {}", id);
        self.emit_event(DomainEvent::SkillUpdated {
            skill: updated.clone(),
        });
        Ok(updated)
    }

    pub async fn delete_skill(&self, id: i64) -> Result<(), TheoryServiceError> {
        if !self.store.delete_skill(id).await? {
            return Err(TheoryServiceError::skill_not_found(id));
        }

        tracing::info!("Deleted skill {} with its theories", id);
        self.emit_event(DomainEvent::SkillDeleted { skill_id: id });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseService, LibsqlTheoryStore};
    use tempfile::TempDir;

    async fn create_test_service() -> (SkillService, broadcast::Receiver<DomainEvent>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(DatabaseService::new(db_path).await.unwrap());
        let store = Arc::new(LibsqlTheoryStore::new(db));
        let (event_tx, event_rx) = broadcast::channel(16);
        (SkillService::new(store, event_tx), event_rx, temp_dir)
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let (service, _rx, _temp_dir) = create_test_service().await;

        let result = service.create_skill(NewSkill::new("  ", "🎸")).await;

        assert!(matches!(
            result,
            Err(TheoryServiceError::ValidationFailed(_))
        ));
        assert!(service.list_skills().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_skill_lifecycle_emits_events() {
        let (service, mut rx, _temp_dir) = create_test_service().await;

        let skill = service.create_skill(NewSkill::new("Drums", "🥁")).await.unwrap();
        let updated = service
            .update_skill(
                skill.id,
                SkillUpdate {
                    name: None,
                    icon: Some("🪘".to_string()),
                },
            )
            .await
            .unwrap();
        service.delete_skill(skill.id).await.unwrap();

        assert_eq!(updated.name, "Drums");
        assert_eq!(rx.recv().await.unwrap().event_type(), "skill:created");
        assert_eq!(rx.recv().await.unwrap().event_type(), "skill:updated");
        assert_eq!(
            rx.recv().await.unwrap(),
            DomainEvent::SkillDeleted { skill_id: skill.id }
        );
    }

    #[tokio::test]
    async fn test_missing_skill_is_not_found() {
        let (service, _rx, _temp_dir) = create_test_service().await;

        assert!(matches!(
            service.get_skill(42).await,
            Err(TheoryServiceError::SkillNotFound { id: 42 })
        ));
        assert!(matches!(
            service.delete_skill(42).await,
            Err(TheoryServiceError::SkillNotFound { id: 42 })
        ));
        assert!(matches!(
            service
                .update_skill(
                    42,
                    SkillUpdate {
                        name: Some("x".into()),
                        icon: None,
                    },
                )
                .await,
            Err(TheoryServiceError::SkillNotFound { id: 42 })
        ));
    }
}
