//! Quest Service
//!
//! Quests and the theories linked to them. Links are unordered and do not
//! affect theory ranks.

use crate::db::{CatalogStore, DomainEvent, TheoryStore};
use crate::models::{NewQuest, Quest};
use crate::services::error::TheoryServiceError;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct QuestService {
    theories: Arc<dyn TheoryStore>,
    catalog: Arc<dyn CatalogStore>,
    event_tx: broadcast::Sender<DomainEvent>,
}

impl QuestService {
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

    pub async fn list_quests(&self) -> Result<Vec<Quest>, TheoryServiceError> {
        Ok(self.catalog.list_quests().await?)
    }

    pub async fn get_quest(&self, id: i64) -> Result<Quest, TheoryServiceError> {
        self.catalog
            .get_quest(id)
            .await?
            .ok_or_else(|| TheoryServiceError::quest_not_found(id))
    }

    pub async fn create_quest(&self, quest: NewQuest) -> Result<Quest, TheoryServiceError> {
        quest.validate()?;

        let created = self.catalog.create_quest(quest).await?;

        tracing::info!("Created quest {}", created.id);
        self.emit_event(DomainEvent::QuestCreated {
            quest: created.clone(),
        });
        Ok(created)
    }

    pub async fn delete_quest(&self, id: i64) -> Result<(), TheoryServiceError> {
        if !self.catalog.delete_quest(id).await? {
            return Err(TheoryServiceError::quest_not_found(id));
        }

        tracing::info!("Deleted quest {}", id);
        self.emit_event(DomainEvent::QuestDeleted { quest_id: id });
        Ok(())
    }

    pub async fn link_theory(
        &self,
        quest_id: i64,
        theory_id: i64,
    ) -> Result<Quest, TheoryServiceError> {
        self.get_quest(quest_id).await?;
        if self.theories.get_theory(theory_id).await?.is_none() {
            return Err(TheoryServiceError::theory_not_found(theory_id));
        }

        if !self.catalog.link_theory(quest_id, theory_id).await? {
            return Err(TheoryServiceError::already_exists(format!(
                "theory {} is already linked to quest {}",
                theory_id, quest_id
            )));
        }

        let quest = self.get_quest(quest_id).await?;
        tracing::debug!("Linked theory {} to quest {}", theory_id, quest_id);
        self.emit_event(DomainEvent::QuestUpdated {
            quest: quest.clone(),
        });
        Ok(quest)
    }

    pub async fn unlink_theory(
        &self,
        quest_id: i64,
        theory_id: i64,
    ) -> Result<Quest, TheoryServiceError> {
        self.get_quest(quest_id).await?;

        if !self.catalog.unlink_theory(quest_id, theory_id).await? {
            return Err(TheoryServiceError::link_not_found(format!(
                "theory {} is not linked to quest {}",
                theory_id, quest_id
            )));
        }

        let quest = self.get_quest(quest_id).await?;
        tracing::debug!("Unlinked theory {} from quest {}", theory_id, quest_id);
        self.emit_event(DomainEvent::QuestUpdated {
            quest: quest.clone(),
        });
        Ok(quest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseService, LibsqlTheoryStore};
    use crate::models::{NewSkill, NewTheory};
    use crate::services::TheoryService;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_link_theory_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            DatabaseService::new(temp_dir.path().join("test.db"))
                .await
                .unwrap(),
        );
        let store = Arc::new(LibsqlTheoryStore::new(db));
        let theories = TheoryService::new(store.clone());
        let service = QuestService::new(store.clone(), store.clone(), theories.event_sender());

        let skill = store.create_skill(NewSkill::new("HTTP", "🌍")).await.unwrap();
        let verbs = theories
            .add_theory(skill.id, NewTheory::new("Verbs", "GET, POST"))
            .await
            .unwrap();
        let quest = service
            .create_quest(NewQuest::named("Build an API"))
            .await
            .unwrap();

        let linked = service.link_theory(quest.id, verbs.id).await.unwrap();
        assert_eq!(linked.theories, vec![verbs.id]);
        assert!(matches!(
            service.link_theory(quest.id, verbs.id).await,
            Err(TheoryServiceError::AlreadyExists { .. })
        ));
        assert!(matches!(
            service.link_theory(quest.id, 404).await,
            Err(TheoryServiceError::TheoryNotFound { id: 404 })
        ));

        let unlinked = service.unlink_theory(quest.id, verbs.id).await.unwrap();
        assert!(unlinked.theories.is_empty());
        assert!(matches!(
            service.unlink_theory(quest.id, verbs.id).await,
            Err(TheoryServiceError::LinkNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_quest_is_not_stored() {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            DatabaseService::new(temp_dir.path().join("test.db"))
                .await
                .unwrap(),
        );
        let store = Arc::new(LibsqlTheoryStore::new(db));
        let (event_tx, _rx) = broadcast::channel(16);
        let service = QuestService::new(store.clone(), store, event_tx);

        let quest = NewQuest {
            reward_points: -1,
            ..NewQuest::named("Cheat")
        };
        assert!(matches!(
            service.create_quest(quest).await,
            Err(TheoryServiceError::ValidationFailed(_))
        ));
        assert!(service.list_quests().await.unwrap().is_empty());
        assert!(matches!(
            service.delete_quest(1).await,
            Err(TheoryServiceError::QuestNotFound { id: 1 })
        ));
    }
}
