//! Profession Service
//!
//! Professions and their many-to-many link to skills. A skill detached from
//! its last profession is deleted together with its theory forest.

use crate::db::{CatalogStore, DomainEvent, SkillUnlink, TheoryStore};
use crate::models::{NewProfession, NewSkill, Profession, Skill};
use crate::services::error::TheoryServiceError;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct ProfessionService {
    skills: Arc<dyn TheoryStore>,
    catalog: Arc<dyn CatalogStore>,
    event_tx: broadcast::Sender<DomainEvent>,
}

impl ProfessionService {
    pub fn new(
        skills: Arc<dyn TheoryStore>,
        catalog: Arc<dyn CatalogStore>,
        event_tx: broadcast::Sender<DomainEvent>,
    ) -> Self {
        Self {
            skills,
            catalog,
            event_tx,
        }
    }

    fn emit_event(&self, event: DomainEvent) {
        let _ = self.event_tx.send(event);
    }

    async fn require_profession(&self, id: i64) -> Result<Profession, TheoryServiceError> {
        self.catalog
            .get_profession(id)
            .await?
            .ok_or_else(|| TheoryServiceError::profession_not_found(id))
    }

    pub async fn list_professions(&self) -> Result<Vec<Profession>, TheoryServiceError> {
        Ok(self.catalog.list_professions().await?)
    }

    pub async fn create_profession(
        &self,
        profession: NewProfession,
    ) -> Result<Profession, TheoryServiceError> {
        profession.validate()?;

        let created = self.catalog.create_profession(profession).await?;

        tracing::info!("Created profession {} ({})", created.id, created.name);
        self.emit_event(DomainEvent::ProfessionCreated {
            profession: created.clone(),
        });
        Ok(created)
    }

    /// Delete a profession; skills it referenced are kept
    pub async fn delete_profession(&self, id: i64) -> Result<(), TheoryServiceError> {
        if !self.catalog.delete_profession(id).await? {
            return Err(TheoryServiceError::profession_not_found(id));
        }

        tracing::info!("Deleted profession {}", id);
        self.emit_event(DomainEvent::ProfessionDeleted { profession_id: id });
        Ok(())
    }

    pub async fn list_skills(&self, profession_id: i64) -> Result<Vec<Skill>, TheoryServiceError> {
        self.require_profession(profession_id).await?;
        Ok(self.catalog.profession_skills(profession_id).await?)
    }

    /// Create a new skill already attached to the profession
    pub async fn add_new_skill(
        &self,
        profession_id: i64,
        skill: NewSkill,
    ) -> Result<Skill, TheoryServiceError> {
        skill.validate()?;
        self.require_profession(profession_id).await?;

        let created = self
            .catalog
            .create_profession_skill(profession_id, skill)
            .await?;

        tracing::info!(
            "Created skill {} under profession {}",
            created.id,
            profession_id
        );
        self.emit_event(DomainEvent::SkillCreated {
            skill: created.clone(),
        });
        self.emit_event(DomainEvent::ProfessionSkillLinked {
            profession_id,
            skill_id: created.id,
        });
        Ok(created)
    }

    /// Attach an existing skill; attaching it twice is rejected
    pub async fn attach_skill(
        &self,
        profession_id: i64,
        skill_id: i64,
    ) -> Result<Skill, TheoryServiceError> {
        self.require_profession(profession_id).await?;
        let skill = self
            .skills
            .get_skill(skill_id)
            .await?
            .ok_or_else(|| TheoryServiceError::skill_not_found(skill_id))?;

        if !self.catalog.link_skill(profession_id, skill_id).await? {
            return Err(TheoryServiceError::already_exists(format!(
                "skill {} is already attached to profession {}",
                skill_id, profession_id
            )));
        }

        tracing::info!("Attached skill {} to profession {}", skill_id, profession_id);
        self.emit_event(DomainEvent::ProfessionSkillLinked {
            profession_id,
            skill_id,
        });
        Ok(skill)
    }

    /// Detach a skill from a profession
    ///
    /// Returns `true` when the skill had no other profession and was deleted.
    pub async fn detach_skill(
        &self,
        profession_id: i64,
        skill_id: i64,
    ) -> Result<bool, TheoryServiceError> {
        self.require_profession(profession_id).await?;
        if self.skills.get_skill(skill_id).await?.is_none() {
            return Err(TheoryServiceError::skill_not_found(skill_id));
        }

        let skill_removed = match self.catalog.unlink_skill(profession_id, skill_id).await? {
            SkillUnlink::NotLinked => {
                return Err(TheoryServiceError::link_not_found(format!(
                    "skill {} is not attached to profession {}",
                    skill_id, profession_id
                )))
            }
            SkillUnlink::Unlinked => false,
            SkillUnlink::UnlinkedAndDeleted => true,
        };

        tracing::info!(
            "Detached skill {} from profession {} (skill removed: {})",
            skill_id,
            profession_id,
            skill_removed
        );
        self.emit_event(DomainEvent::ProfessionSkillUnlinked {
            profession_id,
            skill_id,
            skill_removed,
        });
        if skill_removed {
            self.emit_event(DomainEvent::SkillDeleted { skill_id });
        }
        Ok(skill_removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseService, LibsqlTheoryStore};
    use tempfile::TempDir;

    async fn create_test_service() -> (ProfessionService, broadcast::Receiver<DomainEvent>, TempDir)
    {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(DatabaseService::new(db_path).await.unwrap());
        let store = Arc::new(LibsqlTheoryStore::new(db));
        let (event_tx, event_rx) = broadcast::channel(16);
        (
            ProfessionService::new(store.clone(), store, event_tx),
            event_rx,
            temp_dir,
        )
    }

    #[tokio::test]
    async fn test_attach_twice_is_rejected() {
        let (service, _rx, _temp_dir) = create_test_service().await;
        let web = service
            .create_profession(NewProfession::new("Web", "🌐"))
            .await
            .unwrap();
        let mobile = service
            .create_profession(NewProfession::new("Mobile", "📱"))
            .await
            .unwrap();
        let skill = service
            .add_new_skill(web.id, NewSkill::new("TypeScript", "🟦"))
            .await
            .unwrap();

        service.attach_skill(mobile.id, skill.id).await.unwrap();
        assert!(matches!(
            service.attach_skill(mobile.id, skill.id).await,
            Err(TheoryServiceError::AlreadyExists { .. })
        ));
        assert_eq!(service.list_skills(mobile.id).await.unwrap(), vec![skill]);
    }

    #[tokio::test]
    async fn test_detach_last_profession_deletes_skill() {
        let (service, mut rx, _temp_dir) = create_test_service().await;
        let data = service
            .create_profession(NewProfession::new("Data", "📈"))
            .await
            .unwrap();
        let skill = service
            .add_new_skill(data.id, NewSkill::new("Pandas", "🐼"))
            .await
            .unwrap();

        assert!(service.detach_skill(data.id, skill.id).await.unwrap());
        assert!(matches!(
            service.detach_skill(data.id, skill.id).await,
            Err(TheoryServiceError::SkillNotFound { .. })
        ));

        let types: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|event| event.event_type())
            .collect();
        assert_eq!(
            types,
            vec![
                "profession:created",
                "skill:created",
                "profession:skillLinked",
                "profession:skillUnlinked",
                "skill:deleted",
            ]
        );
    }

    #[tokio::test]
    async fn test_detach_unlinked_skill_reports_missing_link() {
        let (service, _rx, _temp_dir) = create_test_service().await;
        let ops = service
            .create_profession(NewProfession::new("Ops", "🛠"))
            .await
            .unwrap();
        let qa = service
            .create_profession(NewProfession::new("QA", "🔍"))
            .await
            .unwrap();
        let skill = service
            .add_new_skill(ops.id, NewSkill::new("Bash", "🐚"))
            .await
            .unwrap();

        assert!(matches!(
            service.detach_skill(qa.id, skill.id).await,
            Err(TheoryServiceError::LinkNotFound { .. })
        ));
        assert!(matches!(
            service.list_skills(999).await,
            Err(TheoryServiceError::ProfessionNotFound { id: 999 })
        ));
    }
}
