//! Event Emission Tests
//!
//! Verifies that every committed write emits exactly one `DomainEvent`, and
//! that rejected or no-op operations emit nothing.

#[cfg(test)]
mod event_emission_tests {
    use anyhow::Result;
    use learner_core::db::{DatabaseService, LibsqlTheoryStore, DomainEvent};
    use learner_core::models::{MoveTheory, NewSkill, NewTheory, TheoryUpdate};
    use learner_core::services::{SkillService, TheoryService};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::broadcast::error::TryRecvError;
    use tokio::time::{timeout, Duration};

    /// Helper to create both services on a fresh database
    async fn create_services() -> Result<(TheoryService, SkillService, TempDir)> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(DatabaseService::new(db_path).await?);
        let store = Arc::new(LibsqlTheoryStore::new(db));
        let theories = TheoryService::new(store.clone());
        let skills = SkillService::new(store, theories.event_sender());
        Ok((theories, skills, temp_dir))
    }

    #[tokio::test]
    async fn test_add_theory_emits_created_event() -> Result<()> {
        let (theories, skills, _temp_dir) = create_services().await?;
        let skill = skills.create_skill(NewSkill::new("Rust", "🦀")).await?;

        // Subscribe after skill creation to skip its event
        let mut rx = theories.subscribe_to_events();
        let created = theories
            .add_theory(skill.id, NewTheory::new("Closures", "Fn, FnMut, FnOnce"))
            .await?;

        let event = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("Event should be emitted within 1 second")
            .expect("Should receive event");

        match event {
            DomainEvent::TheoryCreated { theory } => {
                assert_eq!(theory, created);
                assert_eq!(theory.order_index, 0);
            }
            _ => panic!("Expected TheoryCreated event, got {:?}", event),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_move_emits_placements() -> Result<()> {
        let (theories, skills, _temp_dir) = create_services().await?;
        let skill = skills.create_skill(NewSkill::new("Rust", "🦀")).await?;
        let first = theories
            .add_theory(skill.id, NewTheory::new("First", "1"))
            .await?;
        let second = theories
            .add_theory(skill.id, NewTheory::new("Second", "2"))
            .await?;

        let mut rx = theories.subscribe_to_events();
        theories
            .move_theory(
                skill.id,
                MoveTheory {
                    target_theory_id: second.id,
                    new_index_position: 0,
                    new_parent_id: None,
                },
            )
            .await?;

        match rx.recv().await? {
            DomainEvent::TheoryMoved {
                skill_id,
                theory_id,
                placements,
            } => {
                assert_eq!(skill_id, skill.id);
                assert_eq!(theory_id, second.id);
                assert_eq!(placements.len(), 2);
                assert!(placements
                    .iter()
                    .any(|p| p.theory_id == first.id && p.order_index == 1));
            }
            other => panic!("Expected TheoryMoved event, got {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_and_noop_moves_emit_nothing() -> Result<()> {
        let (theories, skills, _temp_dir) = create_services().await?;
        let skill = skills.create_skill(NewSkill::new("Rust", "🦀")).await?;
        let parent = theories
            .add_theory(skill.id, NewTheory::new("Parent", "p"))
            .await?;
        let child = theories
            .add_theory(skill.id, NewTheory::new("Child", "c").under(parent.id))
            .await?;

        let mut rx = theories.subscribe_to_events();

        let cycle = theories
            .move_theory(
                skill.id,
                MoveTheory {
                    target_theory_id: parent.id,
                    new_index_position: 0,
                    new_parent_id: Some(child.id),
                },
            )
            .await;
        assert!(cycle.is_err());

        theories
            .move_theory(
                skill.id,
                MoveTheory {
                    target_theory_id: child.id,
                    new_index_position: 0,
                    new_parent_id: Some(parent.id),
                },
            )
            .await?;

        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_and_delete_events() -> Result<()> {
        let (theories, skills, _temp_dir) = create_services().await?;
        let skill = skills.create_skill(NewSkill::new("Rust", "🦀")).await?;
        let root = theories
            .add_theory(skill.id, NewTheory::new("Root", "r"))
            .await?;
        theories
            .add_theory(skill.id, NewTheory::new("Leaf", "l").under(root.id))
            .await?;

        let mut rx = theories.subscribe_to_events();
        theories
            .update_theory(
                root.id,
                TheoryUpdate {
                    title: Some("Renamed root".to_string()),
                    ..Default::default()
                },
            )
            .await?;
        theories.delete_theory(root.id).await?;

        match rx.recv().await? {
            DomainEvent::TheoryUpdated { theory } => assert_eq!(theory.title, "Renamed root"),
            other => panic!("Expected TheoryUpdated event, got {:?}", other),
        }
        assert_eq!(
            rx.recv().await?,
            DomainEvent::TheoryDeleted {
                skill_id: Some(skill.id),
                theory_id: root.id,
                removed: 2,
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_skill_events_share_the_channel() -> Result<()> {
        let (theories, skills, _temp_dir) = create_services().await?;

        let mut rx = theories.subscribe_to_events();
        let skill = skills.create_skill(NewSkill::new("Chess", "♟")).await?;

        assert_eq!(rx.recv().await?, DomainEvent::SkillCreated { skill });
        Ok(())
    }
}
