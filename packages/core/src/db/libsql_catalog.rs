//! libsql implementation of [`CatalogStore`]

use crate::db::catalog_store::{CatalogStore, SkillUnlink};
use crate::db::error::DatabaseError;
use crate::db::libsql_store::{collect_skills, LibsqlTheoryStore, SKILL_COLUMNS};
use crate::models::{
    NewProfession, NewQuest, NewSkill, NewUserProgress, Profession, ProgressLink, Quest, Skill,
    UserProgress,
};
use async_trait::async_trait;
use libsql::params::IntoParams;
use libsql::{Connection, Row, Rows};
use std::collections::HashMap;

const PROFESSION_COLUMNS: &str = "id, name, icon";

const QUEST_COLUMNS: &str = "id, name, description, preview, reward_points, reading_points, \
     listening_points, speaking_points, writing_points";

fn progress_table(kind: ProgressLink) -> &'static str {
    match kind {
        ProgressLink::CompletedTheories => "progress_completed_theories",
        ProgressLink::CompletedQuests => "progress_completed_quests",
        ProgressLink::SelectedProfessions => "progress_selected_professions",
    }
}

fn row_to_profession(row: &Row) -> Result<Profession, DatabaseError> {
    let column = |name: &str, e: libsql::Error| {
        DatabaseError::row_decode(format!("professions.{}: {}", name, e))
    };

    Ok(Profession {
        id: row.get(0).map_err(|e| column("id", e))?,
        name: row.get(1).map_err(|e| column("name", e))?,
        icon: row.get(2).map_err(|e| column("icon", e))?,
    })
}

fn row_to_quest(row: &Row) -> Result<Quest, DatabaseError> {
    let column =
        |name: &str, e: libsql::Error| DatabaseError::row_decode(format!("quests.{}: {}", name, e));

    Ok(Quest {
        id: row.get(0).map_err(|e| column("id", e))?,
        name: row.get(1).map_err(|e| column("name", e))?,
        description: row.get(2).map_err(|e| column("description", e))?,
        preview: row.get(3).map_err(|e| column("preview", e))?,
        reward_points: row.get(4).map_err(|e| column("reward_points", e))?,
        reading_points: row.get(5).map_err(|e| column("reading_points", e))?,
        listening_points: row.get(6).map_err(|e| column("listening_points", e))?,
        speaking_points: row.get(7).map_err(|e| column("speaking_points", e))?,
        writing_points: row.get(8).map_err(|e| column("writing_points", e))?,
        theories: Vec::new(),
    })
}

async fn collect_professions(mut rows: Rows) -> Result<Vec<Profession>, DatabaseError> {
    let mut professions = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to read profession row", e))?
    {
        professions.push(row_to_profession(&row)?);
    }
    Ok(professions)
}

async fn collect_quests(mut rows: Rows) -> Result<Vec<Quest>, DatabaseError> {
    let mut quests = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to read quest row", e))?
    {
        quests.push(row_to_quest(&row)?);
    }
    Ok(quests)
}

/// Run a query whose rows are `(owner_id, member_id)` pairs
async fn collect_pairs(
    conn: &Connection,
    sql: &str,
    params: impl IntoParams + Send,
) -> Result<Vec<(i64, i64)>, DatabaseError> {
    let mut rows = conn
        .query(sql, params)
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to query links", e))?;

    let mut pairs = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to read link row", e))?
    {
        let owner: i64 = row
            .get(0)
            .map_err(|e| DatabaseError::row_decode(format!("link owner: {}", e)))?;
        let member: i64 = row
            .get(1)
            .map_err(|e| DatabaseError::row_decode(format!("link member: {}", e)))?;
        pairs.push((owner, member));
    }
    Ok(pairs)
}

async fn fetch_profession(
    conn: &Connection,
    id: i64,
) -> Result<Option<Profession>, DatabaseError> {
    let rows = conn
        .query(
            &format!("SELECT {} FROM professions WHERE id = ?", PROFESSION_COLUMNS),
            [id],
        )
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to query profession", e))?;

    Ok(collect_professions(rows).await?.into_iter().next())
}

async fn fetch_quest(conn: &Connection, id: i64) -> Result<Option<Quest>, DatabaseError> {
    let rows = conn
        .query(
            &format!("SELECT {} FROM quests WHERE id = ?", QUEST_COLUMNS),
            [id],
        )
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to query quest", e))?;

    let Some(mut quest) = collect_quests(rows).await?.into_iter().next() else {
        return Ok(None);
    };

    quest.theories = collect_pairs(
        conn,
        "SELECT quest_id, theory_id FROM quest_theories WHERE quest_id = ? ORDER BY theory_id",
        [id],
    )
    .await?
    .into_iter()
    .map(|(_, theory_id)| theory_id)
    .collect();
    Ok(Some(quest))
}

async fn fetch_progress(
    conn: &Connection,
    id: i64,
) -> Result<Option<UserProgress>, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT id, user_name, total_experience_points, total_gold_points
             FROM user_progress WHERE id = ?",
            [id],
        )
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to query user progress", e))?;

    let Some(row) = rows
        .next()
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to read user progress", e))?
    else {
        return Ok(None);
    };

    let column = |name: &str, e: libsql::Error| {
        DatabaseError::row_decode(format!("user_progress.{}: {}", name, e))
    };
    let mut progress = UserProgress {
        id: row.get(0).map_err(|e| column("id", e))?,
        user_name: row.get(1).map_err(|e| column("user_name", e))?,
        total_experience_points: row.get(2).map_err(|e| column("total_experience_points", e))?,
        total_gold_points: row.get(3).map_err(|e| column("total_gold_points", e))?,
        completed_theories: Vec::new(),
        completed_quests: Vec::new(),
        selected_professions: Vec::new(),
    };
    drop(rows);

    for kind in ProgressLink::ALL {
        let ids = collect_pairs(
            conn,
            &format!(
                "SELECT progress_id, target_id FROM {} WHERE progress_id = ? ORDER BY target_id",
                progress_table(kind)
            ),
            [id],
        )
        .await?
        .into_iter()
        .map(|(_, target)| target)
        .collect();

        match kind {
            ProgressLink::CompletedTheories => progress.completed_theories = ids,
            ProgressLink::CompletedQuests => progress.completed_quests = ids,
            ProgressLink::SelectedProfessions => progress.selected_professions = ids,
        }
    }
    Ok(Some(progress))
}

async fn count(
    conn: &Connection,
    sql: &str,
    params: impl IntoParams + Send,
) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query(sql, params)
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to count rows", e))?;

    match rows
        .next()
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to read row count", e))?
    {
        Some(row) => row
            .get(0)
            .map_err(|e| DatabaseError::row_decode(format!("COUNT(*): {}", e))),
        None => Ok(0),
    }
}

#[async_trait]
impl CatalogStore for LibsqlTheoryStore {
    async fn create_profession(
        &self,
        profession: NewProfession,
    ) -> Result<Profession, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT INTO professions (name, icon) VALUES (?, ?)",
            (profession.name.as_str(), profession.icon.as_str()),
        )
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to insert profession", e))?;

        Ok(Profession {
            id: conn.last_insert_rowid(),
            name: profession.name,
            icon: profession.icon,
        })
    }

    async fn get_profession(&self, id: i64) -> Result<Option<Profession>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        fetch_profession(&conn, id).await
    }

    async fn list_professions(&self) -> Result<Vec<Profession>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let rows = conn
            .query(
                &format!("SELECT {} FROM professions ORDER BY id", PROFESSION_COLUMNS),
                (),
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to list professions", e))?;
        collect_professions(rows).await
    }

    async fn delete_profession(&self, id: i64) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let deleted = conn
            .execute("DELETE FROM professions WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to delete profession", e))?;
        Ok(deleted > 0)
    }

    async fn profession_skills(&self, profession_id: i64) -> Result<Vec<Skill>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {} FROM skills
                     WHERE id IN (SELECT skill_id FROM profession_skills WHERE profession_id = ?)
                     ORDER BY id",
                    SKILL_COLUMNS
                ),
                [profession_id],
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to list profession skills", e))?;
        collect_skills(rows).await
    }

    async fn create_profession_skill(
        &self,
        profession_id: i64,
        skill: NewSkill,
    ) -> Result<Skill, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute("BEGIN IMMEDIATE", ())
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to begin transaction", e))?;

        conn.execute(
            "INSERT INTO skills (name, icon) VALUES (?, ?)",
            (skill.name.as_str(), skill.icon.as_str()),
        )
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to insert skill", e))?;
        let skill_id = conn.last_insert_rowid();

        conn.execute(
            "INSERT INTO profession_skills (profession_id, skill_id) VALUES (?, ?)",
            (profession_id, skill_id),
        )
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to attach skill", e))?;

        conn.execute("COMMIT", ())
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to commit transaction", e))?;

        Ok(Skill {
            id: skill_id,
            name: skill.name,
            icon: skill.icon,
        })
    }

    async fn link_skill(&self, profession_id: i64, skill_id: i64) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO profession_skills (profession_id, skill_id) VALUES (?, ?)",
                (profession_id, skill_id),
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to attach skill", e))?;
        Ok(inserted > 0)
    }

    async fn unlink_skill(
        &self,
        profession_id: i64,
        skill_id: i64,
    ) -> Result<SkillUnlink, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute("BEGIN IMMEDIATE", ())
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to begin transaction", e))?;

        let removed = conn
            .execute(
                "DELETE FROM profession_skills WHERE profession_id = ? AND skill_id = ?",
                (profession_id, skill_id),
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to detach skill", e))?;

        if removed == 0 {
            conn.execute("ROLLBACK", ())
                .await
                .map_err(|e| DatabaseError::from_sql("Failed to roll back transaction", e))?;
            return Ok(SkillUnlink::NotLinked);
        }

        let remaining = count(
            &conn,
            "SELECT COUNT(*) FROM profession_skills WHERE skill_id = ?",
            [skill_id],
        )
        .await?;

        let outcome = if remaining == 0 {
            conn.execute("DELETE FROM skills WHERE id = ?", [skill_id])
                .await
                .map_err(|e| DatabaseError::from_sql("Failed to delete orphaned skill", e))?;
            SkillUnlink::UnlinkedAndDeleted
        } else {
            SkillUnlink::Unlinked
        };

        conn.execute("COMMIT", ())
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to commit transaction", e))?;
        Ok(outcome)
    }

    async fn create_quest(&self, quest: NewQuest) -> Result<Quest, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT INTO quests (name, description, preview, reward_points, reading_points,
                                 listening_points, speaking_points, writing_points)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                quest.name.clone(),
                quest.description.clone(),
                quest.preview.clone(),
                quest.reward_points,
                quest.reading_points,
                quest.listening_points,
                quest.speaking_points,
                quest.writing_points,
            ),
        )
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to insert quest", e))?;

        Ok(Quest {
            id: conn.last_insert_rowid(),
            name: quest.name,
            description: quest.description,
            preview: quest.preview,
            reward_points: quest.reward_points,
            reading_points: quest.reading_points,
            listening_points: quest.listening_points,
            speaking_points: quest.speaking_points,
            writing_points: quest.writing_points,
            theories: Vec::new(),
        })
    }

    async fn get_quest(&self, id: i64) -> Result<Option<Quest>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        fetch_quest(&conn, id).await
    }

    async fn list_quests(&self) -> Result<Vec<Quest>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let rows = conn
            .query(
                &format!("SELECT {} FROM quests ORDER BY id", QUEST_COLUMNS),
                (),
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to list quests", e))?;
        let mut quests = collect_quests(rows).await?;

        let mut links: HashMap<i64, Vec<i64>> = HashMap::new();
        for (quest_id, theory_id) in collect_pairs(
            &conn,
            "SELECT quest_id, theory_id FROM quest_theories ORDER BY quest_id, theory_id",
            (),
        )
        .await?
        {
            links.entry(quest_id).or_default().push(theory_id);
        }

        for quest in &mut quests {
            quest.theories = links.remove(&quest.id).unwrap_or_default();
        }
        Ok(quests)
    }

    async fn delete_quest(&self, id: i64) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let deleted = conn
            .execute("DELETE FROM quests WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to delete quest", e))?;
        Ok(deleted > 0)
    }

    async fn link_theory(&self, quest_id: i64, theory_id: i64) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO quest_theories (quest_id, theory_id) VALUES (?, ?)",
                (quest_id, theory_id),
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to link theory to quest", e))?;
        Ok(inserted > 0)
    }

    async fn unlink_theory(&self, quest_id: i64, theory_id: i64) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let removed = conn
            .execute(
                "DELETE FROM quest_theories WHERE quest_id = ? AND theory_id = ?",
                (quest_id, theory_id),
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to unlink theory from quest", e))?;
        Ok(removed > 0)
    }

    async fn get_progress(&self, id: i64) -> Result<Option<UserProgress>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        fetch_progress(&conn, id).await
    }

    async fn create_progress(
        &self,
        id: i64,
        progress: NewUserProgress,
    ) -> Result<Option<UserProgress>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO user_progress (id, user_name) VALUES (?, ?)",
                (id, progress.user_name.as_str()),
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to insert user progress", e))?;

        if inserted == 0 {
            return Ok(None);
        }
        fetch_progress(&conn, id).await
    }

    async fn add_progress_link(
        &self,
        progress_id: i64,
        kind: ProgressLink,
        target_id: i64,
    ) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let inserted = conn
            .execute(
                &format!(
                    "INSERT OR IGNORE INTO {} (progress_id, target_id) VALUES (?, ?)",
                    progress_table(kind)
                ),
                (progress_id, target_id),
            )
            .await
            .map_err(|e| DatabaseError::from_sql(&format!("Failed to record {}", kind), e))?;
        Ok(inserted > 0)
    }

    async fn remove_progress_link(
        &self,
        progress_id: i64,
        kind: ProgressLink,
        target_id: i64,
    ) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let removed = conn
            .execute(
                &format!(
                    "DELETE FROM {} WHERE progress_id = ? AND target_id = ?",
                    progress_table(kind)
                ),
                (progress_id, target_id),
            )
            .await
            .map_err(|e| DatabaseError::from_sql(&format!("Failed to clear {}", kind), e))?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseService, TheoryStore, TheoryTransaction};
    use crate::models::NewTheory;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn create_test_store() -> (LibsqlTheoryStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(DatabaseService::new(db_path).await.unwrap());
        (LibsqlTheoryStore::new(db), temp_dir)
    }

    #[tokio::test]
    async fn test_skill_shared_between_professions() {
        let (store, _temp_dir) = create_test_store().await;
        let backend = store
            .create_profession(NewProfession::new("Backend", "🗄"))
            .await
            .unwrap();
        let devops = store
            .create_profession(NewProfession::new("DevOps", "⚙"))
            .await
            .unwrap();

        let linux = store
            .create_profession_skill(backend.id, NewSkill::new("Linux", "🐧"))
            .await
            .unwrap();
        assert!(store.link_skill(devops.id, linux.id).await.unwrap());
        assert!(!store.link_skill(devops.id, linux.id).await.unwrap());

        assert_eq!(
            store.unlink_skill(backend.id, linux.id).await.unwrap(),
            SkillUnlink::Unlinked
        );
        assert_eq!(
            store.unlink_skill(backend.id, linux.id).await.unwrap(),
            SkillUnlink::NotLinked
        );
        assert!(store.get_skill(linux.id).await.unwrap().is_some());

        assert_eq!(
            store.unlink_skill(devops.id, linux.id).await.unwrap(),
            SkillUnlink::UnlinkedAndDeleted
        );
        assert!(store.get_skill(linux.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_profession_delete_keeps_skills() {
        let (store, _temp_dir) = create_test_store().await;
        let profession = store
            .create_profession(NewProfession::new("Designer", "🎨"))
            .await
            .unwrap();
        let skill = store
            .create_profession_skill(profession.id, NewSkill::new("Figma", "🖌"))
            .await
            .unwrap();

        assert_eq!(
            store.profession_skills(profession.id).await.unwrap(),
            vec![skill.clone()]
        );
        assert!(store.delete_profession(profession.id).await.unwrap());
        assert!(!store.delete_profession(profession.id).await.unwrap());
        assert_eq!(store.get_skill(skill.id).await.unwrap(), Some(skill));
    }

    #[tokio::test]
    async fn test_quest_theory_links_follow_theory_deletion() {
        let (store, _temp_dir) = create_test_store().await;
        let skill = store.create_skill(NewSkill::new("SQL", "🗃")).await.unwrap();

        let tx = store.begin_write().await.unwrap();
        let joins = tx
            .insert_theory(skill.id, &NewTheory::new("Joins", "j"), 0)
            .await
            .unwrap();
        let indexes = tx
            .insert_theory(skill.id, &NewTheory::new("Indexes", "i"), 1)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let quest = store.create_quest(NewQuest::named("Tune a query")).await.unwrap();
        assert!(store.link_theory(quest.id, indexes.id).await.unwrap());
        assert!(store.link_theory(quest.id, joins.id).await.unwrap());

        let fetched = store.get_quest(quest.id).await.unwrap().unwrap();
        assert_eq!(fetched.theories, vec![joins.id, indexes.id]);

        let tx = store.begin_write().await.unwrap();
        tx.delete_subtree(joins.id).await.unwrap();
        tx.commit().await.unwrap();

        let listed = store.list_quests().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].theories, vec![indexes.id]);
        assert!(!store.unlink_theory(quest.id, joins.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_progress_created_once() {
        let (store, _temp_dir) = create_test_store().await;

        let created = store
            .create_progress(1, NewUserProgress::new("ada"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.user_name, "ada");
        assert_eq!(created.total_experience_points, 0);
        assert!(created.completed_theories.is_empty());

        assert!(store
            .create_progress(1, NewUserProgress::new("grace"))
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            store.get_progress(1).await.unwrap().map(|p| p.user_name),
            Some("ada".to_string())
        );
    }

    #[tokio::test]
    async fn test_progress_links_are_sets() {
        let (store, _temp_dir) = create_test_store().await;
        store
            .create_progress(1, NewUserProgress::new("ada"))
            .await
            .unwrap();
        let profession = store
            .create_profession(NewProfession::new("Analyst", "📊"))
            .await
            .unwrap();

        let kind = ProgressLink::SelectedProfessions;
        assert!(store.add_progress_link(1, kind, profession.id).await.unwrap());
        assert!(!store.add_progress_link(1, kind, profession.id).await.unwrap());

        let progress = store.get_progress(1).await.unwrap().unwrap();
        assert_eq!(progress.selected_professions, vec![profession.id]);

        store.delete_profession(profession.id).await.unwrap();
        let progress = store.get_progress(1).await.unwrap().unwrap();
        assert!(progress.selected_professions.is_empty());
        assert!(!store.remove_progress_link(1, kind, profession.id).await.unwrap());
    }
}
