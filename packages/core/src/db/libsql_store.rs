//! libsql implementation of [`TheoryStore`]
//!
//! Every store call opens its own connection through
//! [`DatabaseService::connect_with_timeout`]. Transactions own their
//! connection for their whole lifetime; dropping an unfinished transaction
//! drops the connection, and SQLite rolls the open transaction back.

use crate::db::database::DatabaseService;
use crate::db::error::DatabaseError;
use crate::db::theory_store::{TheoryStore, TheoryTransaction};
use crate::models::{NewSkill, NewTheory, Skill, SkillUpdate, Theory, TheoryUpdate};
use crate::operations::Placement;
use async_trait::async_trait;
use libsql::{Connection, Row, Rows};
use std::sync::Arc;

const THEORY_COLUMNS: &str =
    "id, title, content, difficulty_level, order_index, parent_id, skill_id";

pub(super) const SKILL_COLUMNS: &str = "id, name, icon";

fn row_to_theory(row: &Row) -> Result<Theory, DatabaseError> {
    let column = |name: &str, e: libsql::Error| {
        DatabaseError::row_decode(format!("theories.{}: {}", name, e))
    };

    Ok(Theory {
        id: row.get(0).map_err(|e| column("id", e))?,
        title: row.get(1).map_err(|e| column("title", e))?,
        content: row.get(2).map_err(|e| column("content", e))?,
        difficulty_level: row.get(3).map_err(|e| column("difficulty_level", e))?,
        order_index: row.get(4).map_err(|e| column("order_index", e))?,
        parent_id: row.get(5).map_err(|e| column("parent_id", e))?,
        skill_id: row.get(6).map_err(|e| column("skill_id", e))?,
    })
}

fn row_to_skill(row: &Row) -> Result<Skill, DatabaseError> {
    let column =
        |name: &str, e: libsql::Error| DatabaseError::row_decode(format!("skills.{}: {}", name, e));

    Ok(Skill {
        id: row.get(0).map_err(|e| column("id", e))?,
        name: row.get(1).map_err(|e| column("name", e))?,
        icon: row.get(2).map_err(|e| column("icon", e))?,
    })
}

async fn collect_theories(mut rows: Rows) -> Result<Vec<Theory>, DatabaseError> {
    let mut theories = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to read theory row", e))?
    {
        theories.push(row_to_theory(&row)?);
    }
    Ok(theories)
}

pub(super) async fn collect_skills(mut rows: Rows) -> Result<Vec<Skill>, DatabaseError> {
    let mut skills = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to read skill row", e))?
    {
        skills.push(row_to_skill(&row)?);
    }
    Ok(skills)
}

async fn fetch_theory(conn: &Connection, id: i64) -> Result<Option<Theory>, DatabaseError> {
    let rows = conn
        .query(
            &format!("SELECT {} FROM theories WHERE id = ?", THEORY_COLUMNS),
            [id],
        )
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to query theory", e))?;

    Ok(collect_theories(rows).await?.into_iter().next())
}

async fn fetch_skill(conn: &Connection, id: i64) -> Result<Option<Skill>, DatabaseError> {
    let rows = conn
        .query(
            &format!("SELECT {} FROM skills WHERE id = ?", SKILL_COLUMNS),
            [id],
        )
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to query skill", e))?;

    Ok(collect_skills(rows).await?.into_iter().next())
}

/// [`TheoryStore`] backed by a local libsql database
pub struct LibsqlTheoryStore {
    pub(super) db: Arc<DatabaseService>,
}

impl LibsqlTheoryStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    async fn begin(&self, statement: &'static str) -> Result<LibsqlTransaction, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(statement, ())
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to begin transaction", e))?;
        Ok(LibsqlTransaction { conn })
    }
}

#[async_trait]
impl TheoryStore for LibsqlTheoryStore {
    async fn create_skill(&self, skill: NewSkill) -> Result<Skill, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT INTO skills (name, icon) VALUES (?, ?)",
            (skill.name.as_str(), skill.icon.as_str()),
        )
        .await
        .map_err(|e| DatabaseError::from_sql("Failed to insert skill", e))?;

        Ok(Skill {
            id: conn.last_insert_rowid(),
            name: skill.name,
            icon: skill.icon,
        })
    }

    async fn get_skill(&self, id: i64) -> Result<Option<Skill>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        fetch_skill(&conn, id).await
    }

    async fn list_skills(&self) -> Result<Vec<Skill>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let rows = conn
            .query(
                &format!("SELECT {} FROM skills ORDER BY id", SKILL_COLUMNS),
                (),
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to list skills", e))?;
        collect_skills(rows).await
    }

    async fn update_skill(
        &self,
        id: i64,
        update: SkillUpdate,
    ) -> Result<Option<Skill>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let changed = conn
            .execute(
                "UPDATE skills SET name = COALESCE(?, name), icon = COALESCE(?, icon) WHERE id = ?",
                (update.name, update.icon, id),
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to update skill", e))?;

        if changed == 0 {
            return Ok(None);
        }
        fetch_skill(&conn, id).await
    }

    async fn delete_skill(&self, id: i64) -> Result<bool, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let deleted = conn
            .execute("DELETE FROM skills WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to delete skill", e))?;
        Ok(deleted > 0)
    }

    async fn get_theory(&self, id: i64) -> Result<Option<Theory>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        fetch_theory(&conn, id).await
    }

    async fn list_theories(&self) -> Result<Vec<Theory>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let rows = conn
            .query(
                &format!("SELECT {} FROM theories ORDER BY id", THEORY_COLUMNS),
                (),
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to list theories", e))?;
        collect_theories(rows).await
    }

    async fn list_theories_by_skill(&self, skill_id: i64) -> Result<Vec<Theory>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let rows = conn
            .query(
                &format!(
                    "SELECT {} FROM theories WHERE skill_id = ? ORDER BY parent_id, order_index, id",
                    THEORY_COLUMNS
                ),
                [skill_id],
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to list theories of skill", e))?;
        collect_theories(rows).await
    }

    async fn update_theory_fields(
        &self,
        id: i64,
        update: TheoryUpdate,
    ) -> Result<Option<Theory>, DatabaseError> {
        let conn = self.db.connect_with_timeout().await?;
        let changed = conn
            .execute(
                "UPDATE theories
                 SET title = COALESCE(?, title),
                     content = COALESCE(?, content),
                     difficulty_level = COALESCE(?, difficulty_level)
                 WHERE id = ?",
                (update.title, update.content, update.difficulty_level, id),
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to update theory", e))?;

        if changed == 0 {
            return Ok(None);
        }
        fetch_theory(&conn, id).await
    }

    async fn begin_read(&self) -> Result<Box<dyn TheoryTransaction>, DatabaseError> {
        Ok(Box::new(self.begin("BEGIN DEFERRED").await?))
    }

    async fn begin_write(&self) -> Result<Box<dyn TheoryTransaction>, DatabaseError> {
        Ok(Box::new(self.begin("BEGIN IMMEDIATE").await?))
    }

    async fn close(&self) -> Result<(), DatabaseError> {
        self.db.checkpoint().await
    }
}

/// Open libsql transaction
pub struct LibsqlTransaction {
    conn: Connection,
}

#[async_trait]
impl TheoryTransaction for LibsqlTransaction {
    async fn skill_exists(&self, skill_id: i64) -> Result<bool, DatabaseError> {
        Ok(fetch_skill(&self.conn, skill_id).await?.is_some())
    }

    async fn get_theory(&self, id: i64) -> Result<Option<Theory>, DatabaseError> {
        fetch_theory(&self.conn, id).await
    }

    async fn root_theories(&self, skill_id: i64) -> Result<Vec<Theory>, DatabaseError> {
        self.sibling_group(skill_id, None).await
    }

    async fn children_of(&self, parent_ids: &[i64]) -> Result<Vec<Theory>, DatabaseError> {
        if parent_ids.is_empty() {
            return Ok(Vec::new());
        }

        // The frontier travels as one JSON array so the statement text does
        // not depend on its width.
        let frontier = serde_json::to_string(parent_ids).map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to encode parent ids: {}", e))
        })?;

        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {} FROM theories
                     WHERE parent_id IN (SELECT value FROM json_each(?))
                     ORDER BY parent_id, order_index, id",
                    THEORY_COLUMNS
                ),
                [frontier],
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to query children", e))?;
        collect_theories(rows).await
    }

    async fn sibling_group(
        &self,
        skill_id: i64,
        parent_id: Option<i64>,
    ) -> Result<Vec<Theory>, DatabaseError> {
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {} FROM theories
                     WHERE skill_id = ? AND parent_id IS ?
                     ORDER BY order_index, id",
                    THEORY_COLUMNS
                ),
                (skill_id, parent_id),
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to query sibling group", e))?;
        collect_theories(rows).await
    }

    async fn max_order_index(
        &self,
        skill_id: i64,
        parent_id: Option<i64>,
    ) -> Result<Option<i64>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT MAX(order_index) FROM theories WHERE skill_id = ? AND parent_id IS ?",
                (skill_id, parent_id),
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to query max order index", e))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to read max order index", e))?
        {
            Some(row) => row
                .get::<Option<i64>>(0)
                .map_err(|e| DatabaseError::row_decode(format!("MAX(order_index): {}", e))),
            None => Ok(None),
        }
    }

    async fn insert_theory(
        &self,
        skill_id: i64,
        theory: &NewTheory,
        order_index: i64,
    ) -> Result<Theory, DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO theories (title, content, difficulty_level, order_index, parent_id, skill_id)
                 VALUES (?, ?, ?, ?, ?, ?)",
                (
                    theory.title.as_str(),
                    theory.content.as_str(),
                    theory.difficulty_level,
                    order_index,
                    theory.parent_id,
                    skill_id,
                ),
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to insert theory", e))?;

        Ok(Theory {
            id: self.conn.last_insert_rowid(),
            title: theory.title.clone(),
            content: theory.content.clone(),
            difficulty_level: theory.difficulty_level,
            order_index,
            parent_id: theory.parent_id,
            skill_id: Some(skill_id),
        })
    }

    async fn apply_placements(&self, placements: &[Placement]) -> Result<(), DatabaseError> {
        for placement in placements {
            self.conn
                .execute(
                    "UPDATE theories SET parent_id = ?, order_index = ? WHERE id = ?",
                    (
                        placement.parent_id,
                        placement.order_index,
                        placement.theory_id,
                    ),
                )
                .await
                .map_err(|e| {
                    DatabaseError::from_sql(
                        &format!("Failed to reposition theory {}", placement.theory_id),
                        e,
                    )
                })?;
        }
        Ok(())
    }

    async fn delete_subtree(&self, id: i64) -> Result<u64, DatabaseError> {
        // Cascaded rows are not reported by changes(), so count the subtree
        // first. UNION (not UNION ALL) stops on corrupted cyclic data.
        let mut rows = self
            .conn
            .query(
                "WITH RECURSIVE subtree(id) AS (
                     SELECT id FROM theories WHERE id = ?
                     UNION
                     SELECT t.id FROM theories t JOIN subtree s ON t.parent_id = s.id
                 )
                 SELECT COUNT(*) FROM subtree",
                [id],
            )
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to count subtree", e))?;

        let removed: i64 = match rows
            .next()
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to read subtree size", e))?
        {
            Some(row) => row
                .get(0)
                .map_err(|e| DatabaseError::row_decode(format!("COUNT(*): {}", e)))?,
            None => 0,
        };
        drop(rows);

        self.conn
            .execute("DELETE FROM theories WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to delete theory", e))?;

        Ok(removed.max(0) as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), DatabaseError> {
        self.conn
            .execute("COMMIT", ())
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to commit transaction", e))?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DatabaseError> {
        self.conn
            .execute("ROLLBACK", ())
            .await
            .map_err(|e| DatabaseError::from_sql("Failed to roll back transaction", e))?;
        Ok(())
    }
}
