//! Database Connection Management
//!
//! This module provides the database connection and schema initialization
//! for Learner using libsql (embedded, SQLite-compatible).
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf
//! - **Idempotent schema**: `CREATE TABLE IF NOT EXISTS`, safe on every start
//! - **WAL mode**: Write-Ahead Logging so readers don't block the writer
//! - **Foreign keys**: Enabled on every connection (cascading deletes)
//!
//! # Database Connection Patterns
//!
//! **ALWAYS use `connect_with_timeout()` in async functions.** It sets the
//! busy timeout and enables foreign keys on the new connection; SQLite keeps
//! both settings per connection, not per database.
//!
//! ```no_run
//! # use learner_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/learner.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Milliseconds a connection waits on a locked database before failing
pub const BUSY_TIMEOUT_MS: u64 = 5000;

/// Professions, quests and learner progress, with their junction tables
///
/// Junction rows cascade away with either endpoint. The composite primary
/// keys make a repeated link a constraint violation.
const CATALOG_TABLES: &[(&str, &str)] = &[
    (
        "professions",
        "CREATE TABLE IF NOT EXISTS professions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (name <> ''),
            icon TEXT NOT NULL CHECK (icon <> '')
        )",
    ),
    (
        "profession_skills",
        "CREATE TABLE IF NOT EXISTS profession_skills (
            profession_id INTEGER NOT NULL REFERENCES professions(id) ON DELETE CASCADE,
            skill_id INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
            PRIMARY KEY (profession_id, skill_id)
        )",
    ),
    (
        "quests",
        "CREATE TABLE IF NOT EXISTS quests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            description TEXT,
            preview TEXT,
            reward_points INTEGER NOT NULL DEFAULT 0,
            reading_points INTEGER NOT NULL DEFAULT 0,
            listening_points INTEGER NOT NULL DEFAULT 0,
            speaking_points INTEGER NOT NULL DEFAULT 0,
            writing_points INTEGER NOT NULL DEFAULT 0
        )",
    ),
    (
        "quest_theories",
        "CREATE TABLE IF NOT EXISTS quest_theories (
            quest_id INTEGER NOT NULL REFERENCES quests(id) ON DELETE CASCADE,
            theory_id INTEGER NOT NULL REFERENCES theories(id) ON DELETE CASCADE,
            PRIMARY KEY (quest_id, theory_id)
        )",
    ),
    (
        "user_progress",
        "CREATE TABLE IF NOT EXISTS user_progress (
            id INTEGER PRIMARY KEY,
            user_name TEXT NOT NULL CHECK (user_name <> ''),
            total_experience_points INTEGER NOT NULL DEFAULT 0,
            total_gold_points INTEGER NOT NULL DEFAULT 0
        )",
    ),
    (
        "progress_completed_theories",
        "CREATE TABLE IF NOT EXISTS progress_completed_theories (
            progress_id INTEGER NOT NULL REFERENCES user_progress(id) ON DELETE CASCADE,
            target_id INTEGER NOT NULL REFERENCES theories(id) ON DELETE CASCADE,
            PRIMARY KEY (progress_id, target_id)
        )",
    ),
    (
        "progress_completed_quests",
        "CREATE TABLE IF NOT EXISTS progress_completed_quests (
            progress_id INTEGER NOT NULL REFERENCES user_progress(id) ON DELETE CASCADE,
            target_id INTEGER NOT NULL REFERENCES quests(id) ON DELETE CASCADE,
            PRIMARY KEY (progress_id, target_id)
        )",
    ),
    (
        "progress_selected_professions",
        "CREATE TABLE IF NOT EXISTS progress_selected_professions (
            progress_id INTEGER NOT NULL REFERENCES user_progress(id) ON DELETE CASCADE,
            target_id INTEGER NOT NULL REFERENCES professions(id) ON DELETE CASCADE,
            PRIMARY KEY (progress_id, target_id)
        )",
    ),
];

/// Database service for managing the libsql connection and schema
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        let is_new_database = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema(is_new_database).await?;

        tracing::debug!("Database ready at {}", service.db_path.display());
        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements may return rows, so they go through query() instead of execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// # Schema
    ///
    /// - `skills`: one row per skill
    /// - `theories`: one row per theory; `parent_id` is self-referential.
    ///   Deleting a parent removes its subtree, deleting a skill removes its
    ///   theories.
    /// - catalog tables: see [`CATALOG_TABLES`]
    ///
    /// There is deliberately no UNIQUE constraint on
    /// `(skill_id, parent_id, order_index)`: renumbering rewrites a group
    /// row by row inside a transaction and passes through duplicate states.
    async fn initialize_schema(&self, is_new_database: bool) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS skills (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL CHECK (name <> ''),
                icon TEXT NOT NULL CHECK (icon <> '')
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create skills table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS theories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL CHECK (title <> ''),
                content TEXT NOT NULL CHECK (content <> ''),
                difficulty_level INTEGER NOT NULL DEFAULT 0,
                order_index INTEGER NOT NULL DEFAULT 0 CHECK (order_index >= 0),
                parent_id INTEGER,
                skill_id INTEGER,
                FOREIGN KEY (parent_id) REFERENCES theories(id) ON DELETE CASCADE,
                FOREIGN KEY (skill_id) REFERENCES skills(id) ON DELETE CASCADE
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create theories table: {}",
                e
            ))
        })?;

        for (table, ddl) in CATALOG_TABLES {
            conn.execute(ddl, ()).await.map_err(|e| {
                DatabaseError::initialization_failed(format!(
                    "Failed to create {} table: {}",
                    table, e
                ))
            })?;
        }

        self.create_core_indexes(&conn).await?;

        // Flush the fresh schema out of the WAL so a second handle opened
        // right away sees the tables.
        if is_new_database {
            self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
                .await?;
        }

        Ok(())
    }

    /// Create core indexes for the theories table
    async fn create_core_indexes(&self, conn: &libsql::Connection) -> Result<(), DatabaseError> {
        // Sibling-group scans: (skill, parent) lookups ordered by rank
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_theories_group ON theories(skill_id, parent_id, order_index)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to create index 'idx_theories_group': {}",
                e
            ))
        })?;

        // Frontier expansion: children of a set of parents
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_theories_parent ON theories(parent_id, order_index)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to create index 'idx_theories_parent': {}",
                e
            ))
        })?;

        // Reverse junction lookup: professions of a skill
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_profession_skills_skill ON profession_skills(skill_id)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!(
                "Failed to create index 'idx_profession_skills_skill': {}",
                e
            ))
        })?;

        Ok(())
    }

    /// Get a raw connection to the database
    ///
    /// **⚠️ WARNING**: The connection has no busy timeout and foreign keys are
    /// off. Use `connect_with_timeout()` for anything that touches rows.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to connect to database: {}", e))
        })
    }

    /// Get an async connection with busy timeout and foreign keys configured
    ///
    /// The busy timeout makes concurrent writers wait for the lock instead of
    /// failing immediately with `SQLITE_BUSY`.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, &format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS))
            .await?;
        self.execute_pragma(&conn, "PRAGMA foreign_keys = ON")
            .await?;

        Ok(conn)
    }

    /// Flush the WAL into the main database file
    ///
    /// Called on shutdown so the database file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path.clone()).await.unwrap();

        assert_eq!(db_service.db_path, db_path);
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_schema_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path).await.unwrap();
        let conn = db_service.connect().unwrap();

        let mut rows = conn
            .query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('skills', 'theories') ORDER BY name",
                (),
            )
            .await
            .unwrap();

        let mut tables = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            let name: String = row.get(0).unwrap();
            tables.push(name);
        }
        assert_eq!(tables, vec!["skills".to_string(), "theories".to_string()]);
    }

    #[tokio::test]
    async fn test_indexes_created() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path).await.unwrap();
        let conn = db_service.connect().unwrap();

        let mut rows = conn
            .query(
                "SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%'",
                (),
            )
            .await
            .unwrap();

        let mut index_names = Vec::new();
        while let Some(row) = rows.next().await.unwrap() {
            let name: String = row.get(0).unwrap();
            index_names.push(name);
        }

        assert!(index_names.contains(&"idx_theories_group".to_string()));
        assert!(index_names.contains(&"idx_theories_parent".to_string()));
        assert!(index_names.contains(&"idx_profession_skills_skill".to_string()));
    }

    #[tokio::test]
    async fn test_catalog_tables_created() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path).await.unwrap();
        let conn = db_service.connect().unwrap();

        for (table, _) in CATALOG_TABLES {
            let mut rows = conn
                .query(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = ?",
                    [*table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap().unwrap();
            let count: i64 = row.get(0).unwrap();
            assert_eq!(count, 1, "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_wal_mode_enabled() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path).await.unwrap();
        let conn = db_service.connect().unwrap();

        let mut rows = conn.query("PRAGMA journal_mode", ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let mode: String = row.get(0).unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled_per_connection() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path).await.unwrap();
        let conn = db_service.connect_with_timeout().await.unwrap();

        let mut rows = conn.query("PRAGMA foreign_keys", ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let enabled: i64 = row.get(0).unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn test_parent_directory_creation() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("nested").join("dirs").join("test.db");

        let _db_service = DatabaseService::new(nested_path.clone()).await.unwrap();

        assert!(nested_path.exists());
    }

    #[tokio::test]
    async fn test_idempotent_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let _first = DatabaseService::new(db_path.clone()).await.unwrap();
        let second = DatabaseService::new(db_path).await.unwrap();

        let conn = second.connect().unwrap();
        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('skills', 'theories')",
                (),
            )
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let count: i64 = row.get(0).unwrap();
        assert_eq!(count, 2);
    }
}
