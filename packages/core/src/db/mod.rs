//! Database Layer
//!
//! This module handles all database interactions using libsql:
//!
//! - Database initialization and connection management
//! - The `skills` / `theories` schema with cascading foreign keys, plus the
//!   profession, quest and progress catalog around it
//! - The [`TheoryStore`] and [`CatalogStore`] abstractions and their libsql
//!   implementation
//! - Domain events emitted after committed writes
//!
//! # Architecture
//!
//! `TheoryService` and `SkillService` depend only on [`TheoryStore`]. The
//! libsql implementation keeps SQL in one place; multi-statement work goes
//! through a [`TheoryTransaction`] so it commits or rolls back as a unit.

mod catalog_store;
mod database;
mod error;
pub mod events;
mod libsql_catalog;
mod libsql_store;
mod theory_store;

pub use catalog_store::{CatalogStore, SkillUnlink};
pub use database::{DatabaseService, BUSY_TIMEOUT_MS};
pub use error::DatabaseError;
pub use events::DomainEvent;
pub use libsql_store::{LibsqlTheoryStore, LibsqlTransaction};
pub use theory_store::{TheoryStore, TheoryTransaction};
