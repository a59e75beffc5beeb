//! Learner Core Business Logic Layer
//!
//! This crate provides the data model, the ordered-tree engine and the
//! services behind Learner's per-skill theory forests.
//!
//! # Architecture
//!
//! - **Flat rows, derived trees**: theories are stored with a parent id and a
//!   zero-based sibling rank; nested trees exist only when materialized
//! - **Contiguous ordering**: every sibling group is ranked exactly `0..N-1`
//!   after each insertion, move and deletion
//! - **libsql**: embedded SQLite-compatible database, one write transaction
//!   per mutation
//!
//! # Modules
//!
//! - [`models`] - Data structures (Skill, Theory, TheoryTree, catalog records)
//! - [`operations`] - Store-independent tree algorithms
//! - [`services`] - Business services (theories, skills, professions, quests,
//!   progress)
//! - [`db`] - Database layer with libsql integration

pub mod db;
pub mod models;
pub mod operations;
pub mod services;

// Re-export commonly used types
pub use models::*;
pub use services::*;
