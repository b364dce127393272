//! Alma Store crate - SQLite persistence for conversation sessions.
//!
//! Provides a WAL-mode SQLite database with migrations and a repository
//! implementation for session records. Messages and memory live as JSON
//! blobs inside the session row; no normalization into separate tables.

pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::SessionRepository;
