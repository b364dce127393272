//! Database schema migrations.
//!
//! Applies the initial schema: the sessions table and the
//! schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use alma_core::error::AlmaError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental changes.
pub fn run_migrations(conn: &Connection) -> Result<(), AlmaError> {
    // Create the migrations tracking table first.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| AlmaError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| AlmaError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), AlmaError> {
    conn.execute_batch(
        "
        -- One row per conversation session. Messages and memory are stored
        -- as JSON blobs; timestamps are unix milliseconds.
        CREATE TABLE IF NOT EXISTS sessions (
            id          TEXT PRIMARY KEY NOT NULL,
            user_id     TEXT NOT NULL,
            title       TEXT,
            messages    TEXT NOT NULL DEFAULT '[]',
            mode        TEXT NOT NULL DEFAULT 'ask'
                        CHECK (mode IN ('ask', 'reflect', 'quiet')),
            memory      TEXT NOT NULL DEFAULT '{}',
            created_at  INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_user_id
            ON sessions (user_id, updated_at DESC);

        CREATE INDEX IF NOT EXISTS idx_sessions_updated_at
            ON sessions (updated_at DESC);

        -- Record migration.
        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| AlmaError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}
