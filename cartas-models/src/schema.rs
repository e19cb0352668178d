//! Storage schema definitions and table creation.
//!
//! The client keeps only key-value state, split into a persistent `local`
//! scope and an expiring `session` scope.

use rusqlite::Connection;
use tracing::info;

use cartas_core::error::{CtError, CtResult};

/// Create all tables and indexes if they do not exist.
pub fn create_tables(conn: &Connection) -> CtResult<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| CtError::Storage(format!("failed to create schema: {e}")))?;
    info!("storage schema verified");
    Ok(())
}

/// Drop all tables (used for storage reset).
pub fn drop_tables(conn: &Connection) -> CtResult<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS storage_items;
         DROP TABLE IF EXISTS schema_version;",
    )
    .map_err(|e| CtError::Storage(format!("failed to drop tables: {e}")))?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS storage_items (
    scope       TEXT    NOT NULL CHECK (scope IN ('local', 'session')),
    key         TEXT    NOT NULL,
    value       TEXT    NOT NULL,
    updated_at  INTEGER NOT NULL,
    PRIMARY KEY (scope, key)
);

CREATE INDEX IF NOT EXISTS idx_storage_items_scope_key ON storage_items(scope, key);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_twice() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_scope_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let bad = conn.execute(
            "INSERT INTO storage_items (scope, key, value, updated_at) VALUES ('cookie', 'k', 'v', 0)",
            [],
        );
        assert!(bad.is_err());
    }
}
