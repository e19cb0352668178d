//! Versioned storage migrations.
//!
//! Migrations run sequentially from the stored version to the latest.

use rusqlite::Connection;
use tracing::{info, warn};

use cartas_core::constants::STORAGE_SCHEMA_VERSION;
use cartas_core::error::{CtError, CtResult};

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> CtResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version >= STORAGE_SCHEMA_VERSION {
        info!("storage schema is up to date (version {current_version})");
        return Ok(());
    }

    info!("running migrations from version {current_version} to {STORAGE_SCHEMA_VERSION}");
    for version in (current_version + 1)..=STORAGE_SCHEMA_VERSION {
        run_migration(conn, version)?;
    }

    set_schema_version(conn, STORAGE_SCHEMA_VERSION)?;
    Ok(())
}

fn get_schema_version(conn: &Connection) -> CtResult<i32> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .map_err(|e| CtError::Storage(e.to_string()))?;

    if count == 0 {
        conn.execute("INSERT INTO schema_version (version) VALUES (0)", [])
            .map_err(|e| CtError::Storage(e.to_string()))?;
        return Ok(0);
    }

    conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .map_err(|e| CtError::Storage(e.to_string()))
}

fn set_schema_version(conn: &Connection, version: i32) -> CtResult<()> {
    conn.execute("UPDATE schema_version SET version = ?1", [version])
        .map_err(|e| CtError::Storage(e.to_string()))?;
    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> CtResult<()> {
    info!("applying migration version {version}");
    match version {
        1 => migration_v1(conn),
        _ => {
            warn!("unknown migration version {version}, skipping");
            Ok(())
        }
    }
}

/// v1: stale session rows from before the session-expiry bookkeeping
/// existed are dropped so the first session starts clean.
fn migration_v1(conn: &Connection) -> CtResult<()> {
    let removed = conn
        .execute("DELETE FROM storage_items WHERE scope = 'session'", [])
        .map_err(|e| CtError::Storage(e.to_string()))?;
    if removed > 0 {
        info!("cleared {removed} legacy session keys");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    #[test]
    fn test_migrations_on_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), STORAGE_SCHEMA_VERSION);
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
    }
}
