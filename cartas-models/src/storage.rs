//! Client key-value storage with `local` and `session` scopes.
//!
//! Backed by SQLite with r2d2 pooling. The `local` scope persists forever;
//! the `session` scope is discarded once it has been idle for longer than
//! the configured timeout, which gives a CLI the same "per visit" lifetime a
//! browser tab gives session storage. Every session write refreshes the
//! activity timestamp.

use std::path::Path;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use cartas_core::config::StorageConfig;
use cartas_core::constants::keys;
use cartas_core::error::{CtError, CtResult};

use crate::migrations;
use crate::schema;

/// Type alias for the SQLite connection pool.
pub type StoragePool = Pool<SqliteConnectionManager>;

/// Lifetime of a stored key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Survives restarts.
    Local,
    /// Expires after the session idle timeout.
    Session,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Local => "local",
            Scope::Session => "session",
        }
    }
}

/// Pooled key-value store.
#[derive(Clone)]
pub struct Storage {
    pool: Arc<StoragePool>,
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn storage_err(e: impl std::fmt::Display) -> CtError {
    CtError::Storage(e.to_string())
}

impl Storage {
    /// Open (or create) the store at `path`, apply schema and migrations,
    /// and expire the session scope if it has gone idle.
    pub fn open(path: &Path, config: &StorageConfig) -> CtResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("opening storage at {}", path.display());

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .connection_customizer(Box::new(ConnectionCustomizer {
                wal_mode: config.wal_mode,
            }))
            .build(manager)
            .map_err(|e| CtError::Pool(e.to_string()))?;

        let storage = Self { pool: Arc::new(pool) };
        storage.prepare()?;

        let idle_ms = (config.session_idle_minutes as i64).saturating_mul(60_000);
        storage.expire_idle_session(now_ms(), idle_ms)?;
        Ok(storage)
    }

    /// In-memory store for tests and dry runs. Limited to one connection so
    /// every caller sees the same database.
    pub fn open_in_memory() -> CtResult<Self> {
        let pool = Pool::builder()
            .max_size(1)
            .build(SqliteConnectionManager::memory())
            .map_err(|e| CtError::Pool(e.to_string()))?;
        let storage = Self { pool: Arc::new(pool) };
        storage.prepare()?;
        Ok(storage)
    }

    fn prepare(&self) -> CtResult<()> {
        let conn = self.conn()?;
        schema::create_tables(&conn)?;
        migrations::run_migrations(&conn)
    }

    /// Get a connection from the pool.
    pub fn conn(&self) -> CtResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| CtError::Pool(e.to_string()))
    }

    /// Read a raw string value.
    pub fn get(&self, scope: Scope, key: &str) -> CtResult<Option<String>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT value FROM storage_items WHERE scope = ?1 AND key = ?2",
            params![scope.as_str(), key],
            |row| row.get(0),
        )
        .optional()
        .map_err(storage_err)
    }

    /// Write a raw string value.
    pub fn set(&self, scope: Scope, key: &str, value: &str) -> CtResult<()> {
        let conn = self.conn()?;
        let now = now_ms();
        upsert(&conn, scope, key, value, now)?;
        if scope == Scope::Session {
            upsert(&conn, Scope::Session, keys::SESSION_LAST_SEEN, &now.to_string(), now)?;
        }
        debug!("storage set {}:{key}", scope.as_str());
        Ok(())
    }

    /// Remove a key. Returns whether it existed.
    pub fn remove(&self, scope: Scope, key: &str) -> CtResult<bool> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "DELETE FROM storage_items WHERE scope = ?1 AND key = ?2",
                params![scope.as_str(), key],
            )
            .map_err(storage_err)?;
        Ok(changed > 0)
    }

    /// Read and deserialize a JSON value. Unparseable values read as `None`
    /// so a corrupted flag never blocks the caller.
    pub fn get_json<T: DeserializeOwned>(&self, scope: Scope, key: &str) -> CtResult<Option<T>> {
        let Some(raw) = self.get(scope, key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!("ignoring malformed value for {}:{key}: {e}", scope.as_str());
                Ok(None)
            }
        }
    }

    /// Serialize and write a JSON value.
    pub fn set_json<T: Serialize + ?Sized>(&self, scope: Scope, key: &str, value: &T) -> CtResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set(scope, key, &raw)
    }

    /// Read an unsigned counter; missing or malformed values read as zero.
    pub fn get_u64(&self, scope: Scope, key: &str) -> CtResult<u64> {
        Ok(self
            .get(scope, key)?
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0))
    }

    /// Increment a counter and return the new value.
    pub fn increment(&self, scope: Scope, key: &str) -> CtResult<u64> {
        let next = self.get_u64(scope, key)? + 1;
        self.set(scope, key, &next.to_string())?;
        Ok(next)
    }

    /// All keys in `scope` starting with `prefix`, sorted.
    pub fn keys_with_prefix(&self, scope: Scope, prefix: &str) -> CtResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT key FROM storage_items WHERE scope = ?1 AND substr(key, 1, ?2) = ?3 ORDER BY key")
            .map_err(storage_err)?;
        let keys = stmt
            .query_map(
                params![scope.as_str(), prefix.chars().count() as i64, prefix],
                |row| row.get::<_, String>(0),
            )
            .map_err(storage_err)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(keys)
    }

    /// Remove every key in `scope`.
    pub fn clear_scope(&self, scope: Scope) -> CtResult<usize> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM storage_items WHERE scope = ?1", [scope.as_str()])
            .map_err(storage_err)
    }

    /// Drop the session scope if its last activity is older than `idle_ms`.
    /// Returns whether the session was expired.
    pub fn expire_idle_session(&self, now: i64, idle_ms: i64) -> CtResult<bool> {
        let last_seen = self
            .get(Scope::Session, keys::SESSION_LAST_SEEN)?
            .and_then(|v| v.parse::<i64>().ok());

        match last_seen {
            Some(ts) if now.saturating_sub(ts) > idle_ms => {
                let removed = self.clear_scope(Scope::Session)?;
                info!("session idle for {}s, cleared {removed} keys", (now - ts) / 1000);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Row counts per scope.
    pub fn stats(&self) -> CtResult<StorageStats> {
        let conn = self.conn()?;
        let count = |scope: Scope| -> CtResult<i64> {
            conn.query_row(
                "SELECT COUNT(*) FROM storage_items WHERE scope = ?1",
                [scope.as_str()],
                |row| row.get(0),
            )
            .map_err(storage_err)
        };
        Ok(StorageStats {
            local: count(Scope::Local)?,
            session: count(Scope::Session)?,
        })
    }

    /// Wipe and recreate the store.
    pub fn reset(&self) -> CtResult<()> {
        warn!("resetting client storage");
        let conn = self.conn()?;
        schema::drop_tables(&conn)?;
        schema::create_tables(&conn)?;
        migrations::run_migrations(&conn)
    }
}

fn upsert(conn: &Connection, scope: Scope, key: &str, value: &str, now: i64) -> CtResult<()> {
    conn.execute(
        "INSERT INTO storage_items (scope, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(scope, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![scope.as_str(), key, value, now],
    )
    .map_err(storage_err)?;
    Ok(())
}

/// Key counts per scope.
#[derive(Debug, Clone, Copy)]
pub struct StorageStats {
    pub local: i64,
    pub session: i64,
}

impl std::fmt::Display for StorageStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "local={}, session={}", self.local, self.session)
    }
}

/// r2d2 connection customizer that applies PRAGMA settings.
#[derive(Debug)]
struct ConnectionCustomizer {
    wal_mode: bool,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        if self.wal_mode {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }
        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;",
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_remove() {
        let s = Storage::open_in_memory().unwrap();
        assert_eq!(s.get(Scope::Local, "token").unwrap(), None);
        s.set(Scope::Local, "token", "abc").unwrap();
        assert_eq!(s.get(Scope::Local, "token").unwrap().as_deref(), Some("abc"));
        assert_eq!(s.get(Scope::Session, "token").unwrap(), None);
        assert!(s.remove(Scope::Local, "token").unwrap());
        assert!(!s.remove(Scope::Local, "token").unwrap());
    }

    #[test]
    fn test_json_and_counters() {
        let s = Storage::open_in_memory().unwrap();
        s.set_json(Scope::Local, "tours", &vec!["home", "generator"]).unwrap();
        let tours: Vec<String> = s.get_json(Scope::Local, "tours").unwrap().unwrap();
        assert_eq!(tours, vec!["home", "generator"]);

        s.set(Scope::Local, "broken", "{not json").unwrap();
        let broken: Option<Vec<String>> = s.get_json(Scope::Local, "broken").unwrap();
        assert!(broken.is_none());

        assert_eq!(s.increment(Scope::Session, "count").unwrap(), 1);
        assert_eq!(s.increment(Scope::Session, "count").unwrap(), 2);
        assert_eq!(s.get_u64(Scope::Session, "count").unwrap(), 2);
    }

    #[test]
    fn test_keys_with_prefix() {
        let s = Storage::open_in_memory().unwrap();
        s.set(Scope::Local, "visited_tone_formal", "1").unwrap();
        s.set(Scope::Local, "visited_tone_amistoso", "1").unwrap();
        s.set(Scope::Local, "visited_occasion_amor", "1").unwrap();
        let keys = s.keys_with_prefix(Scope::Local, "visited_tone_").unwrap();
        assert_eq!(keys, vec!["visited_tone_amistoso", "visited_tone_formal"]);
    }

    #[test]
    fn test_idle_session_expires() {
        let s = Storage::open_in_memory().unwrap();
        s.set(Scope::Session, "usage_session_count", "3").unwrap();
        s.set(Scope::Local, "token", "abc").unwrap();

        let now = now_ms();
        assert!(!s.expire_idle_session(now, 60_000).unwrap());
        assert!(s.expire_idle_session(now + 120_000, 60_000).unwrap());

        assert_eq!(s.get(Scope::Session, "usage_session_count").unwrap(), None);
        assert_eq!(s.get(Scope::Local, "token").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_file_storage_persists_local() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cartas.db");
        let config = StorageConfig::default();
        {
            let s = Storage::open(&path, &config).unwrap();
            s.set(Scope::Local, "token", "persisted").unwrap();
        }
        let s = Storage::open(&path, &config).unwrap();
        assert_eq!(s.get(Scope::Local, "token").unwrap().as_deref(), Some("persisted"));
        assert_eq!(s.stats().unwrap().local, 1);
    }
}
