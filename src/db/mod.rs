//! Database operations for journal entries.
//!
//! This module owns the single SQLite store. The store is opened once at start-up
//! through [`Database::open`], which also brings the schema up to date, and the
//! resulting handle is passed by reference to every operation.
//!
//! # Module Structure
//!
//! - `schema`: Table definitions and schema version bookkeeping
//! - `migrations`: Versioned upgrades from older stores
//! - `entries`: Entry CRUD operations and typed row mapping
//!
//! # Example
//!
//! ```no_run
//! use lectio::db::Database;
//! use std::path::Path;
//!
//! let db = Database::open(Path::new("/tmp/lectio.db"))?;
//! let conn = db.get_conn()?;
//! let total = lectio::db::entries::count_entries(&conn)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod entries;
pub mod migrations;
pub mod schema;

use crate::constants::{BUSY_TIMEOUT_MS, POOL_CHECKOUT_TIMEOUT_MS};
use crate::errors::{AppResult, DatabaseError};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Type alias for a pooled SQLite connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Handle to the journal store.
///
/// The pool holds exactly one connection for the lifetime of the handle; SQLite
/// serializes statements on it. Callers must release a connection before asking
/// for another one.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Opens or creates the store at `db_path` and migrates it to the latest schema.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened or is not a SQLite database
    /// - The store was written by a newer release
    /// - A migration fails
    ///
    /// The application must not continue with reads or writes after a failure here.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        debug!("Opening database at: {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        Self::with_manager(SqliteConnectionManager::file(db_path))
    }

    /// Opens a private in-memory store, migrated to the latest schema.
    pub fn open_in_memory() -> AppResult<Self> {
        Self::with_manager(SqliteConnectionManager::memory())
    }

    fn with_manager(manager: SqliteConnectionManager) -> AppResult<Self> {
        // No idle timeout or lifetime: recycling the only connection would lose an
        // in-memory store.
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_timeout(Duration::from_millis(POOL_CHECKOUT_TIMEOUT_MS))
            .connection_customizer(Box::new(ConnectionPragmas))
            .build(manager)
            .map_err(DatabaseError::Pool)?;

        let db = Database { pool };
        let version = {
            let mut conn = db.get_conn()?;
            migrations::migrate(&mut conn)?
        };

        info!("Database ready at schema version {}", version);
        Ok(db)
    }

    /// Gets the shared connection.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Pool` if the connection is still checked out after
    /// `POOL_CHECKOUT_TIMEOUT_MS`. Drop one `PooledConnection` before asking for
    /// the next.
    pub fn get_conn(&self) -> AppResult<PooledConnection> {
        self.pool
            .get()
            .map_err(|e| DatabaseError::Pool(e).into())
    }

    /// Reads the schema version recorded in the store.
    pub fn schema_version(&self) -> AppResult<u32> {
        let conn = self.get_conn()?;
        schema::get_schema_version(&conn)
    }
}

/// Connection customizer applied when the connection is first established.
#[derive(Debug)]
struct ConnectionPragmas;

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(())
    }

    fn on_release(&self, _conn: Connection) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use tempfile::TempDir;

    #[test]
    fn test_database_open_and_connect() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db = Database::open(&db_path).unwrap();
        let conn = db.get_conn().unwrap();

        let result: i32 = conn
            .query_row("SELECT 1 + 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(result, 2);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("deeper").join("test.db");

        Database::open(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_open_initializes_schema() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.schema_version().unwrap(), schema::SCHEMA_VERSION);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        {
            let db = Database::open(&db_path).unwrap();
            let conn = db.get_conn().unwrap();
            conn.execute(
                "INSERT INTO journal_entries (book_name, chapter_start, created_at, updated_at) VALUES ('John', 1, 'a', 'a')",
                [],
            )
            .unwrap();
        }

        let db = Database::open(&db_path).unwrap();
        let conn = db.get_conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM journal_entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_open_rejects_non_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("not-a-db.db");
        std::fs::write(&db_path, "not a database ".repeat(100)).unwrap();

        assert!(Database::open(&db_path).is_err());
    }

    #[test]
    fn test_second_checkout_fails_fast_while_connection_is_held() {
        let db = Database::open_in_memory().unwrap();
        let _held = db.get_conn().unwrap();

        let started = std::time::Instant::now();
        let err = db.get_conn().unwrap_err();
        assert!(matches!(err, AppError::Database(DatabaseError::Pool(_))));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_in_memory_store_survives_between_checkouts() {
        let db = Database::open_in_memory().unwrap();
        {
            let conn = db.get_conn().unwrap();
            conn.execute(
                "INSERT INTO journal_entries (book_name, chapter_start, created_at, updated_at) VALUES ('John', 1, 'a', 'a')",
                [],
            )
            .unwrap();
        }
        let conn = db.get_conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM journal_entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
