//! Database schema definitions and schema-version bookkeeping.
//!
//! The schema version lives in the SQLite header (`PRAGMA user_version`), so it
//! travels with the file and is written inside the same transaction as the
//! migration that bumps it.

use crate::constants::ENTRIES_TABLE;
use crate::errors::{AppResult, DatabaseError};
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

/// Current schema version.
///
/// Fresh stores are created directly at this version; older stores are brought up
/// to it by the migrations in [`crate::db::migrations`].
pub const SCHEMA_VERSION: u32 = 4;

/// DDL for the entries relation in its latest shape, under the given table name.
///
/// Migrations that rebuild the table create it under a temporary name first.
pub fn entries_table_ddl(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            book_name TEXT NOT NULL,
            chapter_start INTEGER NOT NULL CHECK(chapter_start >= 1),
            chapter_end INTEGER CHECK(chapter_end IS NULL OR chapter_end >= chapter_start),
            verse_start TEXT,
            verse_end TEXT,
            reflection_1 TEXT,
            reflection_2 TEXT,
            reflection_3 TEXT,
            reflection_4 TEXT,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#
    )
}

/// Creates the secondary indexes on the entries relation.
pub fn create_indexes(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_journal_entries_book_name ON journal_entries(book_name);
        CREATE INDEX IF NOT EXISTS idx_journal_entries_created_at ON journal_entries(created_at DESC);
        "#,
    )
    .map_err(DatabaseError::Sqlite)?;
    Ok(())
}

/// Creates the entries table and its indexes in the latest shape.
///
/// This is idempotent and does not touch the schema version.
pub fn create_tables(conn: &Connection) -> AppResult<()> {
    debug!("Creating {} table", ENTRIES_TABLE);
    conn.execute_batch(&entries_table_ddl(ENTRIES_TABLE))
        .map_err(DatabaseError::Sqlite)?;
    create_indexes(conn)?;
    Ok(())
}

/// Reads the schema version; 0 means the store has never been initialized.
pub fn get_schema_version(conn: &Connection) -> AppResult<u32> {
    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(DatabaseError::Sqlite)?;
    u32::try_from(version).map_err(|_| {
        DatabaseError::InvalidRow(format!("negative schema version {}", version)).into()
    })
}

/// Records the schema version.
pub fn set_schema_version(conn: &Connection, version: u32) -> AppResult<()> {
    conn.pragma_update(None, "user_version", version)
        .map_err(DatabaseError::Sqlite)?;
    Ok(())
}

/// Returns true when a table with the given name exists.
pub fn table_exists(conn: &Connection, table: &str) -> AppResult<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()
        .map_err(DatabaseError::Sqlite)?;
    Ok(found.is_some())
}

/// Lists the column names of a table, in declaration order.
pub fn column_names(conn: &Connection, table: &str) -> AppResult<Vec<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", table))
        .map_err(DatabaseError::Sqlite)?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(DatabaseError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::Sqlite)?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_create_tables() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        assert!(table_exists(&conn, "journal_entries").unwrap());
        let columns = column_names(&conn, "journal_entries").unwrap();
        assert_eq!(
            columns,
            vec![
                "id",
                "book_name",
                "chapter_start",
                "chapter_end",
                "verse_start",
                "verse_end",
                "reflection_1",
                "reflection_2",
                "reflection_3",
                "reflection_4",
                "notes",
                "created_at",
                "updated_at",
            ]
        );
    }

    #[test]
    fn test_indexes_created() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let index_count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='index' AND name LIKE 'idx_journal_entries_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(index_count, 2);
    }

    #[test]
    fn test_create_tables_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_chapter_constraints() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let insert = "INSERT INTO journal_entries (book_name, chapter_start, chapter_end, created_at, updated_at) VALUES (?1, ?2, ?3, 'x', 'x')";
        conn.execute(insert, rusqlite::params!["John", 3, 4]).unwrap();
        assert!(conn.execute(insert, rusqlite::params!["John", 0, None::<i64>]).is_err());
        assert!(conn.execute(insert, rusqlite::params!["John", 4, 3]).is_err());
    }

    #[test]
    fn test_schema_version_round_trip() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);
        set_schema_version(&conn, 3).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 3);
    }
}
