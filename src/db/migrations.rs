//! Versioned, upward-only schema migrations.
//!
//! Each [`Migration`] moves the store from `version() - 1` to `version()`. The
//! manager applies pending migrations one at a time, each inside its own
//! transaction together with the `user_version` bump, so an interrupted upgrade
//! leaves the store at the last fully applied version.
//!
//! # Schema history
//!
//! - v1: original layout with `personal_notes`, an unused `is_favorite` flag and
//!   timestamps in SQLite's `CURRENT_TIMESTAMP` layout.
//! - v2: `notes` replaces `personal_notes`.
//! - v3: timestamps normalized to UTC RFC 3339 with microseconds.
//! - v4: table rebuilt without the obsolete columns.

use crate::constants::ENTRIES_TABLE;
use crate::dates;
use crate::db::schema::{self, SCHEMA_VERSION};
use crate::errors::{AppResult, DatabaseError};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

/// Version of the first schema ever written.
pub const INITIAL_VERSION: u32 = 1;

/// A single schema upgrade step.
pub trait Migration: Sync {
    /// The version the store is at after this migration.
    fn version(&self) -> u32;

    /// Short human-readable summary used in logs.
    fn description(&self) -> &'static str;

    /// Transforms the store. Runs inside a transaction owned by the manager and
    /// must be safe to run against a store that already has the change.
    fn apply(&self, conn: &Connection) -> AppResult<()>;
}

/// All known migrations in ascending version order.
pub const MIGRATIONS: &[&dyn Migration] =
    &[&AddNotesColumn, &NormalizeTimestamps, &DropLegacyColumns];

/// Brings the store up to [`SCHEMA_VERSION`] and returns the resulting version.
///
/// A brand-new store is created directly in the latest shape. A store that has a
/// `journal_entries` table but no recorded version predates versioning and is
/// treated as v1.
///
/// # Errors
///
/// Returns `DatabaseError::UnsupportedVersion` if the store is newer than this
/// binary, or `DatabaseError::Migration` if a step fails (that step is rolled
/// back and earlier steps stay committed).
pub fn migrate(conn: &mut Connection) -> AppResult<u32> {
    let mut current = schema::get_schema_version(conn)?;

    if current > SCHEMA_VERSION {
        return Err(DatabaseError::UnsupportedVersion {
            found: current,
            latest: SCHEMA_VERSION,
        }
        .into());
    }

    if current == 0 {
        if schema::table_exists(conn, ENTRIES_TABLE)? {
            info!("Found unversioned journal_entries table, treating it as schema v1");
            schema::set_schema_version(conn, INITIAL_VERSION)?;
            current = INITIAL_VERSION;
        } else {
            initialize(conn)?;
            return Ok(SCHEMA_VERSION);
        }
    }

    apply_pending(conn, current, MIGRATIONS)
}

/// Creates a fresh store at the latest version in one transaction.
fn initialize(conn: &mut Connection) -> AppResult<()> {
    let tx = conn.transaction().map_err(DatabaseError::Sqlite)?;
    schema::create_tables(&tx)?;
    schema::set_schema_version(&tx, SCHEMA_VERSION)?;
    tx.commit().map_err(DatabaseError::Sqlite)?;
    info!("Initialized new database at schema version {}", SCHEMA_VERSION);
    Ok(())
}

/// Applies every migration newer than `current`, in order.
///
/// Migrations must form a contiguous sequence starting right after `current`.
pub fn apply_pending(
    conn: &mut Connection,
    mut current: u32,
    migrations: &[&dyn Migration],
) -> AppResult<u32> {
    let start = current;
    for migration in migrations.iter().filter(|m| m.version() > start) {
        let version = migration.version();
        if version != current + 1 {
            return Err(DatabaseError::Migration {
                version,
                message: format!("no migration path from version {}", current),
            }
            .into());
        }

        info!(
            "Migrating schema v{} -> v{}: {}",
            current,
            version,
            migration.description()
        );

        let tx = conn.transaction().map_err(DatabaseError::Sqlite)?;
        migration
            .apply(&tx)
            .and_then(|_| schema::set_schema_version(&tx, version))
            .map_err(|e| DatabaseError::Migration {
                version,
                message: e.to_string(),
            })?;
        tx.commit().map_err(|e| DatabaseError::Migration {
            version,
            message: e.to_string(),
        })?;

        current = version;
    }

    debug!("Schema is at version {}", current);
    Ok(current)
}

/// v2: adds `notes` and carries over anything written to `personal_notes`.
pub struct AddNotesColumn;

impl Migration for AddNotesColumn {
    fn version(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "add notes column, coalescing personal_notes"
    }

    fn apply(&self, conn: &Connection) -> AppResult<()> {
        let columns = schema::column_names(conn, ENTRIES_TABLE)?;

        if !columns.iter().any(|c| c == "notes") {
            conn.execute_batch("ALTER TABLE journal_entries ADD COLUMN notes TEXT;")
                .map_err(DatabaseError::Sqlite)?;
        }

        if columns.iter().any(|c| c == "personal_notes") {
            let moved = conn
                .execute(
                    "UPDATE journal_entries SET notes = COALESCE(notes, personal_notes) WHERE personal_notes IS NOT NULL",
                    [],
                )
                .map_err(DatabaseError::Sqlite)?;
            debug!("Coalesced personal_notes into notes for {} rows", moved);
        }

        Ok(())
    }
}

/// v3: rewrites every timestamp in the canonical storage layout.
pub struct NormalizeTimestamps;

impl Migration for NormalizeTimestamps {
    fn version(&self) -> u32 {
        3
    }

    fn description(&self) -> &'static str {
        "normalize timestamps to UTC RFC 3339"
    }

    fn apply(&self, conn: &Connection) -> AppResult<()> {
        let rows: Vec<(i64, String, Option<String>)> = {
            let mut stmt = conn
                .prepare("SELECT id, created_at, updated_at FROM journal_entries")
                .map_err(DatabaseError::Sqlite)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
                .map_err(DatabaseError::Sqlite)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(DatabaseError::Sqlite)?;
            rows
        };

        for (id, created_raw, updated_raw) in &rows {
            let created = dates::parse_lenient(created_raw).ok_or_else(|| {
                DatabaseError::InvalidRow(format!(
                    "entry {} has unreadable created_at '{}'",
                    id, created_raw
                ))
            })?;
            // A missing or unreadable updated_at falls back to created_at.
            let updated = updated_raw
                .as_deref()
                .and_then(dates::parse_lenient)
                .map_or(created, |ts| ts.max(created));

            conn.execute(
                "UPDATE journal_entries SET created_at = ?1, updated_at = ?2 WHERE id = ?3",
                params![dates::to_storage(&created), dates::to_storage(&updated), id],
            )
            .map_err(DatabaseError::Sqlite)?;
        }

        debug!("Normalized timestamps for {} rows", rows.len());
        Ok(())
    }
}

/// v4: rebuilds the table without `personal_notes` and `is_favorite`.
///
/// Ids are carried over and the AUTOINCREMENT high-water mark is preserved so that
/// ids of deleted entries are never handed out again.
pub struct DropLegacyColumns;

impl DropLegacyColumns {
    const LEGACY_COLUMNS: [&'static str; 2] = ["personal_notes", "is_favorite"];
    const REBUILD_TABLE: &'static str = "journal_entries_rebuilt";
}

impl Migration for DropLegacyColumns {
    fn version(&self) -> u32 {
        4
    }

    fn description(&self) -> &'static str {
        "rebuild journal_entries without obsolete columns"
    }

    fn apply(&self, conn: &Connection) -> AppResult<()> {
        let columns = schema::column_names(conn, ENTRIES_TABLE)?;
        if !columns
            .iter()
            .any(|c| Self::LEGACY_COLUMNS.contains(&c.as_str()))
        {
            debug!("No legacy columns present, skipping rebuild");
            return schema::create_indexes(conn);
        }

        let high_water = autoincrement_seq(conn)?;

        conn.execute_batch(&schema::entries_table_ddl(Self::REBUILD_TABLE))
            .map_err(DatabaseError::Sqlite)?;

        // Chapter values that would break the new CHECK constraints are repaired:
        // chapter 0 becomes 1 and a backwards range collapses to a single chapter.
        conn.execute_batch(&format!(
            r#"
            INSERT INTO {rebuilt} (
                id, book_name, chapter_start, chapter_end, verse_start, verse_end,
                reflection_1, reflection_2, reflection_3, reflection_4, notes,
                created_at, updated_at
            )
            SELECT
                id,
                book_name,
                MAX(COALESCE(chapter_start, 1), 1),
                CASE
                    WHEN chapter_end IS NOT NULL AND chapter_end < MAX(COALESCE(chapter_start, 1), 1)
                    THEN NULL
                    ELSE chapter_end
                END,
                verse_start,
                verse_end,
                reflection_1,
                reflection_2,
                reflection_3,
                reflection_4,
                notes,
                created_at,
                COALESCE(updated_at, created_at)
            FROM journal_entries;

            DROP TABLE journal_entries;
            ALTER TABLE {rebuilt} RENAME TO journal_entries;
            "#,
            rebuilt = Self::REBUILD_TABLE
        ))
        .map_err(DatabaseError::Sqlite)?;

        if let Some(seq) = high_water {
            restore_autoincrement_seq(conn, seq)?;
        }

        schema::create_indexes(conn)
    }
}

/// Current AUTOINCREMENT counter of the entries table, if one has been issued.
fn autoincrement_seq(conn: &Connection) -> AppResult<Option<i64>> {
    if !schema::table_exists(conn, "sqlite_sequence")? {
        return Ok(None);
    }
    let seq = conn
        .query_row(
            "SELECT seq FROM sqlite_sequence WHERE name = ?1",
            [ENTRIES_TABLE],
            |row| row.get(0),
        )
        .optional()
        .map_err(DatabaseError::Sqlite)?;
    Ok(seq)
}

/// Raises the AUTOINCREMENT counter of the entries table to at least `seq`.
fn restore_autoincrement_seq(conn: &Connection, seq: i64) -> AppResult<()> {
    let updated = conn
        .execute(
            "UPDATE sqlite_sequence SET seq = MAX(seq, ?1) WHERE name = ?2",
            params![seq, ENTRIES_TABLE],
        )
        .map_err(DatabaseError::Sqlite)?;
    if updated == 0 {
        conn.execute(
            "INSERT INTO sqlite_sequence (name, seq) VALUES (?1, ?2)",
            params![ENTRIES_TABLE, seq],
        )
        .map_err(DatabaseError::Sqlite)?;
    }
    Ok(())
}
