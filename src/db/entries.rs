//! Entry CRUD operations.
//!
//! This module provides functions for creating, reading, updating, searching and
//! deleting rows of `journal_entries`, plus the narrow timestamp queries the
//! statistics engine needs. Raw rows are converted into [`JournalEntry`] at this
//! boundary; a row with an unexpected shape is reported as an error rather than
//! passed upward.

use crate::constants::{NO_CHAPTER_END_SENTINEL, REFLECTION_SLOTS};
use crate::dates;
use crate::errors::{AppResult, DatabaseError, ValidationError};
use chrono::{DateTime, Duration, Local};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fmt;
use tracing::debug;

/// Columns selected for every full-entry query, in [`row_to_entry`] order.
const ENTRY_COLUMNS: &str = "id, book_name, chapter_start, chapter_end, verse_start, verse_end, \
     reflection_1, reflection_2, reflection_3, reflection_4, notes, created_at, updated_at";

/// A persisted journal entry.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub id: i64,
    pub book_name: String,
    pub chapter_start: u32,
    pub chapter_end: Option<u32>,
    pub verse_start: Option<String>,
    pub verse_end: Option<String>,
    pub reflections: [Option<String>; REFLECTION_SLOTS],
    pub notes: Option<String>,
    /// Set once at creation, shown in local time.
    pub created_at: DateTime<Local>,
    /// Refreshed on every update, shown in local time.
    pub updated_at: DateTime<Local>,
}

impl JournalEntry {
    /// Human-readable passage reference, e.g. `John 3:16-18` or `Acts 1-2`.
    pub fn passage(&self) -> String {
        let mut reference = format!("{} {}", self.book_name, self.chapter_start);
        if let Some(verse) = &self.verse_start {
            reference.push_str(&format!(":{}", verse));
        }
        match (self.chapter_end, &self.verse_end) {
            (Some(end), Some(verse)) if end != self.chapter_start => {
                reference.push_str(&format!("-{}:{}", end, verse))
            }
            (Some(end), None) if end != self.chapter_start => {
                reference.push_str(&format!("-{}", end))
            }
            (_, Some(verse)) => reference.push_str(&format!("-{}", verse)),
            _ => {}
        }
        reference
    }
}

impl fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} ({})",
            self.id,
            self.passage(),
            self.created_at.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Caller-supplied fields for creating or overwriting an entry.
///
/// `reflections` may hold any number of answers; it is padded with `None` or
/// truncated to exactly four slots on write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalEntryInput {
    pub book_name: String,
    pub chapter_start: u32,
    pub chapter_end: Option<u32>,
    pub verse_start: Option<String>,
    pub verse_end: Option<String>,
    pub reflections: Vec<Option<String>>,
    pub notes: Option<String>,
}

impl JournalEntryInput {
    /// Checks the structural invariants of an entry.
    ///
    /// Chapter 0 is the UI's "no selection" marker and is always rejected.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.book_name.trim().is_empty() {
            return Err(ValidationError::EmptyBookName);
        }
        if self.chapter_start == 0 {
            return Err(ValidationError::ChapterStartZero);
        }
        if let Some(end) = self.chapter_end {
            if end < self.chapter_start {
                return Err(ValidationError::ChapterEndBeforeStart {
                    start: self.chapter_start,
                    end,
                });
            }
        }
        Ok(())
    }

    /// The reflections fitted to exactly four slots.
    pub fn reflection_slots(&self) -> [Option<String>; REFLECTION_SLOTS] {
        let mut slots: [Option<String>; REFLECTION_SLOTS] = Default::default();
        for (slot, answer) in slots.iter_mut().zip(self.reflections.iter()) {
            slot.clone_from(answer);
        }
        slots
    }
}

impl From<&JournalEntry> for JournalEntryInput {
    fn from(entry: &JournalEntry) -> Self {
        JournalEntryInput {
            book_name: entry.book_name.clone(),
            chapter_start: entry.chapter_start,
            chapter_end: entry.chapter_end,
            verse_start: entry.verse_start.clone(),
            verse_end: entry.verse_end.clone(),
            reflections: entry.reflections.to_vec(),
            notes: entry.notes.clone(),
        }
    }
}

fn conversion_failure<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

fn read_chapter(row: &Row<'_>, column: usize) -> rusqlite::Result<Option<u32>> {
    row.get::<_, Option<i64>>(column)?
        .map(|value| {
            u32::try_from(value).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(column, Type::Integer, Box::new(e))
            })
        })
        .transpose()
}

fn read_timestamp(row: &Row<'_>, column: usize) -> rusqlite::Result<DateTime<Local>> {
    let raw: String = row.get(column)?;
    dates::from_storage(&raw).map_err(|e| conversion_failure(column, e))
}

/// Maps a row selected with [`ENTRY_COLUMNS`] into a [`JournalEntry`].
fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<JournalEntry> {
    let chapter_start = read_chapter(row, 2)?.ok_or_else(|| {
        conversion_failure(
            2,
            DatabaseError::InvalidRow("chapter_start is NULL".to_string()),
        )
    })?;

    Ok(JournalEntry {
        id: row.get(0)?,
        book_name: row.get(1)?,
        chapter_start,
        chapter_end: read_chapter(row, 3)?,
        verse_start: row.get(4)?,
        verse_end: row.get(5)?,
        reflections: [row.get(6)?, row.get(7)?, row.get(8)?, row.get(9)?],
        notes: row.get(10)?,
        created_at: read_timestamp(row, 11)?,
        updated_at: read_timestamp(row, 12)?,
    })
}

fn query_entries<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> AppResult<Vec<JournalEntry>> {
    let mut stmt = conn.prepare(sql).map_err(DatabaseError::Sqlite)?;
    let entries = stmt
        .query_map(params, row_to_entry)
        .map_err(DatabaseError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::Sqlite)?;
    Ok(entries)
}

/// Creates a new entry stamped with the current time. Returns the new id.
///
/// # Errors
///
/// Returns a validation error for input that breaks the entry invariants, or a
/// database error if the insert fails.
pub fn create_entry(conn: &Connection, input: &JournalEntryInput) -> AppResult<i64> {
    let now = Local::now();
    insert_entry_at(conn, input, &now, &now)
}

/// Inserts an entry with explicit timestamps, as restore does.
///
/// An `updated_at` earlier than `created_at` is raised to `created_at`.
pub fn insert_entry_at(
    conn: &Connection,
    input: &JournalEntryInput,
    created_at: &DateTime<Local>,
    updated_at: &DateTime<Local>,
) -> AppResult<i64> {
    input.validate()?;
    let [r1, r2, r3, r4] = input.reflection_slots();
    let updated_at = (*updated_at).max(*created_at);

    conn.execute(
        r#"
        INSERT INTO journal_entries (
            book_name, chapter_start, chapter_end, verse_start, verse_end,
            reflection_1, reflection_2, reflection_3, reflection_4, notes,
            created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
        params![
            input.book_name,
            input.chapter_start,
            input.chapter_end,
            input.verse_start,
            input.verse_end,
            r1,
            r2,
            r3,
            r4,
            input.notes,
            dates::to_storage(created_at),
            dates::to_storage(&updated_at),
        ],
    )
    .map_err(DatabaseError::Sqlite)?;

    let id = conn.last_insert_rowid();
    debug!("Created entry {} for {} {}", id, input.book_name, input.chapter_start);
    Ok(id)
}

/// Overwrites every mutable field of an existing entry.
///
/// `id` and `created_at` are preserved. `updated_at` becomes the current time, or
/// one microsecond past its previous value if the clock has not moved on, so it
/// always strictly increases.
///
/// # Errors
///
/// Returns `DatabaseError::NotFound` if no entry has this id.
pub fn update_entry(conn: &Connection, id: i64, input: &JournalEntryInput) -> AppResult<()> {
    input.validate()?;

    let previous: Option<(String, String)> = conn
        .query_row(
            "SELECT created_at, updated_at FROM journal_entries WHERE id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(DatabaseError::Sqlite)?;
    let (created_raw, updated_raw) = previous
        .ok_or_else(|| DatabaseError::NotFound(format!("Entry with id {} not found", id)))?;

    let created_at = dates::from_storage(&created_raw)?;
    let previous_update = dates::from_storage(&updated_raw)?;
    let updated_at = Local::now()
        .max(previous_update + Duration::microseconds(1))
        .max(created_at);

    let [r1, r2, r3, r4] = input.reflection_slots();
    conn.execute(
        r#"
        UPDATE journal_entries SET
            book_name = ?1,
            chapter_start = ?2,
            chapter_end = ?3,
            verse_start = ?4,
            verse_end = ?5,
            reflection_1 = ?6,
            reflection_2 = ?7,
            reflection_3 = ?8,
            reflection_4 = ?9,
            notes = ?10,
            updated_at = ?11
        WHERE id = ?12
        "#,
        params![
            input.book_name,
            input.chapter_start,
            input.chapter_end,
            input.verse_start,
            input.verse_end,
            r1,
            r2,
            r3,
            r4,
            input.notes,
            dates::to_storage(&updated_at),
            id,
        ],
    )
    .map_err(DatabaseError::Sqlite)?;

    debug!("Updated entry {}", id);
    Ok(())
}

/// Retrieves an entry by id. Returns `Ok(None)` if it does not exist.
pub fn get_entry(conn: &Connection, id: i64) -> AppResult<Option<JournalEntry>> {
    debug!("Getting entry {}", id);

    let entry = conn
        .query_row(
            &format!("SELECT {} FROM journal_entries WHERE id = ?1", ENTRY_COLUMNS),
            params![id],
            row_to_entry,
        )
        .optional()
        .map_err(DatabaseError::Sqlite)?;
    Ok(entry)
}

/// Lists entries newest first.
pub fn list_entries(conn: &Connection, limit: i64, offset: i64) -> AppResult<Vec<JournalEntry>> {
    debug!("Listing entries (limit {}, offset {})", limit, offset);
    query_entries(
        conn,
        &format!(
            "SELECT {} FROM journal_entries ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
            ENTRY_COLUMNS
        ),
        params![limit, offset],
    )
}

/// Lists every entry oldest first.
pub fn all_entries(conn: &Connection) -> AppResult<Vec<JournalEntry>> {
    query_entries(
        conn,
        &format!(
            "SELECT {} FROM journal_entries ORDER BY created_at ASC, id ASC",
            ENTRY_COLUMNS
        ),
        [],
    )
}

/// Lists a book's entries in scripture order.
pub fn list_entries_by_book(conn: &Connection, book_name: &str) -> AppResult<Vec<JournalEntry>> {
    debug!("Listing entries for {}", book_name);
    query_entries(
        conn,
        &format!(
            "SELECT {} FROM journal_entries WHERE book_name = ?1 \
             ORDER BY chapter_start ASC, created_at ASC, id ASC",
            ENTRY_COLUMNS
        ),
        params![book_name],
    )
}

/// Escapes LIKE wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Whether any reflection or the notes contain `needle`, which must be lowercase.
fn mentions(entry: &JournalEntry, needle: &str) -> bool {
    entry
        .reflections
        .iter()
        .chain(std::iter::once(&entry.notes))
        .flatten()
        .any(|text| text.to_lowercase().contains(needle))
}

/// Case-insensitive substring search across the reflections and notes, newest first.
///
/// An empty or whitespace-only term returns no entries rather than all of them.
/// ASCII terms are matched with SQLite `LIKE`; since `LIKE` only folds ASCII
/// letters, other terms are compared after Unicode lowercasing on this side.
pub fn search_entries(conn: &Connection, term: &str) -> AppResult<Vec<JournalEntry>> {
    let term = term.trim();
    if term.is_empty() {
        debug!("Ignoring empty search term");
        return Ok(Vec::new());
    }

    if !term.is_ascii() {
        let needle = term.to_lowercase();
        let all = query_entries(
            conn,
            &format!(
                "SELECT {} FROM journal_entries ORDER BY created_at DESC, id DESC",
                ENTRY_COLUMNS
            ),
            [],
        )?;
        return Ok(all.into_iter().filter(|e| mentions(e, &needle)).collect());
    }

    let pattern = format!("%{}%", escape_like(term));
    query_entries(
        conn,
        &format!(
            r#"
            SELECT {} FROM journal_entries
            WHERE reflection_1 LIKE ?1 ESCAPE '\'
               OR reflection_2 LIKE ?1 ESCAPE '\'
               OR reflection_3 LIKE ?1 ESCAPE '\'
               OR reflection_4 LIKE ?1 ESCAPE '\'
               OR notes LIKE ?1 ESCAPE '\'
            ORDER BY created_at DESC, id DESC
            "#,
            ENTRY_COLUMNS
        ),
        params![pattern],
    )
}

/// Permanently deletes an entry.
///
/// # Errors
///
/// Returns `DatabaseError::NotFound` if no entry has this id.
pub fn delete_entry(conn: &Connection, id: i64) -> AppResult<()> {
    let deleted = conn
        .execute("DELETE FROM journal_entries WHERE id = ?1", params![id])
        .map_err(DatabaseError::Sqlite)?;

    if deleted == 0 {
        return Err(DatabaseError::NotFound(format!("Entry with id {} not found", id)).into());
    }

    debug!("Deleted entry {}", id);
    Ok(())
}

/// Deletes every entry. Returns how many were removed.
pub fn delete_all_entries(conn: &Connection) -> AppResult<usize> {
    let deleted = conn
        .execute("DELETE FROM journal_entries", [])
        .map_err(DatabaseError::Sqlite)?;
    debug!("Deleted all {} entries", deleted);
    Ok(deleted)
}

/// Total number of entries.
pub fn count_entries(conn: &Connection) -> AppResult<i64> {
    let count = conn
        .query_row("SELECT COUNT(*) FROM journal_entries", [], |row| row.get(0))
        .map_err(DatabaseError::Sqlite)?;
    Ok(count)
}

/// Number of entries for one book.
pub fn count_entries_by_book(conn: &Connection, book_name: &str) -> AppResult<i64> {
    let count = conn
        .query_row(
            "SELECT COUNT(*) FROM journal_entries WHERE book_name = ?1",
            params![book_name],
            |row| row.get(0),
        )
        .map_err(DatabaseError::Sqlite)?;
    Ok(count)
}

/// Number of distinct books with at least one entry.
pub fn count_distinct_books(conn: &Connection) -> AppResult<i64> {
    let count = conn
        .query_row(
            "SELECT COUNT(DISTINCT book_name) FROM journal_entries",
            [],
            |row| row.get(0),
        )
        .map_err(DatabaseError::Sqlite)?;
    Ok(count)
}

/// Creation times of every entry, oldest first.
pub fn created_timestamps(conn: &Connection) -> AppResult<Vec<DateTime<Local>>> {
    let mut stmt = conn
        .prepare("SELECT created_at FROM journal_entries ORDER BY created_at ASC")
        .map_err(DatabaseError::Sqlite)?;
    let timestamps = stmt
        .query_map([], |row| read_timestamp(row, 0))
        .map_err(DatabaseError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::Sqlite)?;
    Ok(timestamps)
}

/// Creation times in the half-open window `[from, to)`, oldest first.
pub fn created_timestamps_between(
    conn: &Connection,
    from: &DateTime<Local>,
    to: &DateTime<Local>,
) -> AppResult<Vec<DateTime<Local>>> {
    let mut stmt = conn
        .prepare(
            "SELECT created_at FROM journal_entries \
             WHERE created_at >= ?1 AND created_at < ?2 ORDER BY created_at ASC",
        )
        .map_err(DatabaseError::Sqlite)?;
    let timestamps = stmt
        .query_map(
            params![dates::to_storage(from), dates::to_storage(to)],
            |row| read_timestamp(row, 0),
        )
        .map_err(DatabaseError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::Sqlite)?;
    Ok(timestamps)
}

/// Number of entries created in `[from, to)`.
pub fn count_created_between(
    conn: &Connection,
    from: &DateTime<Local>,
    to: &DateTime<Local>,
) -> AppResult<i64> {
    let count = conn
        .query_row(
            "SELECT COUNT(*) FROM journal_entries WHERE created_at >= ?1 AND created_at < ?2",
            params![dates::to_storage(from), dates::to_storage(to)],
            |row| row.get(0),
        )
        .map_err(DatabaseError::Sqlite)?;
    Ok(count)
}

/// Ids of entries created in `[from, to)`, oldest first.
pub fn ids_created_between(
    conn: &Connection,
    from: &DateTime<Local>,
    to: &DateTime<Local>,
) -> AppResult<Vec<i64>> {
    let mut stmt = conn
        .prepare(
            "SELECT id FROM journal_entries \
             WHERE created_at >= ?1 AND created_at < ?2 ORDER BY created_at ASC",
        )
        .map_err(DatabaseError::Sqlite)?;
    let ids = stmt
        .query_map(
            params![dates::to_storage(from), dates::to_storage(to)],
            |row| row.get(0),
        )
        .map_err(DatabaseError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::Sqlite)?;
    Ok(ids)
}

/// Ids of entries created strictly before `before`, oldest first.
pub fn ids_created_before(conn: &Connection, before: &DateTime<Local>) -> AppResult<Vec<i64>> {
    let mut stmt = conn
        .prepare("SELECT id FROM journal_entries WHERE created_at < ?1 ORDER BY created_at ASC")
        .map_err(DatabaseError::Sqlite)?;
    let ids = stmt
        .query_map(params![dates::to_storage(before)], |row| row.get(0))
        .map_err(DatabaseError::Sqlite)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DatabaseError::Sqlite)?;
    Ok(ids)
}

/// Finds an entry that is the same passage as the given one and was created within
/// `window` of `created_at`.
///
/// A missing `chapter_end` only matches another missing `chapter_end`.
pub fn find_near_duplicate(
    conn: &Connection,
    book_name: &str,
    chapter_start: u32,
    chapter_end: Option<u32>,
    created_at: &DateTime<Local>,
    window: Duration,
) -> AppResult<Option<i64>> {
    let id = conn
        .query_row(
            r#"
            SELECT id FROM journal_entries
            WHERE book_name = ?1
              AND chapter_start = ?2
              AND COALESCE(chapter_end, ?3) = COALESCE(?4, ?3)
              AND created_at >= ?5
              AND created_at <= ?6
            ORDER BY id ASC
            LIMIT 1
            "#,
            params![
                book_name,
                chapter_start,
                NO_CHAPTER_END_SENTINEL,
                chapter_end,
                dates::to_storage(&(*created_at - window)),
                dates::to_storage(&(*created_at + window)),
            ],
            |row| row.get(0),
        )
        .optional()
        .map_err(DatabaseError::Sqlite)?;
    Ok(id)
}
