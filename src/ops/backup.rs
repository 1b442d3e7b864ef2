//! Backup and restore of journal entries as portable JSON documents.
//!
//! This module exports every entry into a [`BackupDocument`], checks documents
//! before they are restored, and restores them either on top of the existing
//! entries (merge) or in place of them (replace).
//!
//! The document layout is the interchange format between releases and devices:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "exportDate": "2024-03-01T21:15:00.000Z",
//!   "appVersion": "0.1.0",
//!   "totalEntries": 1,
//!   "entries": [{ "book_name": "John", "chapter_start": 3, "created_at": "..." }]
//! }
//! ```

use crate::constants::{
    APP_VERSION, BACKUP_FILE_EXTENSION, BACKUP_FILE_PREFIX, BACKUP_FORMAT_VERSION,
    DATE_FORMAT_ISO, DUPLICATE_WINDOW_SECONDS,
};
use crate::dates;
use crate::db::entries::{self, JournalEntry, JournalEntryInput};
use crate::db::Database;
use crate::errors::{AppResult, BackupError, DatabaseError};
use chrono::{DateTime, Duration, Local, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Envelope fields every backup document must carry.
const REQUIRED_FIELDS: [&str; 3] = ["version", "exportDate", "entries"];

/// A full snapshot of the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub version: String,
    pub export_date: String,
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub total_entries: usize,
    #[serde(deserialize_with = "entries_one_by_one")]
    pub entries: Vec<BackupEntry>,
}

/// Reads each entry on its own so a mistyped entry does not reject its siblings.
fn entries_one_by_one<'de, D>(deserializer: D) -> Result<Vec<BackupEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values.into_iter().map(BackupEntry::from_value).collect())
}

/// One entry as it appears in a backup document.
///
/// Fields are kept loose here so that a single bad entry is skipped on restore
/// instead of rejecting the whole document. An entry whose JSON does not fit this
/// shape at all is kept with `unreadable` set and fails on restore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Original id; informational only, the store assigns new ids on restore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub book_name: String,
    #[serde(default)]
    pub chapter_start: i64,
    #[serde(default)]
    pub chapter_end: Option<i64>,
    #[serde(default)]
    pub verse_start: Option<String>,
    #[serde(default)]
    pub verse_end: Option<String>,
    #[serde(default)]
    pub reflection_1: Option<String>,
    #[serde(default)]
    pub reflection_2: Option<String>,
    #[serde(default)]
    pub reflection_3: Option<String>,
    #[serde(default)]
    pub reflection_4: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Why the entry's JSON could not be read, if it could not.
    #[serde(skip)]
    pub unreadable: Option<String>,
}

impl From<&JournalEntry> for BackupEntry {
    fn from(entry: &JournalEntry) -> Self {
        let [r1, r2, r3, r4] = entry.reflections.clone();
        BackupEntry {
            id: Some(entry.id),
            book_name: entry.book_name.clone(),
            chapter_start: i64::from(entry.chapter_start),
            chapter_end: entry.chapter_end.map(i64::from),
            verse_start: entry.verse_start.clone(),
            verse_end: entry.verse_end.clone(),
            reflection_1: r1,
            reflection_2: r2,
            reflection_3: r3,
            reflection_4: r4,
            notes: entry.notes.clone(),
            created_at: dates::to_storage(&entry.created_at),
            updated_at: Some(dates::to_storage(&entry.updated_at)),
            unreadable: None,
        }
    }
}

/// An incoming entry converted into repository input plus its original timestamps.
struct RestorableEntry {
    input: JournalEntryInput,
    created_at: DateTime<Local>,
    updated_at: DateTime<Local>,
}

fn chapter(field: &str, value: i64) -> Result<u32, BackupError> {
    u32::try_from(value)
        .map_err(|_| BackupError::InvalidField(format!("{} {} is out of range", field, value)))
}

fn timestamp(field: &str, value: &str) -> Result<DateTime<Local>, BackupError> {
    dates::parse_lenient(value)
        .map(|ts| ts.with_timezone(&Local))
        .ok_or_else(|| {
            BackupError::InvalidField(format!("{} '{}' is not a timestamp", field, value))
        })
}

impl BackupEntry {
    fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| BackupEntry {
            unreadable: Some(e.to_string()),
            ..Default::default()
        })
    }

    /// The creation time, if it can be read.
    pub fn created(&self) -> Option<DateTime<Local>> {
        timestamp("created_at", &self.created_at).ok()
    }

    fn to_restorable(&self) -> Result<RestorableEntry, BackupError> {
        if let Some(reason) = &self.unreadable {
            return Err(BackupError::InvalidField(reason.clone()));
        }
        let created_at = timestamp("created_at", &self.created_at)?;
        let updated_at = match &self.updated_at {
            Some(raw) => timestamp("updated_at", raw)?,
            None => created_at,
        };

        let input = JournalEntryInput {
            book_name: self.book_name.clone(),
            chapter_start: chapter("chapter_start", self.chapter_start)?,
            chapter_end: self
                .chapter_end
                .map(|end| chapter("chapter_end", end))
                .transpose()?,
            verse_start: self.verse_start.clone(),
            verse_end: self.verse_end.clone(),
            reflections: vec![
                self.reflection_1.clone(),
                self.reflection_2.clone(),
                self.reflection_3.clone(),
                self.reflection_4.clone(),
            ],
            notes: self.notes.clone(),
        };
        input
            .validate()
            .map_err(|e| BackupError::InvalidField(e.to_string()))?;

        Ok(RestorableEntry {
            input,
            created_at,
            updated_at,
        })
    }
}

/// How a restore treats the entries already in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestoreMode {
    /// Keep existing entries and add incoming ones that are not duplicates.
    Merge,
    /// Delete every existing entry, then add all incoming ones.
    Replace,
}

/// Outcome of a restore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    /// Entries actually inserted
    pub imported: usize,
    /// Incoming entries skipped as duplicates of existing ones (merge only)
    pub skipped_duplicates: usize,
    /// Incoming entries that could not be inserted
    pub failed: usize,
}

/// Result of checking a backup document without touching the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupValidation {
    pub valid: bool,
    pub entry_count: usize,
    /// Local dates of the earliest and latest readable `created_at`.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub error: Option<String>,
}

/// Snapshots every entry, oldest first.
pub fn export_all(db: &Database) -> AppResult<BackupDocument> {
    let conn = db.get_conn()?;
    let entries: Vec<BackupEntry> = entries::all_entries(&conn)?
        .iter()
        .map(BackupEntry::from)
        .collect();

    info!("Exported {} entries", entries.len());
    Ok(BackupDocument {
        version: BACKUP_FORMAT_VERSION.to_string(),
        export_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        app_version: APP_VERSION.to_string(),
        total_entries: entries.len(),
        entries,
    })
}

/// Parses a backup document from JSON text.
///
/// # Errors
///
/// Returns a [`BackupError`] if the text is not JSON, lacks `version`,
/// `exportDate` or `entries`, or has an empty or non-array `entries`.
pub fn parse_backup(json: &str) -> Result<BackupDocument, BackupError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| BackupError::Malformed(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| BackupError::Malformed("expected a JSON object".to_string()))?;

    for field in REQUIRED_FIELDS {
        if object.get(field).map_or(true, Value::is_null) {
            return Err(BackupError::MissingField(field));
        }
    }

    match object.get("entries").and_then(Value::as_array) {
        Some(list) if list.is_empty() => return Err(BackupError::EmptyEntries),
        Some(_) => {}
        None => {
            return Err(BackupError::InvalidField(
                "'entries' must be an array".to_string(),
            ))
        }
    }

    serde_json::from_value(value).map_err(|e| BackupError::Malformed(e.to_string()))
}

/// Checks an already-parsed document.
pub fn validate_document(document: &BackupDocument) -> BackupValidation {
    if document.entries.is_empty() {
        return BackupValidation {
            valid: false,
            entry_count: 0,
            date_range: None,
            error: Some(BackupError::EmptyEntries.to_string()),
        };
    }

    let days: Vec<NaiveDate> = document
        .entries
        .iter()
        .filter_map(BackupEntry::created)
        .map(|ts| ts.date_naive())
        .collect();
    let date_range = days
        .iter()
        .min()
        .zip(days.iter().max())
        .map(|(first, last)| (*first, *last));

    BackupValidation {
        valid: true,
        entry_count: document.entries.len(),
        date_range,
        error: None,
    }
}

/// Parses and checks JSON text, reporting failures in the result.
pub fn validate_backup(json: &str) -> BackupValidation {
    match parse_backup(json) {
        Ok(document) => validate_document(&document),
        Err(e) => BackupValidation {
            valid: false,
            entry_count: 0,
            date_range: None,
            error: Some(e.to_string()),
        },
    }
}

/// Restores a document into the store.
///
/// The whole restore runs in one transaction. Entries that cannot be converted or
/// inserted are logged and skipped. In merge mode an incoming entry is a duplicate
/// when an existing one has the same book, chapter start and chapter end, and was
/// created within a minute of it.
///
/// # Errors
///
/// Returns `BackupError::EmptyEntries` before touching the store if the document
/// has no entries, or a database error if the transaction itself fails.
pub fn restore(
    db: &Database,
    document: &BackupDocument,
    mode: RestoreMode,
) -> AppResult<RestoreReport> {
    if document.entries.is_empty() {
        return Err(BackupError::EmptyEntries.into());
    }

    let start = Instant::now();
    info!(
        "Restoring {} entries in {:?} mode",
        document.entries.len(),
        mode
    );

    let mut conn = db.get_conn()?;
    let tx = conn.transaction().map_err(DatabaseError::Sqlite)?;

    if mode == RestoreMode::Replace {
        let removed = entries::delete_all_entries(&tx)?;
        debug!("Removed {} existing entries", removed);
    }

    let window = Duration::seconds(DUPLICATE_WINDOW_SECONDS);
    let mut report = RestoreReport::default();

    for (index, incoming) in document.entries.iter().enumerate() {
        let restorable = match incoming.to_restorable() {
            Ok(restorable) => restorable,
            Err(e) => {
                warn!("Skipping backup entry {}: {}", index, e);
                report.failed += 1;
                continue;
            }
        };

        if mode == RestoreMode::Merge {
            let duplicate = entries::find_near_duplicate(
                &tx,
                &restorable.input.book_name,
                restorable.input.chapter_start,
                restorable.input.chapter_end,
                &restorable.created_at,
                window,
            )?;
            if let Some(existing) = duplicate {
                debug!("Backup entry {} duplicates entry {}", index, existing);
                report.skipped_duplicates += 1;
                continue;
            }
        }

        match entries::insert_entry_at(
            &tx,
            &restorable.input,
            &restorable.created_at,
            &restorable.updated_at,
        ) {
            Ok(_) => report.imported += 1,
            Err(e) => {
                warn!("Failed to insert backup entry {}: {}", index, e);
                report.failed += 1;
            }
        }
    }

    tx.commit().map_err(DatabaseError::Sqlite)?;

    info!(
        "Restore finished in {:?}: {} imported, {} duplicates, {} failed",
        start.elapsed(),
        report.imported,
        report.skipped_duplicates,
        report.failed
    );
    Ok(report)
}

/// File name used for an export made on `date`, e.g. `lectio-backup-2024-03-01.json`.
pub fn default_backup_file_name(date: NaiveDate) -> String {
    format!(
        "{}{}{}",
        BACKUP_FILE_PREFIX,
        date.format(DATE_FORMAT_ISO),
        BACKUP_FILE_EXTENSION
    )
}

/// Writes a document as pretty-printed JSON.
///
/// The file is written to a temporary sibling first and renamed into place, so an
/// existing backup at `path` is never left half-written.
pub fn write_backup_file(document: &BackupDocument, path: &Path) -> AppResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let json = serde_json::to_string_pretty(document).map_err(std::io::Error::from)?;
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(json.as_bytes())?;
    temp.flush()?;
    temp.persist(path).map_err(|e| e.error)?;

    info!(
        "Wrote backup of {} entries to {:?}",
        document.entries.len(),
        path
    );
    Ok(())
}

/// Reads and parses a backup file.
pub fn read_backup_file(path: &Path) -> AppResult<BackupDocument> {
    debug!("Reading backup from {:?}", path);
    let json = fs::read_to_string(path)?;
    Ok(parse_backup(&json)?)
}
