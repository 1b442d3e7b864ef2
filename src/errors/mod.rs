//! Error handling utilities for the lectio application.
//!
//! This module provides the central error type `AppError` which represents all
//! possible error conditions that might occur in the application, as well as the
//! convenience type alias `AppResult` for functions that can return these errors.

use thiserror::Error;

/// Represents specific error cases that can occur during database operations.
///
/// # Examples
///
/// ```
/// use lectio::errors::DatabaseError;
///
/// let error = DatabaseError::NotFound("Entry with id 123 not found".to_string());
/// assert!(format!("{}", error).contains("not found"));
/// ```
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLite database error.
    #[error("Database error: {0}\n\nIf you're seeing 'file is not a database' errors, the journal file may be corrupted or was not created by lectio.")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("Failed to get connection from pool: {0}\n\nThis may indicate database connection issues. Try closing other lectio instances.")]
    Pool(#[from] r2d2::Error),

    /// Requested entry not found in database.
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// A schema migration step failed and was rolled back.
    #[error("Migration to schema version {version} failed: {message}")]
    Migration {
        /// Version the failed step was migrating to
        version: u32,
        /// Description of the failure
        message: String,
    },

    /// The store was written by a newer release than this binary understands.
    #[error("Database schema version {found} is newer than the latest supported version {latest}. Please upgrade lectio.")]
    UnsupportedVersion {
        /// Version recorded in the store
        found: u32,
        /// Latest version this binary knows
        latest: u32,
    },

    /// A stored row did not have the expected shape.
    #[error("Unexpected row in journal_entries: {0}")]
    InvalidRow(String),
}

/// Input that breaks the structural invariants of a journal entry.
///
/// # Examples
///
/// ```
/// use lectio::errors::ValidationError;
///
/// let error = ValidationError::ChapterEndBeforeStart { start: 5, end: 3 };
/// assert!(format!("{}", error).contains("5"));
/// ```
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Every entry must name a book.
    #[error("Book name is required")]
    EmptyBookName,

    /// Chapter 0 is the UI's "nothing selected" marker and never a real chapter.
    #[error("Chapter start must be 1 or greater")]
    ChapterStartZero,

    /// A range must not run backwards.
    #[error("Chapter end {end} is before chapter start {start}")]
    ChapterEndBeforeStart {
        /// First chapter of the passage
        start: u32,
        /// Last chapter of the passage
        end: u32,
    },

    /// The book name is not one of the 66 canonical books.
    #[error("Unknown book '{0}'. Run `lectio books` for the list of book names.")]
    UnknownBook(String),

    /// The chapter does not exist in the given book.
    #[error("{book} has only {chapters} chapters (got {chapter})")]
    ChapterOutOfRange {
        /// Canonical book name
        book: String,
        /// Number of chapters in the book
        chapters: u32,
        /// Requested chapter
        chapter: u32,
    },

    /// More reflection answers than an entry has slots for.
    #[error("An entry holds at most {max} reflections (got {got})")]
    TooManyReflections {
        /// Number of reflection slots
        max: usize,
        /// Number of answers supplied
        got: usize,
    },

    /// A calendar date string could not be parsed.
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Structural problems with a backup document.
///
/// These never carry a raw parser error type across the API; the message is always
/// human-readable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BackupError {
    /// The file is not valid JSON or does not have the expected layout.
    #[error("Backup file is not valid: {0}")]
    Malformed(String),

    /// A required envelope field is absent.
    #[error("Backup file is missing the required field '{0}'")]
    MissingField(&'static str),

    /// The document contains no entries to restore.
    #[error("Backup file contains no entries")]
    EmptyEntries,

    /// A field is present but has an unusable value.
    #[error("Backup file has an invalid value: {0}")]
    InvalidField(String),
}

/// Represents all possible errors that can occur in the lectio application.
///
/// This enum is the central error type used across the application, with variants
/// for different error categories.
///
/// # Examples
///
/// ```
/// use lectio::errors::AppError;
///
/// let error = AppError::Config("Missing database path".to_string());
/// assert_eq!(format!("{}", error), "Configuration error: Missing database path");
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Errors related to configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input/output errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors related to database operations.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Entry input rejected before it reached storage.
    #[error("Invalid entry: {0}")]
    Validation(#[from] ValidationError),

    /// Backup document could not be read or validated.
    #[error("Backup error: {0}")]
    Backup(#[from] BackupError),
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Database(DatabaseError::Sqlite(err))
    }
}

/// A type alias for `Result<T, AppError>` to simplify function signatures.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_app_error_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_error: AppError = io_error.into();

        match app_error {
            AppError::Io(inner) => {
                assert_eq!(inner.kind(), io::ErrorKind::NotFound);
            }
            _ => panic!("Expected AppError::Io variant"),
        }
    }

    #[test]
    fn test_app_error_display() {
        let config_error = AppError::Config("Invalid configuration".to_string());
        assert_eq!(
            format!("{}", config_error),
            "Configuration error: Invalid configuration"
        );

        let validation = AppError::Validation(ValidationError::ChapterStartZero);
        assert_eq!(
            format!("{}", validation),
            "Invalid entry: Chapter start must be 1 or greater"
        );

        let backup = AppError::Backup(BackupError::MissingField("entries"));
        assert!(format!("{}", backup).contains("'entries'"));
    }

    #[test]
    fn test_sqlite_error_converts_to_database_variant() {
        let err: AppError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(
            err,
            AppError::Database(DatabaseError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
        ));
    }

    #[test]
    fn test_migration_error_mentions_version() {
        let error = DatabaseError::Migration {
            version: 3,
            message: "boom".to_string(),
        };
        let text = format!("{}", error);
        assert!(text.contains("version 3"));
        assert!(text.contains("boom"));
    }

    #[test]
    fn test_unknown_book_error_points_at_books_command() {
        let error = ValidationError::UnknownBook("Hezekiah".to_string());
        assert!(format!("{}", error).contains("lectio books"));
    }
}
