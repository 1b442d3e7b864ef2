//! Constants used throughout the application.
//!
//! This module contains all constants used in the Lectio application, organized
//! into logical groups. Having constants centralized makes them easier to find,
//! modify, and reference consistently.

// Application Metadata
/// The name of the application.
pub const APP_NAME: &str = "lectio";
/// The description of the application used in CLI help text.
pub const APP_DESCRIPTION: &str = "A scripture-reading journal with guided reflections";
/// Application version stamped into backup documents.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// Logging
/// Log format identifier for plain text.
pub const LOG_FORMAT_TEXT: &str = "text";
/// Log format identifier for JSON.
pub const LOG_FORMAT_JSON: &str = "json";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Configuration Keys & Environment Variables
/// Environment variable for the database file path.
pub const ENV_VAR_LECTIO_DB: &str = "LECTIO_DB";
/// Environment variable for the default backup export directory.
pub const ENV_VAR_LECTIO_BACKUP_DIR: &str = "LECTIO_BACKUP_DIR";
/// Standard environment variable for the user's home directory.
pub const ENV_VAR_HOME: &str = "HOME";
/// Default database location relative to the user's home directory.
pub const DEFAULT_DB_SUBPATH: &str = ".local/share/lectio/journal.db";
/// File name of the persisted flashback recency list, stored beside the database.
pub const FLASHBACK_HISTORY_FILE: &str = "flashback_history.json";

// Storage
/// Name of the single persisted relation.
pub const ENTRIES_TABLE: &str = "journal_entries";
/// Number of guided reflection answers stored per entry.
pub const REFLECTION_SLOTS: usize = 4;
/// Stand-in for a missing `chapter_end` when comparing entries for duplicates.
pub const NO_CHAPTER_END_SENTINEL: i64 = -1;
/// Milliseconds SQLite waits on a locked database before failing a statement.
pub const BUSY_TIMEOUT_MS: u64 = 5_000;
/// Milliseconds `get_conn` waits for the single pooled connection to be returned.
pub const POOL_CHECKOUT_TIMEOUT_MS: u64 = 1_000;

// Date/Time Logic
/// Date format string for ISO date format (YYYY-MM-DD).
pub const DATE_FORMAT_ISO: &str = "%Y-%m-%d";
/// Timestamp layout written by older releases (SQLite `CURRENT_TIMESTAMP`, UTC).
pub const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Number of trailing days covered by the yearly heat map.
pub const YEARLY_WINDOW_DAYS: i64 = 365;

// Statistics Policy
/// Minimum number of empty days before a two-day run counts as a comeback.
pub const COMEBACK_MIN_GAP_DAYS: i64 = 2;
/// Number of recently shown flashback ids excluded from selection.
pub const FLASHBACK_HISTORY_LIMIT: usize = 30;
/// Fewest stored entries required before any flashback is offered.
pub const FLASHBACK_MIN_ENTRIES: i64 = 2;
/// Months back for the "one month ago" flashback.
pub const FLASHBACK_MONTH_AGO: u32 = 1;
/// Months back for the "one year ago" flashback.
pub const FLASHBACK_YEAR_AGO: u32 = 12;

// Backup
/// Version string of the backup document layout.
pub const BACKUP_FORMAT_VERSION: &str = "1.0";
/// Prefix of exported backup file names.
pub const BACKUP_FILE_PREFIX: &str = "lectio-backup-";
/// Extension of exported backup file names.
pub const BACKUP_FILE_EXTENSION: &str = ".json";
/// Two entries closer together than this are treated as the same entry on merge.
pub const DUPLICATE_WINDOW_SECONDS: i64 = 60;

// Listing
/// Default page size for `list`.
pub const DEFAULT_PAGE_SIZE: i64 = 20;
