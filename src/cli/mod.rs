//! Command-line interface definitions.
//!
//! Arguments are parsed with clap's derive API; the handlers behind each
//! subcommand live in [`commands`].

pub mod commands;

use crate::constants::{
    APP_DESCRIPTION, APP_NAME, DEFAULT_PAGE_SIZE, LOG_FORMAT_JSON, LOG_FORMAT_TEXT,
};
use crate::ops::backup::RestoreMode;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// A scripture-reading journal with guided reflections
#[derive(Parser, Debug)]
#[command(name = APP_NAME, about = APP_DESCRIPTION, version, long_about = None)]
pub struct CliArgs {
    /// Log output format
    #[arg(
        long,
        global = true,
        default_value = LOG_FORMAT_TEXT,
        value_parser = [LOG_FORMAT_TEXT, LOG_FORMAT_JSON]
    )]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Record a new reading
    Add(EntryArgs),

    /// Change an existing entry; omitted options keep their current values
    Edit {
        /// Entry id
        id: i64,

        #[command(flatten)]
        changes: EditArgs,
    },

    /// Show one entry in full
    Show {
        /// Entry id
        id: i64,
    },

    /// List entries, newest first
    List {
        /// Maximum number of entries to show
        #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: i64,

        /// Number of entries to skip
        #[arg(short, long, default_value_t = 0)]
        offset: i64,
    },

    /// List a book's entries in chapter order
    Book {
        /// Book name, e.g. "1 John"
        name: String,
    },

    /// Search reflections and notes
    Search {
        /// Text to look for (case-insensitive)
        term: String,
    },

    /// Permanently delete an entry
    Delete {
        /// Entry id
        id: i64,
    },

    /// Show streaks and other reading statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show entries per day (defaults to the last year)
    Calendar {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Resurface a past entry
    Flashback,

    /// Export every entry to a JSON backup
    Export {
        /// Output file (defaults to lectio-backup-YYYY-MM-DD.json in the backup directory)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Restore entries from a JSON backup
    Import {
        /// Backup file
        file: String,

        /// Keep existing entries (merge) or replace them
        #[arg(short, long, value_enum, default_value_t = ImportMode::Merge)]
        mode: ImportMode,

        /// Only check the file and report what it contains
        #[arg(long)]
        dry_run: bool,
    },

    /// Exit successfully if an entry was recorded today
    Today,

    /// List the books of the Bible with their chapter counts
    Books,
}

/// Fields of a new entry.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct EntryArgs {
    /// Book name, e.g. "Genesis" or "1 John"
    pub book: String,

    /// First chapter read
    pub chapter: u32,

    /// Last chapter read, when more than one
    #[arg(long = "to")]
    pub chapter_end: Option<u32>,

    /// First verse, e.g. "16" or "16b"
    #[arg(long)]
    pub verse_start: Option<String>,

    /// Last verse
    #[arg(long)]
    pub verse_end: Option<String>,

    /// Reflection answer; repeat for up to four
    #[arg(short, long = "reflection")]
    pub reflections: Vec<String>,

    /// Free-form notes
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// Fields that `edit` may change.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct EditArgs {
    /// New book name
    #[arg(long)]
    pub book: Option<String>,

    /// New first chapter
    #[arg(long)]
    pub chapter: Option<u32>,

    /// New last chapter
    #[arg(long = "to")]
    pub chapter_end: Option<u32>,

    /// New first verse
    #[arg(long)]
    pub verse_start: Option<String>,

    /// New last verse
    #[arg(long)]
    pub verse_end: Option<String>,

    /// Replacement reflection answers; repeat for up to four
    #[arg(short, long = "reflection")]
    pub reflections: Vec<String>,

    /// Replacement notes
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// Restore mode as spelled on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Merge,
    Replace,
}

impl From<ImportMode> for RestoreMode {
    fn from(mode: ImportMode) -> Self {
        match mode {
            ImportMode::Merge => RestoreMode::Merge,
            ImportMode::Replace => RestoreMode::Replace,
        }
    }
}

/// Parse command-line arguments
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_args() {
        let args = CliArgs::parse_from([
            "lectio", "add", "John", "3", "--to", "4", "-r", "first", "-r", "second", "-n", "notes",
        ]);
        assert_eq!(args.log_format, LOG_FORMAT_TEXT);
        match args.command {
            Command::Add(entry) => {
                assert_eq!(entry.book, "John");
                assert_eq!(entry.chapter, 3);
                assert_eq!(entry.chapter_end, Some(4));
                assert_eq!(entry.reflections, vec!["first", "second"]);
                assert_eq!(entry.notes.as_deref(), Some("notes"));
            }
            other => panic!("Expected add, got {:?}", other),
        }
    }

    #[test]
    fn test_add_requires_chapter() {
        assert!(CliArgs::try_parse_from(["lectio", "add", "John"]).is_err());
        assert!(CliArgs::try_parse_from(["lectio", "add", "John", "three"]).is_err());
    }

    #[test]
    fn test_edit_args_are_optional() {
        let args = CliArgs::parse_from(["lectio", "edit", "7", "--notes", "later"]);
        assert_eq!(
            args.command,
            Command::Edit {
                id: 7,
                changes: EditArgs {
                    notes: Some("later".to_string()),
                    ..Default::default()
                },
            }
        );
    }

    #[test]
    fn test_list_defaults() {
        let args = CliArgs::parse_from(["lectio", "list"]);
        assert_eq!(
            args.command,
            Command::List {
                limit: DEFAULT_PAGE_SIZE,
                offset: 0
            }
        );
    }

    #[test]
    fn test_import_mode() {
        let args = CliArgs::parse_from(["lectio", "import", "backup.json"]);
        assert_eq!(
            args.command,
            Command::Import {
                file: "backup.json".to_string(),
                mode: ImportMode::Merge,
                dry_run: false,
            }
        );

        let args = CliArgs::parse_from([
            "lectio",
            "import",
            "backup.json",
            "--mode",
            "replace",
            "--dry-run",
        ]);
        match args.command {
            Command::Import { mode, dry_run, .. } => {
                assert_eq!(RestoreMode::from(mode), RestoreMode::Replace);
                assert!(dry_run);
            }
            other => panic!("Expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_global_log_format() {
        let args = CliArgs::parse_from(["lectio", "today", "--log-format", "json"]);
        assert_eq!(args.log_format, LOG_FORMAT_JSON);
        assert_eq!(args.command, Command::Today);

        assert!(CliArgs::try_parse_from(["lectio", "--log-format", "xml", "today"]).is_err());
    }
}
