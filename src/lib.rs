/*!
# Lectio

Lectio is a scripture-reading journal. Each entry records a passage that was read,
up to four guided reflection answers and free-form notes. The library owns the
local SQLite store and everything computed from it: reading streaks, missed and
comeback days, daily heat-map counts, flashbacks to past entries, and JSON
backup and restore.

## Architecture

- `dates`: Local-calendar-day normalization shared by every statistic
- `books`: The 66 canonical books and their chapter counts
- `db`: The SQLite store, its schema migrations and the entry repository
- `journal_core`: Pure streak and calendar algorithms over active days
- `ops`: Statistics, flashbacks and backup/restore bound to a database
- `cli`: Command-line interface handling using clap
- `config`: Configuration loading and validation
- `errors`: Error handling infrastructure

## Usage Example

```rust,no_run
use lectio::db::{entries, Database};
use lectio::ops::stats;
use lectio::Config;

fn main() -> lectio::AppResult<()> {
    let config = Config::load()?;
    let db = Database::open(&config.db_path)?;

    {
        let conn = db.get_conn()?;
        let input = entries::JournalEntryInput {
            book_name: "John".to_string(),
            chapter_start: 3,
            ..Default::default()
        };
        entries::create_entry(&conn, &input)?;
    }

    println!("Current streak: {}", stats::current_streak(&db)?);
    Ok(())
}
```
*/

/// Canonical book list and passage checks
pub mod books;
/// Command-line interface for parsing and handling user arguments
pub mod cli;
/// Configuration loading and management
pub mod config;
/// Application-wide constants
pub mod constants;
/// Local calendar day helpers and timestamp storage format
pub mod dates;
/// Database storage, migrations and entry repository
pub mod db;
/// Error types and utilities for error handling
pub mod errors;
/// Pure date-sequence algorithms
pub mod journal_core;
/// Operations over the journal store
pub mod ops;

// Re-export important types for convenience
pub use cli::CliArgs;
pub use config::Config;
pub use db::entries::{JournalEntry, JournalEntryInput};
pub use db::Database;
pub use errors::{AppError, AppResult};
