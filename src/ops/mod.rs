//! High-level operations over the journal store.
//!
//! This module provides the operations that read across many entries at once:
//! reading statistics, flashbacks, and backup/restore. Each takes a `&Database`
//! and checks out its connection for the duration of the call.

pub mod backup;
pub mod flashback;
pub mod stats;

// Re-export commonly used functions
pub use backup::{
    export_all, parse_backup, restore, validate_backup, validate_document, BackupDocument,
    BackupEntry, BackupValidation, RestoreMode, RestoreReport,
};
pub use flashback::{flashback_entry, Flashback, FlashbackKind, RecentFlashbacks};
pub use stats::{
    comeback_days_count, current_streak, daily_entry_counts, has_entry_today, longest_streak,
    missed_days_count, summarize, total_entries, yearly_entry_counts, StatsSummary,
};
