//! Reading-habit statistics.
//!
//! Every number here is computed from the set of local calendar days that have at
//! least one entry. Timestamps are loaded from storage once per call and handed to
//! the pure algorithms in [`crate::journal_core`].

use crate::constants::{COMEBACK_MIN_GAP_DAYS, YEARLY_WINDOW_DAYS};
use crate::dates;
use crate::db::entries;
use crate::db::Database;
use crate::errors::AppResult;
use crate::journal_core;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Aggregate of every statistic, as shown by `lectio stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub total_entries: i64,
    pub has_entry_today: bool,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub missed_days: u32,
    pub comeback_days: u32,
    pub active_days: usize,
    pub books_read: i64,
    /// Local date of the earliest entry, if any.
    pub first_entry: Option<NaiveDate>,
}

fn load_active_days(db: &Database) -> AppResult<Vec<NaiveDate>> {
    let conn = db.get_conn()?;
    let timestamps = entries::created_timestamps(&conn)?;
    let days = journal_core::active_days(&timestamps);
    debug!(
        "Loaded {} timestamps across {} active days",
        timestamps.len(),
        days.len()
    );
    Ok(days)
}

/// True when an entry exists on today's local date.
///
/// The reminder scheduler uses this to decide whether to keep nagging.
pub fn has_entry_today(db: &Database) -> AppResult<bool> {
    has_entry_on(db, dates::today())
}

/// True when an entry exists on the given local date.
pub fn has_entry_on(db: &Database, day: NaiveDate) -> AppResult<bool> {
    let conn = db.get_conn()?;
    let count = entries::count_created_between(
        &conn,
        &dates::midnight_of(day),
        &dates::midnight_of(day + Duration::days(1)),
    )?;
    Ok(count > 0)
}

/// Total number of entries.
pub fn total_entries(db: &Database) -> AppResult<i64> {
    let conn = db.get_conn()?;
    entries::count_entries(&conn)
}

/// Consecutive active days ending today or yesterday.
pub fn current_streak(db: &Database) -> AppResult<u32> {
    let days = load_active_days(db)?;
    Ok(journal_core::current_streak(&days, dates::today()))
}

/// Longest run of consecutive active days in the whole history.
pub fn longest_streak(db: &Database) -> AppResult<u32> {
    let days = load_active_days(db)?;
    Ok(journal_core::longest_streak(&days))
}

/// Days without an entry since the first entry, not counting today.
pub fn missed_days_count(db: &Database) -> AppResult<u32> {
    let days = load_active_days(db)?;
    Ok(journal_core::missed_days(&days, dates::today()))
}

/// Number of times reading resumed after a lapse of at least
/// [`COMEBACK_MIN_GAP_DAYS`] days.
pub fn comeback_days_count(db: &Database) -> AppResult<u32> {
    comeback_days_count_with_gap(db, COMEBACK_MIN_GAP_DAYS)
}

/// [`comeback_days_count`] with an explicit minimum gap.
pub fn comeback_days_count_with_gap(db: &Database, min_gap: i64) -> AppResult<u32> {
    let days = load_active_days(db)?;
    Ok(journal_core::comeback_days(&days, min_gap))
}

/// Entries per local calendar day for the inclusive range `[start, end]`.
///
/// Days without entries are absent from the map. `start` after `end` yields an
/// empty map.
pub fn daily_entry_counts(
    db: &Database,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<BTreeMap<NaiveDate, u32>> {
    if start > end {
        debug!("Empty range {} to {}", start, end);
        return Ok(BTreeMap::new());
    }

    let conn = db.get_conn()?;
    let timestamps = entries::created_timestamps_between(
        &conn,
        &dates::midnight_of(start),
        &dates::midnight_of(end + Duration::days(1)),
    )?;
    Ok(journal_core::daily_counts(&timestamps, start, end))
}

/// Daily counts for the trailing year ending today.
pub fn yearly_entry_counts(db: &Database) -> AppResult<BTreeMap<NaiveDate, u32>> {
    let today = dates::today();
    daily_entry_counts(db, today - Duration::days(YEARLY_WINDOW_DAYS), today)
}

/// Computes every statistic against a single snapshot of the store.
pub fn summarize(db: &Database) -> AppResult<StatsSummary> {
    summarize_on(db, dates::today())
}

/// [`summarize`] with an explicit "today".
pub fn summarize_on(db: &Database, today: NaiveDate) -> AppResult<StatsSummary> {
    let (total_entries, books_read, timestamps) = {
        let conn = db.get_conn()?;
        (
            entries::count_entries(&conn)?,
            entries::count_distinct_books(&conn)?,
            entries::created_timestamps(&conn)?,
        )
    };
    let days = journal_core::active_days(&timestamps);

    let summary = StatsSummary {
        total_entries,
        has_entry_today: days.binary_search(&today).is_ok(),
        current_streak: journal_core::current_streak(&days, today),
        longest_streak: journal_core::longest_streak(&days),
        missed_days: journal_core::missed_days(&days, today),
        comeback_days: journal_core::comeback_days(&days, COMEBACK_MIN_GAP_DAYS),
        active_days: days.len(),
        books_read,
        first_entry: days.first().copied(),
    };
    debug!("Computed stats summary: {:?}", summary);
    Ok(summary)
}
