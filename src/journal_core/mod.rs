//! Core journal statistics without I/O operations.
//!
//! This module contains pure logic over sequences of local calendar days. The
//! statistics engine in [`crate::ops::stats`] loads entry timestamps from storage
//! and hands them to these functions; nothing here touches the database or the
//! clock, so "today" is always passed in.
//!
//! All functions expect the output of [`active_days`]: distinct dates sorted
//! ascending.

use crate::dates;
use chrono::{DateTime, Months, NaiveDate, TimeZone};
use std::collections::BTreeMap;

pub use crate::constants::COMEBACK_MIN_GAP_DAYS;

/// Reduces entry timestamps to the distinct local calendar days they fall on,
/// sorted ascending.
///
/// # Examples
///
/// ```
/// use lectio::journal_core::active_days;
/// use chrono::{Local, TimeZone};
///
/// let morning = Local.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
/// let evening = Local.with_ymd_and_hms(2024, 1, 15, 21, 0, 0).unwrap();
/// assert_eq!(active_days(&[evening, morning]).len(), 1);
/// ```
pub fn active_days<Tz: TimeZone>(timestamps: &[DateTime<Tz>]) -> Vec<NaiveDate> {
    let mut days: Vec<NaiveDate> = timestamps.iter().map(dates::local_date).collect();
    days.sort_unstable();
    days.dedup();
    days
}

/// Length of the run of consecutive active days ending today or yesterday.
///
/// Returns 0 when the most recent active day is older than yesterday. Days after
/// `today` are ignored.
///
/// # Examples
///
/// ```
/// use lectio::journal_core::current_streak;
/// use chrono::NaiveDate;
///
/// let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
/// let days: Vec<NaiveDate> = [7, 8, 10]
///     .iter()
///     .map(|d| NaiveDate::from_ymd_opt(2024, 1, *d).unwrap())
///     .collect();
/// assert_eq!(current_streak(&days, today), 1);
/// ```
pub fn current_streak(days: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut past = days.iter().rev().filter(|day| **day <= today);

    let Some(&newest) = past.next() else {
        return 0;
    };
    if dates::date_span(today, newest) > 1 {
        return 0;
    }

    let mut streak = 1;
    let mut previous = newest;
    for &day in past {
        if dates::date_span(previous, day) != 1 {
            break;
        }
        streak += 1;
        previous = day;
    }
    streak
}

/// Length of the longest run of consecutive active days ever recorded.
pub fn longest_streak(days: &[NaiveDate]) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for &day in days {
        run = match previous {
            Some(prev) if dates::date_span(day, prev) == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}

/// Days without an entry between the first active day and yesterday.
///
/// Today never counts as missed; it is not over yet. The result is never negative.
pub fn missed_days(days: &[NaiveDate], today: NaiveDate) -> u32 {
    let Some(&first) = days.first() else {
        return 0;
    };
    if first >= today {
        return 0;
    }

    let span = today.signed_duration_since(first).num_days();
    let active_before_today = days.iter().filter(|day| **day < today).count() as i64;
    u32::try_from((span - active_before_today).max(0)).unwrap_or(u32::MAX)
}

/// Counts resumptions: days that are the second day of a new two-day run following
/// a gap of at least `min_gap` days.
///
/// The first run in the history is never a comeback.
pub fn comeback_days(days: &[NaiveDate], min_gap: i64) -> u32 {
    days.windows(3)
        .filter(|window| {
            let gap = window[1].signed_duration_since(window[0]).num_days();
            let step = window[2].signed_duration_since(window[1]).num_days();
            step == 1 && gap >= min_gap
        })
        .count() as u32
}

/// Buckets timestamps by local calendar day within `[start, end]`.
///
/// Days with no entries are absent from the map. An inverted range yields an
/// empty map.
pub fn daily_counts<Tz: TimeZone>(
    timestamps: &[DateTime<Tz>],
    start: NaiveDate,
    end: NaiveDate,
) -> BTreeMap<NaiveDate, u32> {
    let mut counts = BTreeMap::new();
    for day in timestamps.iter().map(dates::local_date) {
        if day >= start && day <= end {
            *counts.entry(day).or_insert(0) += 1;
        }
    }
    counts
}

/// The date `months` months before `today`, clamped to the end of shorter months.
///
/// Returns `None` when the result would fall outside chrono's calendar.
pub fn months_before(today: NaiveDate, months: u32) -> Option<NaiveDate> {
    today.checked_sub_months(Months::new(months))
}
