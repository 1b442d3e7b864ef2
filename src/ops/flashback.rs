//! Resurfacing past entries.
//!
//! A flashback prefers an entry written exactly one year ago, then one written
//! exactly one month ago, and otherwise picks a random older entry. Callers keep a
//! [`RecentFlashbacks`] list so the same entries are not shown again and again.

use crate::constants::{
    FLASHBACK_HISTORY_LIMIT, FLASHBACK_MIN_ENTRIES, FLASHBACK_MONTH_AGO, FLASHBACK_YEAR_AGO,
};
use crate::dates;
use crate::db::entries::{self, JournalEntry};
use crate::db::Database;
use crate::errors::AppResult;
use crate::journal_core;
use chrono::{Duration, NaiveDate};
use rand::seq::IteratorRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Why an entry was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashbackKind {
    YearAgo,
    MonthAgo,
    Random,
}

impl std::fmt::Display for FlashbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FlashbackKind::YearAgo => "One year ago today",
            FlashbackKind::MonthAgo => "One month ago today",
            FlashbackKind::Random => "From your journal",
        };
        f.write_str(label)
    }
}

/// A resurfaced entry and the reason it was picked.
#[derive(Debug, Clone, PartialEq)]
pub struct Flashback {
    pub entry: JournalEntry,
    pub kind: FlashbackKind,
}

/// Picks an entry to resurface today, skipping any id in `exclude`.
///
/// Returns `Ok(None)` when fewer than [`FLASHBACK_MIN_ENTRIES`] entries exist or
/// nothing qualifies.
pub fn flashback_entry(db: &Database, exclude: &[i64]) -> AppResult<Option<Flashback>> {
    flashback_entry_on(db, dates::today(), exclude, &mut rand::thread_rng())
}

/// [`flashback_entry`] with an explicit "today" and random source.
pub fn flashback_entry_on<R: Rng + ?Sized>(
    db: &Database,
    today: NaiveDate,
    exclude: &[i64],
    rng: &mut R,
) -> AppResult<Option<Flashback>> {
    let conn = db.get_conn()?;

    let total = entries::count_entries(&conn)?;
    if total < FLASHBACK_MIN_ENTRIES {
        debug!("Only {} entries, no flashback", total);
        return Ok(None);
    }

    let anniversaries = [
        (FLASHBACK_YEAR_AGO, FlashbackKind::YearAgo),
        (FLASHBACK_MONTH_AGO, FlashbackKind::MonthAgo),
    ];
    for (months, kind) in anniversaries {
        let Some(day) = journal_core::months_before(today, months) else {
            continue;
        };
        let ids = entries::ids_created_between(
            &conn,
            &dates::midnight_of(day),
            &dates::midnight_of(day + Duration::days(1)),
        )?;
        if let Some(id) = pick(ids, exclude, rng) {
            debug!("Flashback {:?} picked entry {} from {}", kind, id, day);
            return Ok(entries::get_entry(&conn, id)?.map(|entry| Flashback { entry, kind }));
        }
    }

    let older = entries::ids_created_before(&conn, &dates::midnight_of(today))?;
    match pick(older, exclude, rng) {
        Some(id) => {
            debug!("Flashback picked random entry {}", id);
            Ok(entries::get_entry(&conn, id)?.map(|entry| Flashback {
                entry,
                kind: FlashbackKind::Random,
            }))
        }
        None => {
            debug!("No flashback candidate outside {} excluded ids", exclude.len());
            Ok(None)
        }
    }
}

fn pick<R: Rng + ?Sized>(ids: Vec<i64>, exclude: &[i64], rng: &mut R) -> Option<i64> {
    ids.into_iter()
        .filter(|id| !exclude.contains(id))
        .choose(rng)
}

/// Ids of recently shown flashbacks, oldest first, capped at a fixed length.
///
/// Recording past the cap drops the oldest id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentFlashbacks {
    ids: VecDeque<i64>,
    #[serde(skip, default = "default_capacity")]
    capacity: usize,
}

fn default_capacity() -> usize {
    FLASHBACK_HISTORY_LIMIT
}

impl Default for RecentFlashbacks {
    fn default() -> Self {
        Self::with_capacity(FLASHBACK_HISTORY_LIMIT)
    }
}

impl RecentFlashbacks {
    pub fn with_capacity(capacity: usize) -> Self {
        RecentFlashbacks {
            ids: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Marks an id as shown. Re-recording an id moves it to the newest position.
    pub fn record(&mut self, id: i64) {
        self.ids.retain(|existing| *existing != id);
        self.ids.push_back(id);
        while self.ids.len() > self.capacity {
            self.ids.pop_front();
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    /// Ids in recording order, for passing to [`flashback_entry`].
    pub fn ids(&self) -> Vec<i64> {
        self.ids.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Loads the list from `path`.
    ///
    /// A missing file yields an empty list. An unreadable file is logged and
    /// replaced by an empty list; it only affects which entries repeat.
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<RecentFlashbacks>(&raw) {
            Ok(mut recent) => {
                while recent.ids.len() > recent.capacity {
                    recent.ids.pop_front();
                }
                Ok(recent)
            }
            Err(e) => {
                warn!("Ignoring unreadable flashback history {:?}: {}", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Writes the list to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(self).map_err(io::Error::from)?;
        fs::write(path, json)?;
        debug!("Saved {} flashback ids to {:?}", self.ids.len(), path);
        Ok(())
    }
}
