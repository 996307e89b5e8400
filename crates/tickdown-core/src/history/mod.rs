//! Recently used durations.
//!
//! The engine records every duration it starts; the recorder owns the
//! ordering policy: most recent first, no duplicates, at most
//! [`HISTORY_CAPACITY`] entries.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::Database;
use crate::timer::TimerDuration;

pub const HISTORY_CAPACITY: usize = 5;

/// Key under which the list is persisted in the kv store.
pub const HISTORY_KEY: &str = "recent_durations";

pub trait HistoryRecorder: Send {
    fn record(&mut self, duration: TimerDuration);

    /// Most recent first.
    fn recent(&self) -> Vec<TimerDuration>;

    fn clear(&mut self);
}

impl<H: HistoryRecorder + ?Sized> HistoryRecorder for Box<H> {
    fn record(&mut self, duration: TimerDuration) {
        (**self).record(duration);
    }

    fn recent(&self) -> Vec<TimerDuration> {
        (**self).recent()
    }

    fn clear(&mut self) {
        (**self).clear();
    }
}

/// In-memory recent list with the dedup/cap policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentDurations {
    entries: Vec<TimerDuration>,
}

impl RecentDurations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a stored list, re-applying the policy in case the stored
    /// copy was edited or written by an older version.
    pub fn from_entries(entries: impl IntoIterator<Item = TimerDuration>) -> Self {
        let mut list = Self::new();
        let collected: Vec<_> = entries.into_iter().collect();
        // Push oldest first so the stored order is kept.
        for d in collected.into_iter().rev() {
            list.push(d);
        }
        list
    }

    /// Move `duration` to the front, evicting the oldest entry past capacity.
    pub fn push(&mut self, duration: TimerDuration) {
        self.entries.retain(|d| *d != duration);
        self.entries.insert(0, duration);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    pub fn entries(&self) -> &[TimerDuration] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HistoryRecorder for RecentDurations {
    fn record(&mut self, duration: TimerDuration) {
        self.push(duration);
    }

    fn recent(&self) -> Vec<TimerDuration> {
        self.entries.clone()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Recent list persisted in the SQLite kv store.
///
/// Storage failures are logged and swallowed; the in-memory list stays
/// authoritative for the lifetime of the process.
pub struct PersistentHistory {
    db: Database,
    list: RecentDurations,
}

impl PersistentHistory {
    pub fn load(db: Database) -> Self {
        let list = match db.kv_get(HISTORY_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<TimerDuration>>(&json) {
                Ok(entries) => RecentDurations::from_entries(entries),
                Err(e) => {
                    warn!(error = %e, "discarding unreadable duration history");
                    RecentDurations::new()
                }
            },
            Ok(None) => RecentDurations::new(),
            Err(e) => {
                warn!(error = %e, "failed to load duration history");
                RecentDurations::new()
            }
        };
        debug!(entries = list.len(), "duration history loaded");
        Self { db, list }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn persist(&self) {
        let json = match serde_json::to_string(&self.list) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to encode duration history");
                return;
            }
        };
        if let Err(e) = self.db.kv_set(HISTORY_KEY, &json) {
            warn!(error = %e, "failed to save duration history");
        }
    }
}

impl HistoryRecorder for PersistentHistory {
    fn record(&mut self, duration: TimerDuration) {
        self.list.push(duration);
        self.persist();
    }

    fn recent(&self) -> Vec<TimerDuration> {
        self.list.recent()
    }

    fn clear(&mut self) {
        self.list.clear();
        if let Err(e) = self.db.kv_delete(HISTORY_KEY) {
            warn!(error = %e, "failed to clear duration history");
        }
    }
}
