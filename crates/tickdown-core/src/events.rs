use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{ProgressSnapshot, TimerDuration, TimerState};

/// Every state change of the engine produces an Event.
/// Renderers consume them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        duration: TimerDuration,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    TimerTicked {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero. `sound_error` is set when the completion
    /// sound could not be played; the run is finished regardless.
    TimerFinished {
        total_secs: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sound_error: Option<String>,
        at: DateTime<Utc>,
    },
    TimerReset {
        /// Remaining seconds at the moment of reset.
        remaining_secs: u64,
        /// Initial total of the run that was reset.
        total_secs: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        remaining_secs: u64,
        total_secs: u64,
        progress: ProgressSnapshot,
        at: DateTime<Utc>,
    },
}
