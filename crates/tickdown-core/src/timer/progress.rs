//! Per-unit progress for the four display rings.
//!
//! The day ring is global: it shows how much of the whole run is left.
//! The hour, minute and second rings are cyclic: each shows how full its
//! containing unit is, like the hands of a clock, and ignores the run length.

use serde::{Deserialize, Serialize};

use super::duration::{SECONDS_PER_DAY, SECONDS_PER_HOUR, SECONDS_PER_MINUTE};

/// Integer value shown inside each ring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

/// Fill level of each ring, 0.0 ..= 100.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitPercentages {
    pub days: f64,
    pub hours: f64,
    pub minutes: f64,
    pub seconds: f64,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub percent: UnitPercentages,
    pub values: Breakdown,
}

pub fn breakdown(remaining: u64) -> Breakdown {
    Breakdown {
        days: remaining / SECONDS_PER_DAY,
        hours: (remaining % SECONDS_PER_DAY) / SECONDS_PER_HOUR,
        minutes: (remaining % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
        seconds: remaining % SECONDS_PER_MINUTE,
    }
}

/// Ring percentages for `remaining` out of `initial_total` seconds.
///
/// Returns all zeros when `initial_total` is 0. The day ring stays at 0 for
/// runs configured without a day component.
pub fn progress(remaining: u64, initial_total: u64) -> UnitPercentages {
    if initial_total == 0 {
        return UnitPercentages::default();
    }

    let day = SECONDS_PER_DAY as f64;
    let days = if initial_total >= SECONDS_PER_DAY {
        (remaining as f64 / day) / (initial_total as f64 / day) * 100.0
    } else {
        0.0
    };
    let hours =
        ((remaining % SECONDS_PER_DAY) as f64 / SECONDS_PER_HOUR as f64) / 24.0 * 100.0;
    let minutes =
        ((remaining % SECONDS_PER_HOUR) as f64 / SECONDS_PER_MINUTE as f64) / 60.0 * 100.0;
    let seconds = (remaining % SECONDS_PER_MINUTE) as f64 / 60.0 * 100.0;

    UnitPercentages {
        days: days.clamp(0.0, 100.0),
        hours,
        minutes,
        seconds,
    }
}

pub fn snapshot(remaining: u64, initial_total: u64) -> ProgressSnapshot {
    ProgressSnapshot {
        percent: progress(remaining, initial_total),
        values: breakdown(remaining),
    }
}
