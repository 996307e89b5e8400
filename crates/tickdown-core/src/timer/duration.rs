//! Countdown duration value object.
//!
//! A [`TimerDuration`] is what the user configures before a run. Every field
//! is clamped to its unit's range when it is set, so an instance is always
//! valid and converts losslessly to a total-seconds count.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const SECONDS_PER_MINUTE: u64 = 60;
pub const SECONDS_PER_HOUR: u64 = 3_600;
pub const SECONDS_PER_DAY: u64 = 86_400;

/// One of the four configurable units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    /// Largest value the unit accepts. Days are capped by policy.
    pub const fn max(self) -> u32 {
        match self {
            TimeUnit::Days => 99,
            TimeUnit::Hours => 23,
            TimeUnit::Minutes | TimeUnit::Seconds => 59,
        }
    }

    /// Length of one unit in seconds.
    pub const fn seconds(self) -> u64 {
        match self {
            TimeUnit::Days => SECONDS_PER_DAY,
            TimeUnit::Hours => SECONDS_PER_HOUR,
            TimeUnit::Minutes => SECONDS_PER_MINUTE,
            TimeUnit::Seconds => 1,
        }
    }

    /// Clamp an arbitrary integer into `[0, max]`.
    pub fn clamp(self, value: i64) -> u32 {
        // max() fits in u32, so the cast after clamping is lossless.
        value.clamp(0, i64::from(self.max())) as u32
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeUnit::Days => "days",
            TimeUnit::Hours => "hours",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Seconds => "seconds",
        };
        f.write_str(name)
    }
}

/// A configured countdown span.
///
/// Fields are private so the range invariant cannot be bypassed; use the
/// `with_*` builders, which clamp instead of rejecting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawDuration", into = "RawDuration")]
pub struct TimerDuration {
    days: u32,
    hours: u32,
    minutes: u32,
    seconds: u32,
}

impl TimerDuration {
    /// The largest representable duration (99d 23:59:59).
    pub const MAX: TimerDuration = TimerDuration {
        days: 99,
        hours: 23,
        minutes: 59,
        seconds: 59,
    };

    /// Build a duration from raw per-unit values, clamping each one.
    pub fn new(days: i64, hours: i64, minutes: i64, seconds: i64) -> Self {
        Self::default()
            .with_unit(TimeUnit::Days, days)
            .with_unit(TimeUnit::Hours, hours)
            .with_unit(TimeUnit::Minutes, minutes)
            .with_unit(TimeUnit::Seconds, seconds)
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// Return a copy with `unit` set to `value` clamped to `[0, unit.max()]`.
    #[must_use]
    pub fn with_unit(mut self, unit: TimeUnit, value: i64) -> Self {
        let value = unit.clamp(value);
        match unit {
            TimeUnit::Days => self.days = value,
            TimeUnit::Hours => self.hours = value,
            TimeUnit::Minutes => self.minutes = value,
            TimeUnit::Seconds => self.seconds = value,
        }
        self
    }

    /// Like [`with_unit`](Self::with_unit) but for untrusted text input.
    ///
    /// Decimal input is truncated toward zero; anything non-numeric sets the
    /// unit to 0.
    #[must_use]
    pub fn with_unit_raw(self, unit: TimeUnit, raw: &str) -> Self {
        self.with_unit(unit, parse_lenient(raw))
    }

    pub fn total_seconds(&self) -> u64 {
        u64::from(self.days) * SECONDS_PER_DAY
            + u64::from(self.hours) * SECONDS_PER_HOUR
            + u64::from(self.minutes) * SECONDS_PER_MINUTE
            + u64::from(self.seconds)
    }

    /// Inverse of [`total_seconds`](Self::total_seconds). Totals beyond
    /// [`TimerDuration::MAX`] saturate to it.
    pub fn from_total_seconds(total: u64) -> Self {
        if total >= Self::MAX.total_seconds() {
            return Self::MAX;
        }
        // Every component is below its unit max here, so the casts are lossless.
        Self {
            days: (total / SECONDS_PER_DAY) as u32,
            hours: ((total % SECONDS_PER_DAY) / SECONDS_PER_HOUR) as u32,
            minutes: ((total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE) as u32,
            seconds: (total % SECONDS_PER_MINUTE) as u32,
        }
    }

    /// A run can only start with something to count down.
    pub fn can_start(&self) -> bool {
        self.total_seconds() > 0
    }
}

/// `1d 02:03:04`, `02:03:04`, or `03:04` under an hour.
impl fmt::Display for TimerDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 0 {
            write!(f, "{}d ", self.days)?;
        }
        if self.days > 0 || self.hours > 0 {
            write!(f, "{:02}:", self.hours)?;
        }
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}

fn parse_lenient(raw: &str) -> i64 {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return n;
    }
    match raw.parse::<f64>() {
        // `as` saturates at the i64 bounds, which the clamp then absorbs.
        Ok(f) if f.is_finite() => f.trunc() as i64,
        _ => 0,
    }
}

/// Wire shape for serde. Deserialization goes through the clamping builder
/// so hand-edited config or a corrupted history row cannot break the range
/// invariant.
#[derive(Serialize, Deserialize)]
struct RawDuration {
    #[serde(default)]
    days: i64,
    #[serde(default)]
    hours: i64,
    #[serde(default)]
    minutes: i64,
    #[serde(default)]
    seconds: i64,
}

impl From<RawDuration> for TimerDuration {
    fn from(raw: RawDuration) -> Self {
        TimerDuration::new(raw.days, raw.hours, raw.minutes, raw.seconds)
    }
}

impl From<TimerDuration> for RawDuration {
    fn from(d: TimerDuration) -> Self {
        RawDuration {
            days: i64::from(d.days),
            hours: i64::from(d.hours),
            minutes: i64::from(d.minutes),
            seconds: i64::from(d.seconds),
        }
    }
}
