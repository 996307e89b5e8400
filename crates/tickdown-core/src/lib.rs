//! # Tickdown Core Library
//!
//! This library provides the core logic for the Tickdown countdown timer.
//! The `tickdown` CLI is a thin terminal front end over the same library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a tick-counting state machine (idle, running, paused,
//!   finished) that starts and stops its own tick source
//! - **Tick Source**: a tokio interval task that sends epoch-stamped ticks
//!   over a channel, so stale ticks can be told apart after a reset
//! - **Progress**: pure per-unit ring percentages derived from remaining and
//!   initial seconds
//! - **Storage**: SQLite run log and key-value store, TOML configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`TimerDuration`]: Clamped days/hours/minutes/seconds value
//! - [`HistoryRecorder`]: Recently used durations
//! - [`CompletionNotifier`]: Completion sound boundary
//! - [`Database`]: Run and key-value persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod history;
pub mod sound;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, SoundError, StorageError};
pub use events::Event;
pub use history::{HistoryRecorder, PersistentHistory, RecentDurations, HISTORY_CAPACITY};
pub use sound::{CompletionNotifier, PresetSound, SilentNotifier, SoundSource};
pub use storage::{Config, Database, RunOutcome, RunRecord, RunStats};
pub use timer::{
    IntervalTicker, ManualTicker, ProgressSnapshot, Tick, TickSource, TimeUnit, TimerDuration,
    TimerEngine, TimerState,
};
