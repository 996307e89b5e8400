mod duration;
mod engine;
mod progress;
mod tick;

pub use duration::{
    TimeUnit, TimerDuration, SECONDS_PER_DAY, SECONDS_PER_HOUR, SECONDS_PER_MINUTE,
};
pub use engine::{TimerEngine, TimerState};
pub use progress::{breakdown, progress, snapshot, Breakdown, ProgressSnapshot, UnitPercentages};
pub use tick::{IntervalTicker, ManualTicker, Tick, TickReceiver, TickSource};
