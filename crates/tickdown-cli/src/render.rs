//! Plain-text rendering of the four rings.

use tickdown_core::timer::TimerState;
use tickdown_core::{ProgressSnapshot, TimerDuration};

/// One status line, e.g. `running  01:29  d   0.0%  h   6.2%  m   2.5%  s  48.3%`.
pub fn line(
    state: TimerState,
    remaining: TimerDuration,
    snapshot: &ProgressSnapshot,
    show_percentages: bool,
) -> String {
    let state = match state {
        TimerState::Idle => "idle",
        TimerState::Running => "running",
        TimerState::Paused => "paused",
        TimerState::Finished => "finished",
    };

    if !show_percentages {
        return format!("{state:<8} {remaining}");
    }
    let p = snapshot.percent;
    format!(
        "{state:<8} {remaining}  d {:5.1}%  h {:5.1}%  m {:5.1}%  s {:5.1}%",
        p.days, p.hours, p.minutes, p.seconds
    )
}
