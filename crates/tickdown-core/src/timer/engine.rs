//! Timer engine implementation.
//!
//! The engine is a tick-counting state machine. It owns a [`TickSource`] and
//! starts/stops it on transitions, but never reads a clock itself: every
//! accepted tick removes exactly one second. The caller feeds ticks back in
//! with [`TimerEngine::deliver`] (or [`TimerEngine::tick`] when it drives
//! time directly).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            v
//!         Finished
//! (any) --reset--> Idle
//! ```
//!
//! Commands that are not legal in the current state return `None` and change
//! nothing.
//!
//! ## Usage
//!
//! ```ignore
//! let (ticker, mut ticks) = IntervalTicker::per_second();
//! let mut engine = TimerEngine::new(ticker);
//! engine.start(TimerDuration::new(0, 0, 1, 30));
//! while let Some(tick) = ticks.recv().await {
//!     engine.deliver(tick); // Some(Event::TimerFinished { .. }) at zero
//! }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use super::duration::TimerDuration;
use super::progress::{self, ProgressSnapshot};
use super::tick::{Tick, TickSource};
use crate::events::Event;
use crate::history::{HistoryRecorder, RecentDurations};
use crate::sound::{CompletionNotifier, SilentNotifier, SoundSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Core countdown engine.
pub struct TimerEngine<T: TickSource> {
    ticker: T,
    state: TimerState,
    remaining_secs: u64,
    /// Frozen at start; denominator of the day ring.
    initial_total_secs: u64,
    sound: SoundSource,
    history: Box<dyn HistoryRecorder>,
    notifier: Box<dyn CompletionNotifier>,
}

impl<T: TickSource> TimerEngine<T> {
    /// Create an idle engine with an in-memory history and no sound output.
    pub fn new(ticker: T) -> Self {
        Self {
            ticker,
            state: TimerState::Idle,
            remaining_secs: 0,
            initial_total_secs: 0,
            sound: SoundSource::default(),
            history: Box::new(RecentDurations::new()),
            notifier: Box::new(SilentNotifier),
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: impl HistoryRecorder + 'static) -> Self {
        self.history = Box::new(history);
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: impl CompletionNotifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    #[must_use]
    pub fn with_sound(mut self, sound: SoundSource) -> Self {
        self.sound = sound;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn initial_total_secs(&self) -> u64 {
        self.initial_total_secs
    }

    /// Remaining time as a duration value.
    pub fn remaining(&self) -> TimerDuration {
        TimerDuration::from_total_seconds(self.remaining_secs)
    }

    pub fn progress(&self) -> ProgressSnapshot {
        progress::snapshot(self.remaining_secs, self.initial_total_secs)
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            remaining_secs: self.remaining_secs,
            total_secs: self.initial_total_secs,
            progress: self.progress(),
            at: Utc::now(),
        }
    }

    pub fn sound(&self) -> &SoundSource {
        &self.sound
    }

    pub fn recent_durations(&self) -> Vec<TimerDuration> {
        self.history.recent()
    }

    pub fn ticker(&self) -> &T {
        &self.ticker
    }

    pub fn ticker_mut(&mut self) -> &mut T {
        &mut self.ticker
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Change the completion sound. Takes effect for the next finish.
    pub fn set_sound(&mut self, sound: SoundSource) {
        debug!(%sound, "completion sound changed");
        self.sound = sound;
    }

    pub fn start(&mut self, duration: TimerDuration) -> Option<Event> {
        if self.state != TimerState::Idle {
            debug!(state = ?self.state, "start ignored");
            return None;
        }
        if !duration.can_start() {
            debug!("start ignored: empty duration");
            return None;
        }

        let total = duration.total_seconds();
        self.initial_total_secs = total;
        self.remaining_secs = total;
        self.state = TimerState::Running;
        self.ticker.begin();
        self.history.record(duration);
        info!(%duration, total_secs = total, "timer started");

        Some(Event::TimerStarted {
            duration,
            total_secs: total,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Running => {
                self.ticker.end();
                self.state = TimerState::Paused;
                debug!(remaining_secs = self.remaining_secs, "timer paused");
                Some(Event::TimerPaused {
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn resume(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Paused => {
                self.ticker.begin();
                self.state = TimerState::Running;
                debug!(remaining_secs = self.remaining_secs, "timer resumed");
                Some(Event::TimerResumed {
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    /// Return to Idle from any state. Always stops the tick source.
    pub fn reset(&mut self) -> Option<Event> {
        self.ticker.end();
        if self.state == TimerState::Idle {
            return None;
        }

        let event = Event::TimerReset {
            remaining_secs: self.remaining_secs,
            total_secs: self.initial_total_secs,
            at: Utc::now(),
        };
        self.notifier.silence();
        self.state = TimerState::Idle;
        self.remaining_secs = 0;
        self.initial_total_secs = 0;
        info!("timer reset");
        Some(event)
    }

    /// Apply a tick from the tick source, dropping ticks that belong to an
    /// emitter that has since been ended or restarted.
    pub fn deliver(&mut self, tick: Tick) -> Option<Event> {
        if !self.ticker.accepts(&tick) {
            trace!(
                tick_epoch = tick.epoch,
                epoch = self.ticker.epoch(),
                "stale tick dropped"
            );
            return None;
        }
        self.tick()
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `Some(Event::TimerFinished)` on the tick that reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        if self.remaining_secs > 1 {
            self.remaining_secs -= 1;
            return Some(Event::TimerTicked {
                remaining_secs: self.remaining_secs,
                at: Utc::now(),
            });
        }
        Some(self.finish())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self) -> Event {
        self.remaining_secs = 0;
        self.state = TimerState::Finished;
        self.ticker.end();
        info!(total_secs = self.initial_total_secs, "timer finished");

        let sound_error = match self.notifier.notify_completion(&self.sound) {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, sound = %self.sound, "completion sound failed");
                Some(e.to_string())
            }
        };

        Event::TimerFinished {
            total_secs: self.initial_total_secs,
            sound_error,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::SoundError;
    use crate::timer::tick::ManualTicker;

    #[derive(Clone, Default)]
    struct Calls {
        notified: Arc<Mutex<u32>>,
        silenced: Arc<Mutex<u32>>,
    }

    struct CountingNotifier {
        calls: Calls,
        fail: bool,
    }

    impl CompletionNotifier for CountingNotifier {
        fn notify_completion(&mut self, _sound: &SoundSource) -> Result<(), SoundError> {
            *self.calls.notified.lock().unwrap() += 1;
            if self.fail {
                Err(SoundError::Playback("device busy".into()))
            } else {
                Ok(())
            }
        }

        fn silence(&mut self) {
            *self.calls.silenced.lock().unwrap() += 1;
        }
    }

    fn engine_with(calls: &Calls, fail: bool) -> TimerEngine<ManualTicker> {
        TimerEngine::new(ManualTicker::new()).with_notifier(CountingNotifier {
            calls: calls.clone(),
            fail,
        })
    }

    fn run_ticks(engine: &mut TimerEngine<ManualTicker>, n: u64) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..n {
            if let Some(tick) = engine.ticker_mut().emit() {
                events.extend(engine.deliver(tick));
            }
        }
        events
    }

    #[test]
    fn start_pause_resume() {
        let mut engine = TimerEngine::new(ManualTicker::new());
        assert_eq!(engine.state(), TimerState::Idle);

        assert!(engine.start(TimerDuration::new(0, 0, 0, 10)).is_some());
        assert_eq!(engine.state(), TimerState::Running);
        assert!(engine.ticker().is_active());

        assert!(engine.pause().is_some());
        assert_eq!(engine.state(), TimerState::Paused);
        assert!(!engine.ticker().is_active());

        assert!(engine.resume().is_some());
        assert_eq!(engine.state(), TimerState::Running);
        assert!(engine.ticker().is_active());
    }

    #[test]
    fn empty_duration_does_not_start() {
        let mut engine = TimerEngine::new(ManualTicker::new());
        assert!(engine.start(TimerDuration::default()).is_none());
        assert_eq!(engine.state(), TimerState::Idle);
        assert!(!engine.ticker().is_active());
        assert!(engine.recent_durations().is_empty());
    }

    #[test]
    fn double_start_is_ignored() {
        let mut engine = TimerEngine::new(ManualTicker::new());
        engine.start(TimerDuration::new(0, 0, 0, 10));
        engine.tick();
        assert!(engine.start(TimerDuration::new(0, 0, 5, 0)).is_none());
        assert_eq!(engine.remaining_secs(), 9);
        assert_eq!(engine.initial_total_secs(), 10);
        assert_eq!(engine.ticker().begins(), 1);
    }

    #[test]
    fn minute_and_a_half_counts_down_to_finished() {
        let calls = Calls::default();
        let mut engine = engine_with(&calls, false);
        engine.start(TimerDuration::new(0, 0, 1, 30));
        assert_eq!(engine.initial_total_secs(), 90);

        run_ticks(&mut engine, 89);
        assert_eq!(engine.state(), TimerState::Running);
        assert_eq!(engine.progress().values.seconds, 1);
        assert_eq!(engine.progress().values.minutes, 0);

        let events = run_ticks(&mut engine, 1);
        assert!(matches!(
            events.as_slice(),
            [Event::TimerFinished { total_secs: 90, sound_error: None, .. }]
        ));
        assert_eq!(engine.state(), TimerState::Finished);
        assert_eq!(engine.remaining_secs(), 0);
        assert_eq!(engine.progress().values, progress::breakdown(0));
        assert!(!engine.ticker().is_active());

        // Further ticks change nothing and do not re-notify.
        assert!(engine.tick().is_none());
        assert_eq!(engine.remaining_secs(), 0);
        assert_eq!(*calls.notified.lock().unwrap(), 1);
    }

    #[test]
    fn start_after_finish_needs_reset() {
        let calls = Calls::default();
        let mut engine = engine_with(&calls, false);
        engine.start(TimerDuration::new(0, 0, 0, 2));
        run_ticks(&mut engine, 2);
        assert_eq!(engine.state(), TimerState::Finished);

        assert!(engine.start(TimerDuration::new(0, 0, 1, 0)).is_none());
        assert_eq!(engine.state(), TimerState::Finished);
        assert_eq!(engine.initial_total_secs(), 2);
        assert_eq!(engine.remaining(), TimerDuration::default());
        assert!(!engine.ticker().is_active());
        assert_eq!(engine.ticker().begins(), 1);
        assert_eq!(engine.recent_durations(), vec![TimerDuration::new(0, 0, 0, 2)]);

        engine.reset();
        assert!(engine.start(TimerDuration::new(0, 0, 1, 0)).is_some());
        assert_eq!(engine.remaining(), TimerDuration::new(0, 0, 1, 0));
        assert_eq!(*calls.notified.lock().unwrap(), 1);
    }

    #[test]
    fn ticks_while_paused_are_ignored() {
        let mut engine = TimerEngine::new(ManualTicker::new());
        engine.start(TimerDuration::new(0, 0, 0, 30));
        run_ticks(&mut engine, 5);
        engine.pause();

        for _ in 0..10 {
            assert!(engine.tick().is_none());
        }
        assert_eq!(engine.remaining_secs(), 25);

        engine.resume();
        run_ticks(&mut engine, 1);
        assert_eq!(engine.remaining_secs(), 24);
    }

    #[test]
    fn tick_from_before_pause_is_dropped() {
        let mut engine = TimerEngine::new(ManualTicker::new());
        engine.start(TimerDuration::new(0, 0, 0, 30));
        let in_flight = engine.ticker_mut().emit().unwrap();
        engine.pause();
        engine.resume();
        assert!(engine.deliver(in_flight).is_none());
        assert_eq!(engine.remaining_secs(), 30);
    }

    #[test]
    fn stale_tick_after_reset_does_not_touch_new_run() {
        let mut engine = TimerEngine::new(ManualTicker::new());
        engine.start(TimerDuration::new(0, 0, 0, 30));
        let stale = engine.ticker_mut().emit().unwrap();
        engine.reset();
        engine.start(TimerDuration::new(0, 0, 0, 20));

        assert!(engine.deliver(stale).is_none());
        assert_eq!(engine.remaining_secs(), 20);
    }

    #[test]
    fn reset_returns_to_idle_from_every_state() {
        let calls = Calls::default();
        let mut engine = engine_with(&calls, false);

        // Idle: no-op.
        assert!(engine.reset().is_none());

        engine.start(TimerDuration::new(0, 0, 0, 3));
        let ev = engine.reset().unwrap();
        assert!(matches!(ev, Event::TimerReset { remaining_secs: 3, total_secs: 3, .. }));
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!((engine.remaining_secs(), engine.initial_total_secs()), (0, 0));
        assert!(!engine.ticker().is_active());

        engine.start(TimerDuration::new(0, 0, 0, 3));
        engine.pause();
        assert!(engine.reset().is_some());
        assert_eq!(engine.state(), TimerState::Idle);

        engine.start(TimerDuration::new(0, 0, 0, 1));
        run_ticks(&mut engine, 1);
        assert_eq!(engine.state(), TimerState::Finished);
        assert!(engine.reset().is_some());
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(*calls.silenced.lock().unwrap(), 3);
    }

    #[test]
    fn restart_after_reset_behaves_like_fresh_engine() {
        let mut engine = TimerEngine::new(ManualTicker::new());
        engine.start(TimerDuration::new(0, 0, 0, 10));
        run_ticks(&mut engine, 4);
        engine.reset();

        engine.start(TimerDuration::new(0, 0, 0, 10));
        assert_eq!(engine.remaining_secs(), 10);
        assert_eq!(engine.initial_total_secs(), 10);
        run_ticks(&mut engine, 10);
        assert_eq!(engine.state(), TimerState::Finished);
    }

    #[test]
    fn redundant_commands_are_no_ops() {
        let mut engine = TimerEngine::new(ManualTicker::new());
        assert!(engine.pause().is_none());
        assert!(engine.resume().is_none());

        engine.start(TimerDuration::new(0, 0, 0, 5));
        assert!(engine.resume().is_none());
        engine.pause();
        assert!(engine.pause().is_none());
        assert!(engine.start(TimerDuration::new(0, 0, 0, 9)).is_none());

        engine.resume();
        run_ticks(&mut engine, 5);
        assert!(engine.pause().is_none());
        assert!(engine.resume().is_none());
        assert_eq!(engine.state(), TimerState::Finished);
    }

    #[test]
    fn sound_failure_is_reported_but_run_stays_finished() {
        let calls = Calls::default();
        let mut engine = engine_with(&calls, true);
        engine.start(TimerDuration::new(0, 0, 0, 1));
        let events = run_ticks(&mut engine, 1);
        match events.as_slice() {
            [Event::TimerFinished { sound_error: Some(msg), .. }] => {
                assert!(msg.contains("device busy"));
            }
            other => panic!("expected TimerFinished, got {other:?}"),
        }
        assert_eq!(engine.state(), TimerState::Finished);
        assert_eq!(*calls.notified.lock().unwrap(), 1);
    }

    #[test]
    fn start_records_history() {
        let mut engine = TimerEngine::new(ManualTicker::new());
        let a = TimerDuration::new(0, 0, 1, 0);
        let b = TimerDuration::new(0, 0, 2, 0);
        engine.start(a);
        engine.reset();
        engine.start(b);
        engine.reset();
        engine.start(a);
        assert_eq!(engine.recent_durations(), vec![a, b]);
    }

    #[test]
    fn set_sound_reaches_notifier() {
        struct Capture(Arc<Mutex<Option<SoundSource>>>);
        impl CompletionNotifier for Capture {
            fn notify_completion(&mut self, sound: &SoundSource) -> Result<(), SoundError> {
                *self.0.lock().unwrap() = Some(sound.clone());
                Ok(())
            }
        }

        let seen = Arc::new(Mutex::new(None));
        let mut engine =
            TimerEngine::new(ManualTicker::new()).with_notifier(Capture(Arc::clone(&seen)));
        engine.set_sound(SoundSource::parse("chime"));
        engine.start(TimerDuration::new(0, 0, 0, 1));
        engine.tick();
        assert_eq!(*seen.lock().unwrap(), Some(SoundSource::parse("chime")));
    }

    #[test]
    fn snapshot_reports_state_and_progress() {
        let mut engine = TimerEngine::new(ManualTicker::new());
        engine.start(TimerDuration::new(0, 2, 0, 0));
        match engine.snapshot() {
            Event::StateSnapshot {
                state,
                remaining_secs,
                total_secs,
                progress,
                ..
            } => {
                assert_eq!(state, TimerState::Running);
                assert_eq!(remaining_secs, 7_200);
                assert_eq!(total_secs, 7_200);
                assert_eq!(progress.values.hours, 2);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
