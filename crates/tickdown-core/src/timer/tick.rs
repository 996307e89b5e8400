//! Tick sources.
//!
//! A tick source emits "one second elapsed" signals and nothing else; it has
//! no idea how much time is left. Each tick is stamped with the source's
//! epoch, a generation counter bumped whenever the source is (re)started or
//! stopped. A consumer that checks [`TickSource::accepts`] therefore ignores
//! ticks that were already queued when the source was ended, which is what
//! makes `end()` final even though the emitter runs on another task.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// A single elapsed-period signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Epoch of the source at emission time.
    pub epoch: u64,
    /// 1-based position within the epoch.
    pub sequence: u64,
}

pub trait TickSource {
    /// Start emitting. Restarts cleanly if already active.
    fn begin(&mut self);

    /// Stop emitting. Safe to call when inactive.
    fn end(&mut self);

    fn is_active(&self) -> bool;

    fn epoch(&self) -> u64;

    /// Whether `tick` belongs to the currently running emitter.
    fn accepts(&self, tick: &Tick) -> bool {
        self.is_active() && tick.epoch == self.epoch()
    }
}

pub type TickReceiver = mpsc::UnboundedReceiver<Tick>;

/// Tick source backed by a `tokio::time::interval` on its own task.
///
/// Ticks travel over an unbounded channel to a single receiver, so a slow
/// consumer delays ticks instead of stalling the emitter. Missed intervals
/// are delayed rather than bursted; there is no catch-up.
pub struct IntervalTicker {
    handle: Handle,
    period: Duration,
    tx: mpsc::UnboundedSender<Tick>,
    task: Option<JoinHandle<()>>,
    epoch: u64,
}

impl IntervalTicker {
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    /// Create a ticker that spawns onto `handle`, plus the receiving end of
    /// its tick channel.
    pub fn new(handle: Handle, period: Duration) -> (Self, TickReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ticker = Self {
            handle,
            period: period.max(Self::MIN_PERIOD),
            tx,
            task: None,
            epoch: 0,
        };
        (ticker, rx)
    }

    /// One tick per second on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn per_second() -> (Self, TickReceiver) {
        Self::new(Handle::current(), Duration::from_secs(1))
    }

    fn abort_task(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

impl TickSource for IntervalTicker {
    fn begin(&mut self) {
        self.abort_task();
        self.epoch += 1;

        let epoch = self.epoch;
        let period = self.period;
        let tx = self.tx.clone();
        debug!(epoch, period_ms = period.as_millis() as u64, "tick source started");

        self.task = Some(self.handle.spawn(async move {
            // First tick after one full period, not immediately.
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut sequence = 0u64;
            loop {
                interval.tick().await;
                sequence += 1;
                if tx.send(Tick { epoch, sequence }).is_err() {
                    // Receiver dropped; nobody is listening any more.
                    break;
                }
            }
        }));
    }

    fn end(&mut self) {
        if self.abort_task() {
            self.epoch += 1;
            debug!(epoch = self.epoch, "tick source ended");
        }
    }

    fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.end();
    }
}

/// Tick source driven by hand.
///
/// Used by tests and by hosts that already own a periodic callback and only
/// need the epoch bookkeeping.
#[derive(Debug, Default)]
pub struct ManualTicker {
    active: bool,
    epoch: u64,
    sequence: u64,
    begins: u64,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next tick, or `None` while inactive.
    pub fn emit(&mut self) -> Option<Tick> {
        if !self.active {
            return None;
        }
        self.sequence += 1;
        Some(Tick {
            epoch: self.epoch,
            sequence: self.sequence,
        })
    }

    /// How many times `begin` has been called.
    pub fn begins(&self) -> u64 {
        self.begins
    }
}

impl TickSource for ManualTicker {
    fn begin(&mut self) {
        self.epoch += 1;
        self.sequence = 0;
        self.active = true;
        self.begins += 1;
    }

    fn end(&mut self) {
        if self.active {
            self.active = false;
            self.epoch += 1;
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn epoch(&self) -> u64 {
        self.epoch
    }
}
