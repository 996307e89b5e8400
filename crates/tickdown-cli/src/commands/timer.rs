use std::error::Error;
use std::future::Future;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use tickdown_core::timer::{snapshot, TickReceiver};
use tickdown_core::{
    Config, Database, Event, HistoryRecorder, IntervalTicker, PersistentHistory, RecentDurations,
    RunOutcome, SoundSource, TimeUnit, TimerDuration, TimerEngine,
};

use crate::notifier::TerminalBell;
use crate::render;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a countdown in the foreground.
    ///
    /// While running, type `p` to pause, `r` to resume, `s` for status,
    /// `x` to reset or `q` to quit (both end the run). Ctrl-C resets.
    Run(RunArgs),
    /// Print ring progress for a remaining/initial pair as JSON
    Progress {
        /// Remaining seconds
        #[arg(long)]
        remaining: u64,
        /// Initial total seconds of the run
        #[arg(long)]
        initial: u64,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Days (0-99)
    #[arg(short, long, allow_hyphen_values = true)]
    days: Option<String>,
    /// Hours (0-23)
    #[arg(short = 'H', long, allow_hyphen_values = true)]
    hours: Option<String>,
    /// Minutes (0-59)
    #[arg(short, long, allow_hyphen_values = true)]
    minutes: Option<String>,
    /// Seconds (0-59)
    #[arg(short, long, allow_hyphen_values = true)]
    seconds: Option<String>,
    /// Completion sound: a preset id or a path to an audio file
    #[arg(long)]
    sound: Option<String>,
    /// Print one JSON snapshot per tick
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    /// Out-of-range or non-numeric values are clamped, not rejected.
    fn duration(&self, fallback: TimerDuration) -> TimerDuration {
        let units = [
            (TimeUnit::Days, &self.days),
            (TimeUnit::Hours, &self.hours),
            (TimeUnit::Minutes, &self.minutes),
            (TimeUnit::Seconds, &self.seconds),
        ];
        if units.iter().all(|(_, raw)| raw.is_none()) {
            return fallback;
        }
        units
            .into_iter()
            .fold(TimerDuration::default(), |d, (unit, raw)| match raw {
                Some(raw) => d.with_unit_raw(unit, raw),
                None => d,
            })
    }
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn Error>> {
    match action {
        TimerAction::Run(args) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_countdown(args))
        }
        TimerAction::Progress { remaining, initial } => {
            let snap = snapshot(remaining.min(initial), initial);
            println!("{}", serde_json::to_string_pretty(&snap)?);
            Ok(())
        }
    }
}

/// Everything the run loop needs to print and persist.
struct Session {
    json: bool,
    show_percentages: bool,
    runs: Option<Database>,
    started_at: DateTime<Utc>,
}

impl Session {
    fn emit(&self, engine: &TimerEngine<IntervalTicker>, event: &Event) -> Result<(), Box<dyn Error>> {
        if self.json {
            let out = match event {
                Event::TimerTicked { .. } => engine.snapshot(),
                other => other.clone(),
            };
            println!("{}", serde_json::to_string(&out)?);
        } else {
            if let Event::TimerFinished {
                sound_error: Some(msg),
                ..
            } = event
            {
                eprintln!("completion sound failed: {msg}");
            }
            println!(
                "{}",
                render::line(
                    engine.state(),
                    engine.remaining(),
                    &engine.progress(),
                    self.show_percentages,
                )
            );
        }
        Ok(())
    }

    fn record(&self, total_secs: u64, remaining_secs: u64, outcome: RunOutcome) {
        let Some(db) = &self.runs else {
            return;
        };
        let elapsed = total_secs.saturating_sub(remaining_secs);
        if let Err(e) = db.record_run(total_secs, elapsed, outcome, self.started_at, Utc::now()) {
            warn!(error = %e, "failed to record run");
        }
    }
}

fn open_history() -> Box<dyn HistoryRecorder> {
    match Database::open() {
        Ok(db) => Box::new(PersistentHistory::load(db)),
        Err(e) => {
            warn!(error = %e, "history unavailable, keeping it in memory");
            Box::new(RecentDurations::new())
        }
    }
}

async fn run_countdown(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let config = Config::load_or_default();
    let duration = args.duration(config.timer.default_duration);
    let sound = args
        .sound
        .as_deref()
        .map(SoundSource::parse)
        .unwrap_or_else(|| config.notifications.sound.clone());

    let (ticker, mut ticks) = IntervalTicker::per_second();
    let mut engine = TimerEngine::new(ticker)
        .with_history(open_history())
        .with_sound(sound);
    if config.notifications.enabled {
        engine = engine.with_notifier(TerminalBell::new(config.notifications.volume()));
    }

    let session = Session {
        json: args.json || config.display.json,
        show_percentages: config.display.show_percentages,
        runs: Database::open()
            .map_err(|e| warn!(error = %e, "run log unavailable"))
            .ok(),
        started_at: Utc::now(),
    };

    let Some(started) = engine.start(duration) else {
        return Err("duration must be greater than zero".into());
    };
    info!(%duration, sound = %engine.sound(), "countdown running");
    session.emit(&engine, &started)?;

    drive(
        &mut engine,
        &mut ticks,
        &session,
        BufReader::new(tokio::io::stdin()),
        tokio::signal::ctrl_c(),
    )
    .await
}

/// Run until the countdown finishes, a command ends it, or `interrupt`
/// resolves (which resets the run).
async fn drive(
    engine: &mut TimerEngine<IntervalTicker>,
    ticks: &mut TickReceiver,
    session: &Session,
    input: impl AsyncBufRead + Unpin,
    interrupt: impl Future,
) -> Result<(), Box<dyn Error>> {
    let mut lines = input.lines();
    let mut stdin_open = true;
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            Some(tick) = ticks.recv() => {
                if let Some(event) = engine.deliver(tick) {
                    session.emit(engine, &event)?;
                    if let Event::TimerFinished { total_secs, .. } = event {
                        session.record(total_secs, 0, RunOutcome::Finished);
                        return Ok(());
                    }
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(cmd)) => {
                        if handle_command(engine, cmd.trim(), session)? {
                            return Ok(());
                        }
                    }
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        warn!(error = %e, "stdin closed");
                        stdin_open = false;
                    }
                }
            }
            _ = &mut interrupt => {
                abandon(engine, session)?;
                return Ok(());
            }
        }
    }
}

/// Returns `true` when the run loop should stop.
fn handle_command(
    engine: &mut TimerEngine<IntervalTicker>,
    cmd: &str,
    session: &Session,
) -> Result<bool, Box<dyn Error>> {
    let event = match cmd {
        "p" | "pause" => engine.pause(),
        "r" | "resume" => engine.resume(),
        "s" | "status" => Some(engine.snapshot()),
        "x" | "reset" | "q" | "quit" => {
            abandon(engine, session)?;
            return Ok(true);
        }
        "" => None,
        other => {
            eprintln!("unknown command '{other}' (p, r, s, x, q)");
            None
        }
    };
    if let Some(event) = event {
        session.emit(engine, &event)?;
    }
    Ok(false)
}

fn abandon(engine: &mut TimerEngine<IntervalTicker>, session: &Session) -> Result<(), Box<dyn Error>> {
    if let Some(event) = engine.reset() {
        if let Event::TimerReset {
            remaining_secs,
            total_secs,
            ..
        } = &event
        {
            session.record(*total_secs, *remaining_secs, RunOutcome::Abandoned);
        }
        session.emit(engine, &event)?;
    }
    Ok(())
}
