//! Integration tests for duration history wired through the engine.

use tickdown_core::history::HISTORY_KEY;
use tickdown_core::{
    Database, HistoryRecorder, ManualTicker, PersistentHistory, TimerDuration, TimerEngine,
    HISTORY_CAPACITY,
};

fn minutes(m: i64) -> TimerDuration {
    TimerDuration::new(0, 0, m, 0)
}

fn start_and_reset(engine: &mut TimerEngine<ManualTicker>, d: TimerDuration) {
    assert!(engine.start(d).is_some());
    engine.reset();
}

#[test]
fn six_distinct_starts_keep_five_newest() {
    let mut engine = TimerEngine::new(ManualTicker::new());
    for m in 1..=6 {
        start_and_reset(&mut engine, minutes(m));
    }
    let recent = engine.recent_durations();
    assert_eq!(recent.len(), HISTORY_CAPACITY);
    assert_eq!(
        recent,
        vec![minutes(6), minutes(5), minutes(4), minutes(3), minutes(2)]
    );
}

#[test]
fn restarting_existing_duration_moves_it_to_front() {
    let mut engine = TimerEngine::new(ManualTicker::new());
    for m in 1..=5 {
        start_and_reset(&mut engine, minutes(m));
    }
    start_and_reset(&mut engine, minutes(2));
    let recent = engine.recent_durations();
    assert_eq!(recent.len(), 5);
    assert_eq!(
        recent,
        vec![minutes(2), minutes(5), minutes(4), minutes(3), minutes(1)]
    );
}

#[test]
fn persisted_history_is_shared_across_engines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tickdown.db");

    {
        let history = PersistentHistory::load(Database::open_at(&path).unwrap());
        let mut engine = TimerEngine::new(ManualTicker::new()).with_history(history);
        start_and_reset(&mut engine, minutes(3));
        start_and_reset(&mut engine, TimerDuration::new(1, 0, 0, 0));
    }

    let history = PersistentHistory::load(Database::open_at(&path).unwrap());
    assert_eq!(
        history.recent(),
        vec![TimerDuration::new(1, 0, 0, 0), minutes(3)]
    );

    let raw = history.database().kv_get(HISTORY_KEY).unwrap().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed[0]["days"], 1);
}

#[test]
fn unstartable_duration_is_not_recorded() {
    let mut engine = TimerEngine::new(ManualTicker::new());
    assert!(engine.start(TimerDuration::default()).is_none());
    assert!(engine.recent_durations().is_empty());
}
