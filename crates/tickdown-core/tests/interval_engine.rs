//! End-to-end tests of the engine driven by the tokio interval ticker.
//!
//! Time is paused, so these run instantly and deterministically.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time;

use tickdown_core::{Event, IntervalTicker, TimerDuration, TimerEngine, TimerState};

fn engine() -> (TimerEngine<IntervalTicker>, tickdown_core::timer::TickReceiver) {
    let (ticker, rx) = IntervalTicker::new(Handle::current(), Duration::from_secs(1));
    (TimerEngine::new(ticker), rx)
}

#[tokio::test(start_paused = true)]
async fn runs_to_completion_in_real_seconds() {
    let (mut engine, mut rx) = engine();
    let started = time::Instant::now();
    engine.start(TimerDuration::new(0, 0, 0, 5));

    let mut finished = None;
    while let Some(tick) = rx.recv().await {
        if let Some(event @ Event::TimerFinished { .. }) = engine.deliver(tick) {
            finished = Some(event);
            break;
        }
    }

    assert!(finished.is_some());
    assert_eq!(engine.state(), TimerState::Finished);
    assert_eq!(started.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn paused_time_is_not_counted() {
    let (mut engine, mut rx) = engine();
    engine.start(TimerDuration::new(0, 0, 0, 10));

    for _ in 0..3 {
        let tick = rx.recv().await.unwrap();
        engine.deliver(tick);
    }
    assert_eq!(engine.remaining_secs(), 7);

    engine.pause();
    time::sleep(Duration::from_secs(30)).await;
    while let Ok(tick) = rx.try_recv() {
        engine.deliver(tick);
    }
    assert_eq!(engine.remaining_secs(), 7);

    engine.resume();
    let tick = rx.recv().await.unwrap();
    engine.deliver(tick);
    assert_eq!(engine.remaining_secs(), 6);
}

#[tokio::test(start_paused = true)]
async fn reset_leaves_no_live_emitter() {
    let (mut engine, mut rx) = engine();
    engine.start(TimerDuration::new(0, 0, 0, 10));
    time::sleep(Duration::from_millis(2_500)).await;
    engine.reset();

    time::sleep(Duration::from_secs(10)).await;
    let mut applied = 0;
    while let Ok(tick) = rx.try_recv() {
        if engine.deliver(tick).is_some() {
            applied += 1;
        }
    }
    assert_eq!(applied, 0);
    assert_eq!(engine.remaining_secs(), 0);
    assert_eq!(engine.state(), TimerState::Idle);
}
