// Continuous-monitoring loop: session rotation, failure cooldown, and
// shutdown behavior, all on paused tokio time.

use super::*;
use std::sync::Arc as StdArc;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;

use shelfwatch::alerts::AlertSet;
use shelfwatch::events::{EventSink, MonitorEvent};
use shelfwatch::scheduler::CycleScheduler;

fn healthy_routes() -> Vec<(String, String)> {
    let mut routes = admin_routes("901", &[("11", "anna")]);
    routes.push((shop_route("11"), shop_with_items(&["Jacket"])));
    routes
}

#[tokio::test(start_paused = true)]
async fn test_sessions_rotate_round_robin() -> anyhow::Result<()> {
    let provider = StdArc::new(FakeProvider::new(vec![
        ("w1", StdArc::new(FakePage::new(healthy_routes()))),
        ("w2", StdArc::new(FakePage::new(healthy_routes()))),
    ]));
    let config = test_config(vec![admin("A", "901")], &["w1", "w2"]);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = CycleScheduler::new(
        &config,
        provider.clone(),
        StdArc::new(AsyncMutex::new(AlertSet::new())),
        EventSink::new(tx),
    );

    let cancel = CancellationToken::new();
    let run_cancel = cancel.clone();
    let handle = tokio::spawn(async move { scheduler.run(run_cancel).await });

    let mut finished = 0;
    while finished < 3 {
        if let Some(MonitorEvent::CycleFinished { .. }) = rx.recv().await {
            finished += 1;
        }
    }
    cancel.cancel();
    handle.await??;

    let acquired = provider.acquired();
    assert_eq!(acquired[..3], ["w1", "w2", "w1"]);
    // Every acquired session was released, scan outcome notwithstanding.
    assert_eq!(provider.released(), acquired.len());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_failed_cycle_waits_the_cooldown_not_the_interval() -> anyhow::Result<()> {
    // The follow-list is terminally empty, so every cycle fails with a
    // no-sellers error and the loop should cool down for 60s, not 5min.
    let routes = vec![(follow_url("901", 1), follow_page(&[], true))];
    let provider = StdArc::new(FakeProvider::new(vec![(
        "w1",
        StdArc::new(FakePage::new(routes)),
    )]));
    let config = test_config(vec![admin("A", "901")], &["w1"]);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = CycleScheduler::new(
        &config,
        provider.clone(),
        StdArc::new(AsyncMutex::new(AlertSet::new())),
        EventSink::new(tx),
    );

    let cancel = CancellationToken::new();
    let run_cancel = cancel.clone();
    let handle = tokio::spawn(async move { scheduler.run(run_cancel).await });

    let first_countdown = loop {
        match rx.recv().await {
            Some(MonitorEvent::Countdown { seconds_left }) => break seconds_left,
            Some(_) => continue,
            None => panic!("event channel closed early"),
        }
    };
    cancel.cancel();
    handle.await??;

    assert_eq!(first_countdown, 60);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unusable_session_halts_the_loop() {
    // Provider knows no sessions at all; the very first acquire fails and
    // that is an operator problem, not something to retry forever.
    let provider = StdArc::new(FakeProvider::new(vec![]));
    let config = test_config(vec![admin("A", "901")], &["w1"]);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = CycleScheduler::new(
        &config,
        provider,
        StdArc::new(AsyncMutex::new(AlertSet::new())),
        EventSink::new(tx),
    );

    let err = scheduler.run(CancellationToken::new()).await.err().unwrap();
    assert!(err.is_session_fatal());

    let mut saw_fatal = false;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, MonitorEvent::Fatal(_)) {
            saw_fatal = true;
        }
    }
    assert!(saw_fatal);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_during_wait_stops_promptly() -> anyhow::Result<()> {
    let provider = StdArc::new(FakeProvider::new(vec![(
        "w1",
        StdArc::new(FakePage::new(healthy_routes())),
    )]));
    let config = test_config(vec![admin("A", "901")], &["w1"]);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = CycleScheduler::new(
        &config,
        provider.clone(),
        StdArc::new(AsyncMutex::new(AlertSet::new())),
        EventSink::new(tx),
    );

    let cancel = CancellationToken::new();
    let run_cancel = cancel.clone();
    let handle = tokio::spawn(async move { scheduler.run(run_cancel).await });

    // Let the first cycle finish, cancel during the interval wait.
    loop {
        if let Some(MonitorEvent::CycleFinished { .. }) = rx.recv().await {
            break;
        }
    }
    cancel.cancel();
    handle.await??;

    // No second cycle ever started.
    assert_eq!(provider.acquired(), vec!["w1"]);
    Ok(())
}
