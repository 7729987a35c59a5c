//! Continuous monitoring loop: acquire a session, run one scan, release,
//! wait, repeat, rotating round-robin across the configured sessions.
//!
//! Failed cycles wait a short cooldown instead of the full interval. Only
//! two things end the loop: cancellation and a session-fatal error.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::alerts::AlertSet;
use crate::config::AppConfig;
use crate::coordinator::ScanCoordinator;
use crate::events::{EventSink, MonitorEvent};
use crate::models::{AdminAccount, ScanResult};
use crate::session::SessionProvider;
use crate::utils::error::{MonitorError, Result};

pub struct CycleScheduler {
    provider: Arc<dyn SessionProvider>,
    coordinator: ScanCoordinator,
    session_ids: Vec<String>,
    admins: Vec<AdminAccount>,
    interval: Duration,
    failure_cooldown: Duration,
    alerts: Arc<Mutex<AlertSet>>,
    sink: EventSink,
}

impl CycleScheduler {
    pub fn new(
        config: &AppConfig,
        provider: Arc<dyn SessionProvider>,
        alerts: Arc<Mutex<AlertSet>>,
        sink: EventSink,
    ) -> Self {
        Self {
            provider,
            coordinator: ScanCoordinator::new(config, sink.clone()),
            session_ids: config.sessions.iter().map(|s| s.id.clone()).collect(),
            admins: config.admins.clone(),
            interval: Duration::from_secs(config.scheduler.interval_minutes * 60),
            failure_cooldown: Duration::from_secs(config.scheduler.failure_cooldown_secs),
            alerts,
            sink,
        }
    }

    /// Run scan cycles until cancelled. Returns an error only when a
    /// session becomes unusable, which needs operator intervention.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let mut cycle: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let session_id = self.session_for_cycle(cycle).to_string();
            cycle += 1;
            info!("cycle {} starting on session {}", cycle, session_id);
            self.sink
                .status(format!("cycle {cycle}: scanning on session {session_id}"));

            match self.run_cycle(&session_id, &cancel).await {
                Ok(result) => {
                    self.sink.emit(MonitorEvent::CycleFinished {
                        cycle,
                        total_sellers: result.total_sellers,
                    });
                    self.wait(self.interval, &cancel).await;
                }
                Err(e) if e.is_session_fatal() => {
                    error!("cycle {} lost its session: {}", cycle, e);
                    self.sink.emit(MonitorEvent::Fatal(e.to_string()));
                    return Err(e);
                }
                Err(MonitorError::Cancelled) => break,
                Err(e) => {
                    warn!("cycle {} failed: {}", cycle, e);
                    self.sink
                        .status(format!("cycle {cycle} failed: {e}, cooling down"));
                    self.wait(self.failure_cooldown, &cancel).await;
                }
            }
        }

        info!("monitoring stopped after {} cycle(s)", cycle);
        Ok(())
    }

    fn session_for_cycle(&self, cycle: u64) -> &str {
        &self.session_ids[(cycle as usize) % self.session_ids.len()]
    }

    /// One acquire-scan-release round. The session is released whatever
    /// the scan's outcome.
    async fn run_cycle(&self, session_id: &str, cancel: &CancellationToken) -> Result<ScanResult> {
        let handle = self.provider.acquire(session_id).await?;

        let outcome = self
            .coordinator
            .run(handle.page(), &self.admins, &self.alerts, cancel)
            .await;

        if let Err(e) = handle.release().await {
            warn!("could not release session {}: {}", session_id, e);
        }

        outcome
    }

    /// Sleep for `duration`, emitting a once-per-second countdown, and
    /// return early on cancellation.
    async fn wait(&self, duration: Duration, cancel: &CancellationToken) {
        for seconds_left in (1..=duration.as_secs()).rev() {
            self.sink.emit(MonitorEvent::Countdown { seconds_left });
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = sleep(Duration::from_secs(1)) => {}
            }
        }
    }
}
