use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// One-way notifications for the presentation layer. Every emission is
/// fire-and-forget: a closed or missing receiver never blocks or fails the
/// scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MonitorEvent {
    /// Free-form status text, mirroring the progress log.
    Status(String),
    /// Position within the current phase (1-based).
    Progress {
        current: usize,
        total: usize,
        label: String,
    },
    /// A tracked seller was detected with active listings and entered the
    /// alert set.
    OutOfStockAlert {
        username: String,
        admin: String,
        profile_url: String,
    },
    /// A previously alerted seller no longer shows listings and left the
    /// alert set.
    Restocked {
        username: String,
        profile_url: String,
    },
    /// Seconds remaining until the next cycle starts.
    Countdown { seconds_left: u64 },
    /// One full discovery + classification pass finished.
    CycleFinished { cycle: u64, total_sellers: usize },
    /// The scheduler halted on an unrecoverable failure.
    Fatal(String),
}

/// Cloneable sender handle passed into every component that reports
/// progress.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Option<UnboundedSender<MonitorEvent>>,
}

impl EventSink {
    pub fn new(tx: UnboundedSender<MonitorEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Sink that drops every event; used by one-shot runs and tests that
    /// don't observe notifications.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: MonitorEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }

    pub fn status(&self, message: impl Into<String>) {
        self.emit(MonitorEvent::Status(message.into()));
    }

    pub fn progress(&self, current: usize, total: usize, label: impl Into<String>) {
        self.emit(MonitorEvent::Progress {
            current,
            total,
            label: label.into(),
        });
    }
}
