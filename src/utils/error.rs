use thiserror::Error;

/// Error taxonomy for the monitor. The retry layer and the scheduler make
/// policy decisions based on the two predicates below, so new variants must
/// be slotted into one of: transient (retried), session-fatal (halts the
/// scheduler), or neither (reported and carried on).
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timed out waiting for element: {selector}")]
    ElementWait { selector: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Browser session lost: {0}")]
    SessionLost(String),

    #[error("Could not acquire session '{id}': {reason}")]
    SessionAcquire { id: String, reason: String },

    #[error("No sellers discovered across {0} admin account(s)")]
    NoSellers(usize),

    #[error("Operation cancelled")]
    Cancelled,
}

impl MonitorError {
    /// Transient failures are retried with backoff inside the page fetcher.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MonitorError::Navigation(_)
                | MonitorError::ElementWait { .. }
                | MonitorError::Browser(_)
        )
    }

    /// Session-fatal failures abort the current scan and halt the scheduler;
    /// the browser session resource itself is gone, so retrying cycles on it
    /// would spin forever.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            MonitorError::SessionLost(_) | MonitorError::SessionAcquire { .. }
        )
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MonitorError>;
