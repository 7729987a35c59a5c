//! Page fetching with bounded retry.
//!
//! A fetch is navigate + wait for the DOM-readiness element + a fixed
//! settle, retried with exponential backoff for transient failures only.
//! Malformed URLs and dead sessions fail immediately; retrying those just
//! burns the backoff budget.

use std::time::Duration;
use tokio::time::sleep;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::{debug, warn};
use url::Url;

use crate::config::FetcherConfig;
use crate::session::Page;
use crate::utils::error::{MonitorError, Result};

pub struct PageFetcher {
    retry_attempts: u32,
    retry_delay_ms: u64,
    element_wait: Duration,
    settle: Duration,
}

impl PageFetcher {
    pub fn new(config: &FetcherConfig) -> Self {
        Self {
            retry_attempts: config.retry_attempts,
            retry_delay_ms: config.retry_delay_ms,
            element_wait: Duration::from_secs(config.element_wait_secs),
            settle: Duration::from_millis(config.settle_ms),
        }
    }

    /// Load `url` and wait until the page body exists. Transient failures
    /// are retried with doubling delays (delay, 2*delay, 4*delay, ...).
    pub async fn fetch(&self, page: &dyn Page, url: &str) -> Result<()> {
        Url::parse(url).map_err(|e| MonitorError::InvalidUrl(format!("{url}: {e}")))?;

        // from_millis(2) doubles per attempt; factor scales the base up to
        // the configured first-retry delay.
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(self.retry_delay_ms / 2)
            .take(self.retry_attempts as usize);

        RetryIf::spawn(
            strategy,
            || self.fetch_once(page, url),
            |e: &MonitorError| {
                let retry = e.is_transient();
                if retry {
                    warn!("fetch of {} failed, will retry: {}", url, e);
                }
                retry
            },
        )
        .await
    }

    async fn fetch_once(&self, page: &dyn Page, url: &str) -> Result<()> {
        debug!("fetching {}", url);
        page.navigate(url).await?;
        page.wait_for("body", self.element_wait).await?;
        sleep(self.settle).await;
        Ok(())
    }

    /// Cheap liveness probe; false means the browser stopped answering.
    pub async fn check_connection(&self, page: &dyn Page) -> bool {
        page.current_url().await.is_ok()
    }

    pub async fn ensure_alive(&self, page: &dyn Page) -> Result<()> {
        if self.check_connection(page).await {
            Ok(())
        } else {
            Err(MonitorError::SessionLost(
                "browser stopped responding".into(),
            ))
        }
    }
}
