use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

use crate::models::AdminAccount;
use crate::site;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Admin accounts whose follow-lists seed each scan, in scan order.
    pub admins: Vec<AdminAccount>,
    /// Pre-provisioned browser sessions rotated across cycles.
    pub sessions: Vec<SessionEndpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Expected host suffix for all admin follow-list URLs.
    pub host: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            host: "vinted.nl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEndpoint {
    pub id: String,
    /// DevTools websocket URL of the already-running browser.
    pub ws_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Extra attempts after the first failed fetch.
    pub retry_attempts: u32,
    /// Base backoff before the first retry; doubles per attempt.
    pub retry_delay_ms: u64,
    /// How long to wait for the DOM-readiness element.
    pub element_wait_secs: u64,
    /// Fixed settle after a successful navigation.
    pub settle_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay_ms: 2000,
            element_wait_secs: 10,
            settle_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Settle after the primary content container appears.
    pub primary_settle_ms: u64,
    /// Longer settle when falling back to the generic body container.
    pub fallback_settle_ms: u64,
    /// Pause after scrolling to the bottom of a follow-list page.
    pub scroll_pause_ms: u64,
    /// Pause after scrolling back to the top.
    pub post_scroll_ms: u64,
    /// Wait before probing the next page for content.
    pub probe_wait_ms: u64,
    /// Settle after opening a shop page.
    pub shop_settle_ms: u64,
    /// Pause after scrolling a shop page to trigger lazy items.
    pub shop_scroll_ms: u64,
    /// Delay between seller classifications, to go easy on the site.
    pub delay_between_requests_ms: u64,
    /// Cap on extracted item titles per seller.
    pub max_item_titles: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            primary_settle_ms: 2000,
            fallback_settle_ms: 3000,
            scroll_pause_ms: 2000,
            post_scroll_ms: 1000,
            probe_wait_ms: 2000,
            shop_settle_ms: 3000,
            shop_scroll_ms: 2000,
            delay_between_requests_ms: 1000,
            max_item_titles: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Wait between successful cycles.
    pub interval_minutes: u64,
    /// Shorter wait before retrying after a failed cycle.
    pub failure_cooldown_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 5,
            failure_cooldown_secs: 60,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> crate::Result<Self> {
        Self::from_dir("config")
    }

    pub fn from_dir(dir: &str) -> crate::Result<Self> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name(&format!("{dir}/default")))
            // Add environment-specific config
            .add_source(File::with_name(&format!("{dir}/{run_mode}")).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name(&format!("{dir}/local")).required(false))
            // Add environment variables with prefix "MONITOR_"
            .add_source(Environment::with_prefix("MONITOR").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admins.is_empty() {
            return Err(ConfigError::Message(
                "At least one admin account is required".into(),
            ));
        }

        for admin in &self.admins {
            if admin.name.trim().is_empty() {
                return Err(ConfigError::Message("Admin name cannot be empty".into()));
            }
            if let Err(reason) = site::validate_follow_list_url(&admin.url, &self.site.host) {
                return Err(ConfigError::Message(format!(
                    "Admin '{}' has an invalid follow-list URL: {reason}",
                    admin.name
                )));
            }
        }

        if self.sessions.is_empty() {
            return Err(ConfigError::Message(
                "At least one browser session is required".into(),
            ));
        }

        for (i, session) in self.sessions.iter().enumerate() {
            if session.id.trim().is_empty() {
                return Err(ConfigError::Message("Session id cannot be empty".into()));
            }
            if self.sessions[..i].iter().any(|s| s.id == session.id) {
                return Err(ConfigError::Message(format!(
                    "Duplicate session id '{}'",
                    session.id
                )));
            }
            if !session.ws_url.starts_with("ws://") && !session.ws_url.starts_with("wss://") {
                return Err(ConfigError::Message(format!(
                    "Session '{}' must use a ws:// or wss:// endpoint",
                    session.id
                )));
            }
        }

        if self.fetcher.element_wait_secs == 0 {
            return Err(ConfigError::Message(
                "Fetcher element_wait_secs must be greater than 0".into(),
            ));
        }

        if self.scan.max_item_titles == 0 {
            return Err(ConfigError::Message(
                "Scan max_item_titles must be greater than 0".into(),
            ));
        }

        if self.scheduler.interval_minutes == 0 {
            return Err(ConfigError::Message(
                "Scheduler interval_minutes must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}
