//! Narrow contracts over externally provisioned browser sessions.
//!
//! The monitor never enumerates, creates, or fingerprints browser profiles;
//! a control plane outside this crate does that. All the core needs is a
//! live navigable handle per session id, and a way to give it back. The
//! concrete implementation attaches over the DevTools protocol to a
//! browser the control plane already opened.

use async_trait::async_trait;
use headless_chrome::{Browser, Tab};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::SessionEndpoint;
use crate::utils::error::{MonitorError, Result};

/// A navigable browser page. Content is read as full-page HTML snapshots;
/// all DOM analysis happens in-process on those snapshots.
#[async_trait]
pub trait Page: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;
    /// Read the page's current address. Doubles as the liveness probe:
    /// an error here means the session is gone.
    async fn current_url(&self) -> Result<String>;
    /// Block until an element matching `selector` exists.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()>;
    /// Full rendered HTML of the current page.
    async fn content(&self) -> Result<String>;
    async fn scroll_to_bottom(&self) -> Result<()>;
    async fn scroll_to_top(&self) -> Result<()>;
}

/// An acquired session: a page plus the obligation to release it.
#[async_trait]
pub trait SessionHandle: Send + Sync {
    fn page(&self) -> &dyn Page;
    async fn release(self: Box<Self>) -> Result<()>;
}

/// Hands out live session handles by id.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn acquire(&self, session_id: &str) -> Result<Box<dyn SessionHandle>>;
}

/// Session provider backed by pre-provisioned browsers reachable over
/// DevTools websocket endpoints.
pub struct ChromeSessionProvider {
    endpoints: HashMap<String, String>,
}

impl ChromeSessionProvider {
    pub fn new(endpoints: &[SessionEndpoint]) -> Self {
        Self {
            endpoints: endpoints
                .iter()
                .map(|e| (e.id.clone(), e.ws_url.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl SessionProvider for ChromeSessionProvider {
    async fn acquire(&self, session_id: &str) -> Result<Box<dyn SessionHandle>> {
        let ws_url = self.endpoints.get(session_id).ok_or_else(|| {
            MonitorError::SessionAcquire {
                id: session_id.to_string(),
                reason: "unknown session id".to_string(),
            }
        })?;

        let browser =
            Browser::connect(ws_url.clone()).map_err(|e| MonitorError::SessionAcquire {
                id: session_id.to_string(),
                reason: e.to_string(),
            })?;

        let tab = browser.new_tab().map_err(|e| MonitorError::SessionAcquire {
            id: session_id.to_string(),
            reason: e.to_string(),
        })?;

        debug!("attached to session {} at {}", session_id, ws_url);

        Ok(Box::new(ChromeSession {
            page: ChromePage::new(tab),
            // Dropping the Browser detaches from the remote instance; the
            // control plane keeps the browser itself alive.
            _browser: browser,
            session_id: session_id.to_string(),
        }))
    }
}

struct ChromeSession {
    page: ChromePage,
    _browser: Browser,
    session_id: String,
}

#[async_trait]
impl SessionHandle for ChromeSession {
    fn page(&self) -> &dyn Page {
        &self.page
    }

    async fn release(self: Box<Self>) -> Result<()> {
        // Close only our tab; the provisioned browser stays up for the
        // next rotation.
        let _ = self.page.tab.close(true);
        debug!("released session {}", self.session_id);
        Ok(())
    }
}

pub struct ChromePage {
    tab: Arc<Tab>,
}

impl ChromePage {
    pub fn new(tab: Arc<Tab>) -> Self {
        Self { tab }
    }

    fn eval(&self, expression: &str) -> Result<Option<serde_json::Value>> {
        let object = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| MonitorError::Browser(e.to_string()))?;
        Ok(object.value)
    }
}

#[async_trait]
impl Page for ChromePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| MonitorError::Navigation(e.to_string()))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| MonitorError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        match self.eval("window.location.href")? {
            Some(serde_json::Value::String(url)) => Ok(url),
            other => Err(MonitorError::Browser(format!(
                "unexpected location value: {other:?}"
            ))),
        }
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map(|_| ())
            .map_err(|_| MonitorError::ElementWait {
                selector: selector.to_string(),
            })
    }

    async fn content(&self) -> Result<String> {
        self.tab
            .get_content()
            .map_err(|e| MonitorError::Browser(e.to_string()))
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.eval("window.scrollTo(0, document.body.scrollHeight);")?;
        Ok(())
    }

    async fn scroll_to_top(&self) -> Result<()> {
        self.eval("window.scrollTo(0, 0);")?;
        Ok(())
    }
}
