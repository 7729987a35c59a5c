// Shared fixtures for the integration tests: an in-memory page serving
// canned HTML per URL, and a session provider handing those pages out.

pub mod alert_tests;
pub mod scheduler_tests;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shelfwatch::config::{
    AppConfig, FetcherConfig, ScanConfig, SchedulerConfig, SessionEndpoint, SiteConfig,
};
use shelfwatch::models::AdminAccount;
use shelfwatch::session::{Page, SessionHandle, SessionProvider};
use shelfwatch::{MonitorError, Result};

pub const HOST: &str = "https://www.vinted.nl";

/// An in-memory page: navigation succeeds only for known URLs, content is
/// the canned HTML of the last navigated URL. Optionally "dies" after a
/// number of navigations to simulate a browser crash mid-scan.
pub struct FakePage {
    pages: HashMap<String, String>,
    state: Mutex<PageState>,
    die_after: Option<usize>,
}

struct PageState {
    current: String,
    navigations: usize,
    dead: bool,
}

impl FakePage {
    pub fn new(pages: Vec<(String, String)>) -> Self {
        Self {
            pages: pages.into_iter().collect(),
            state: Mutex::new(PageState {
                current: String::new(),
                navigations: 0,
                dead: false,
            }),
            die_after: None,
        }
    }

    pub fn dying_after(pages: Vec<(String, String)>, navigations: usize) -> Self {
        let mut page = Self::new(pages);
        page.die_after = Some(navigations);
        page
    }

    pub fn navigations(&self) -> usize {
        self.state.lock().unwrap().navigations
    }
}

#[async_trait]
impl Page for FakePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations += 1;
        if let Some(limit) = self.die_after {
            if state.navigations > limit {
                state.dead = true;
            }
        }
        if state.dead {
            return Err(MonitorError::Browser("browser disconnected".into()));
        }
        if !self.pages.contains_key(url) {
            return Err(MonitorError::Navigation(format!("no route to {url}")));
        }
        state.current = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let state = self.state.lock().unwrap();
        if state.dead {
            return Err(MonitorError::Browser("browser disconnected".into()));
        }
        Ok(state.current.clone())
    }

    async fn wait_for(&self, _selector: &str, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        let state = self.state.lock().unwrap();
        if state.dead {
            return Err(MonitorError::Browser("browser disconnected".into()));
        }
        Ok(self.pages.get(&state.current).cloned().unwrap_or_default())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        Ok(())
    }

    async fn scroll_to_top(&self) -> Result<()> {
        Ok(())
    }
}

/// Session provider serving one `FakePage` per session id and recording
/// every acquisition and release.
pub struct FakeProvider {
    pages: HashMap<String, Arc<FakePage>>,
    acquired: Mutex<Vec<String>>,
    released: Arc<AtomicUsize>,
}

impl FakeProvider {
    pub fn new(pages: Vec<(&str, Arc<FakePage>)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(id, page)| (id.to_string(), page))
                .collect(),
            acquired: Mutex::new(Vec::new()),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn acquired(&self) -> Vec<String> {
        self.acquired.lock().unwrap().clone()
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for FakeProvider {
    async fn acquire(&self, session_id: &str) -> Result<Box<dyn SessionHandle>> {
        self.acquired.lock().unwrap().push(session_id.to_string());
        let page = self
            .pages
            .get(session_id)
            .ok_or_else(|| MonitorError::SessionAcquire {
                id: session_id.to_string(),
                reason: "unknown session id".to_string(),
            })?;
        Ok(Box::new(FakeHandle {
            page: Arc::clone(page),
            released: Arc::clone(&self.released),
        }))
    }
}

struct FakeHandle {
    page: Arc<FakePage>,
    released: Arc<AtomicUsize>,
}

#[async_trait]
impl SessionHandle for FakeHandle {
    fn page(&self) -> &dyn Page {
        &*self.page
    }

    async fn release(self: Box<Self>) -> Result<()> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Config with every delay zeroed so tests run instantly.
pub fn test_config(admins: Vec<AdminAccount>, session_ids: &[&str]) -> AppConfig {
    AppConfig {
        site: SiteConfig::default(),
        fetcher: FetcherConfig {
            retry_attempts: 0,
            retry_delay_ms: 1,
            element_wait_secs: 1,
            settle_ms: 0,
        },
        scan: ScanConfig {
            primary_settle_ms: 0,
            fallback_settle_ms: 0,
            scroll_pause_ms: 0,
            post_scroll_ms: 0,
            probe_wait_ms: 0,
            shop_settle_ms: 0,
            shop_scroll_ms: 0,
            delay_between_requests_ms: 0,
            max_item_titles: 20,
        },
        scheduler: SchedulerConfig {
            interval_minutes: 5,
            failure_cooldown_secs: 60,
        },
        admins,
        sessions: session_ids
            .iter()
            .map(|id| SessionEndpoint {
                id: id.to_string(),
                ws_url: format!("ws://127.0.0.1:9222/{id}"),
            })
            .collect(),
    }
}

pub fn admin(name: &str, id: &str) -> AdminAccount {
    AdminAccount::new(name, follow_url(id, 1))
}

pub fn follow_url(admin_id: &str, page: u32) -> String {
    format!("{HOST}/member/general/following/{admin_id}?page={page}")
}

pub fn shop_route(seller_id: &str) -> String {
    format!("{HOST}/member/{seller_id}")
}

/// A follow-list page listing the given (id, username) sellers, optionally
/// carrying the localized end-of-list phrase.
pub fn follow_page(sellers: &[(&str, &str)], terminal: bool) -> String {
    let mut html = String::from("<html><body><div class=\"followed-users__body\">");
    for (id, name) in sellers {
        html.push_str(&format!(
            "<div><div><a href=\"/member/{id}\">\
             <span data-testid=\"profile-username\">{name}</span>\
             <span>Nog geen reviews</span></a></div></div>"
        ));
    }
    html.push_str("</div>");
    if terminal {
        html.push_str("<p>Volgt nog niemand</p>");
    }
    html.push_str("</body></html>");
    html
}

/// Routes for one admin: a first page with sellers and a terminal page 2.
pub fn admin_routes(admin_id: &str, sellers: &[(&str, &str)]) -> Vec<(String, String)> {
    vec![
        (follow_url(admin_id, 1), follow_page(sellers, false)),
        (follow_url(admin_id, 2), follow_page(&[], true)),
    ]
}

pub fn shop_with_items(titles: &[&str]) -> String {
    let mut html = String::from("<html><body>");
    for title in titles {
        html.push_str(&format!(
            "<div class=\"feed-grid__item\"><p>{title}</p><p>€ 12,00</p></div>"
        ));
    }
    html.push_str("</body></html>");
    html
}

pub fn shop_empty_marker() -> String {
    "<html><body><div class=\"web_ui__EmptyState__empty-state\">No items</div></body></html>"
        .to_string()
}

pub fn shop_plain() -> String {
    "<html><body><h1>profile</h1></body></html>".to_string()
}
