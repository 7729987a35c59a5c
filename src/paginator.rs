//! Follow-list traversal: walks an admin account's paginated follow-list
//! and collects every seller it references.
//!
//! Termination is belt-and-braces because the site renders an out-of-range
//! page as a near-copy of the last real one: the localized "follows nobody"
//! phrase, a page without seller links, a next-URL that cannot be computed,
//! and a content probe of the next page each independently stop the walk.

use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{FetcherConfig, ScanConfig};
use crate::fetcher::PageFetcher;
use crate::models::Seller;
use crate::selectors::FollowPageScan;
use crate::session::Page;
use crate::site;
use crate::utils::error::Result;

const MAIN_CONTENT_SELECTOR: &str = "main";
const CONTAINER_WAIT: Duration = Duration::from_secs(5);

pub struct ListPaginator {
    fetcher: PageFetcher,
    primary_settle: Duration,
    fallback_settle: Duration,
    scroll_pause: Duration,
    post_scroll: Duration,
    probe_wait: Duration,
}

impl ListPaginator {
    pub fn new(fetcher_config: &FetcherConfig, scan_config: &ScanConfig) -> Self {
        Self {
            fetcher: PageFetcher::new(fetcher_config),
            primary_settle: Duration::from_millis(scan_config.primary_settle_ms),
            fallback_settle: Duration::from_millis(scan_config.fallback_settle_ms),
            scroll_pause: Duration::from_millis(scan_config.scroll_pause_ms),
            post_scroll: Duration::from_millis(scan_config.post_scroll_ms),
            probe_wait: Duration::from_millis(scan_config.probe_wait_ms),
        }
    }

    /// Walk the follow-list starting at `start_url` and return every seller
    /// found, deduplicated by id. Cancellation and non-fatal page trouble
    /// return what was collected so far; a dead session is an error.
    pub async fn collect(
        &self,
        page: &dyn Page,
        start_url: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Seller>> {
        self.fetcher.ensure_alive(page).await?;

        let mut sellers: Vec<Seller> = Vec::new();
        let mut current = start_url.to_string();
        let mut pages_walked = 0u32;

        if !self.load_page(page, &current).await? {
            return Ok(sellers);
        }

        loop {
            if cancel.is_cancelled() {
                info!("pagination cancelled after {} page(s)", pages_walked);
                break;
            }

            self.settle_and_scroll(page).await;

            let source = match page.content().await {
                Ok(s) => s,
                Err(e) => {
                    self.fetcher.ensure_alive(page).await?;
                    warn!("could not read page {}: {}", current, e);
                    break;
                }
            };
            let source_lower = source.to_lowercase();
            let scan = FollowPageScan::scan(&source);
            pages_walked += 1;

            // The page owner's own name renders as one username element, so
            // a lone element alongside the phrase means a genuinely empty
            // list rather than phrase text quoted elsewhere on the page.
            if let Some(phrase) = site::find_no_following_phrase(&source_lower) {
                if scan.username_elements <= 1 {
                    info!("end of follow-list: found '{}' on page {}", phrase, pages_walked);
                    break;
                }
            }

            let added = self.absorb_links(&scan, &current, &mut sellers);
            debug!(
                "page {} of follow-list: {} link(s), {} new seller(s)",
                pages_walked,
                scan.links.len(),
                added
            );

            if scan.links.is_empty() {
                info!("no seller links on page {}, stopping", pages_walked);
                break;
            }

            let next = site::next_page_url(&current);
            if next == current {
                warn!("could not compute next page after {}, stopping", current);
                break;
            }

            if !self.load_page(page, &next).await? {
                break;
            }

            // Probe before committing: an out-of-range page loads fine but
            // carries no seller links.
            sleep(self.probe_wait).await;
            let probe = match page.content().await {
                Ok(s) => s,
                Err(e) => {
                    self.fetcher.ensure_alive(page).await?;
                    warn!("could not probe page {}: {}", next, e);
                    break;
                }
            };
            let probe_scan = FollowPageScan::scan(&probe);
            if probe_scan.links.is_empty() && probe_scan.username_elements <= 1 {
                info!("next page {} has no content, stopping", next);
                break;
            }

            current = next;
        }

        info!(
            "collected {} seller(s) over {} page(s) from {}",
            sellers.len(),
            pages_walked,
            start_url
        );
        Ok(sellers)
    }

    /// Fetch one list page. Ok(false) means the page could not be loaded
    /// but the session is still alive, so pagination should just stop.
    /// Non-transient failures (a malformed URL, a lost session) propagate.
    async fn load_page(&self, page: &dyn Page, url: &str) -> Result<bool> {
        match self.fetcher.fetch(page, url).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_transient() => {
                self.fetcher.ensure_alive(page).await?;
                warn!("giving up on {}: {}", url, e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Wait for the main content region (or any body as fallback, with a
    /// longer settle), then scroll down and back up to force lazy rows to
    /// render.
    async fn settle_and_scroll(&self, page: &dyn Page) {
        if page
            .wait_for(MAIN_CONTENT_SELECTOR, CONTAINER_WAIT)
            .await
            .is_ok()
        {
            sleep(self.primary_settle).await;
        } else {
            let _ = page.wait_for("body", CONTAINER_WAIT).await;
            sleep(self.fallback_settle).await;
        }

        let _ = page.scroll_to_bottom().await;
        sleep(self.scroll_pause).await;
        let _ = page.scroll_to_top().await;
        sleep(self.post_scroll).await;
    }

    /// Turn a page's link snapshots into sellers, skipping ids already
    /// collected on earlier pages. Returns how many were new.
    fn absorb_links(&self, scan: &FollowPageScan, page_url: &str, sellers: &mut Vec<Seller>) -> usize {
        let mut added = 0;
        for link in &scan.links {
            let Some(profile_url) = site::absolutize(page_url, &link.href) else {
                continue;
            };
            let Some(id) = site::seller_id_from_url(&profile_url) else {
                continue;
            };
            if sellers.iter().any(|s| s.id == id) {
                continue;
            }

            let username = link
                .username
                .clone()
                .or_else(|| site::username_from_lines(&link.text_lines))
                .unwrap_or_else(|| Seller::placeholder_username(&id));

            sellers.push(Seller::new(id, username, profile_url));
            added += 1;
        }
        added
    }
}
