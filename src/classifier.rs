//! Shop-page inventory classification.
//!
//! Classification never fails the scan: every outcome, including page
//! trouble, is recorded on the seller itself so one broken shop page
//! costs exactly one `Error` entry and nothing else.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{FetcherConfig, ScanConfig};
use crate::fetcher::PageFetcher;
use crate::models::Seller;
use crate::selectors::ShopPageScan;
use crate::session::Page;
use crate::site;
use crate::utils::error::Result;

pub struct InventoryClassifier {
    fetcher: PageFetcher,
    shop_settle: Duration,
    shop_scroll: Duration,
    max_item_titles: usize,
}

impl InventoryClassifier {
    pub fn new(fetcher_config: &FetcherConfig, scan_config: &ScanConfig) -> Self {
        Self {
            fetcher: PageFetcher::new(fetcher_config),
            shop_settle: Duration::from_millis(scan_config.shop_settle_ms),
            shop_scroll: Duration::from_millis(scan_config.shop_scroll_ms),
            max_item_titles: scan_config.max_item_titles,
        }
    }

    /// Open the seller's shop page and record the inventory verdict on the
    /// seller. Always returns; failures become `SellerStatus::Error`.
    pub async fn classify(&self, page: &dyn Page, seller: &mut Seller) {
        let shop_url = site::shop_url(&seller.profile_url);
        debug!("classifying {} at {}", seller.username, shop_url);

        if let Err(e) = self.fetcher.fetch(page, &shop_url).await {
            warn!("could not open shop page for {}: {}", seller.username, e);
            seller.mark_error("could not open the seller's shop page");
            return;
        }

        match self.inspect(page).await {
            Ok(verdict) => self.apply(seller, verdict),
            Err(e) => {
                warn!("could not inspect shop page for {}: {}", seller.username, e);
                seller.mark_error(e.to_string());
            }
        }
    }

    async fn inspect(&self, page: &dyn Page) -> Result<Verdict> {
        sleep(self.shop_settle).await;
        // Item grids load lazily; one full scroll forces them in.
        page.scroll_to_bottom().await?;
        sleep(self.shop_scroll).await;

        let source = page.content().await?;
        let scan = ShopPageScan::scan(&source);

        let text_count = site::text_item_count(&source.to_lowercase());

        if scan.empty_state {
            return Ok(Verdict::Empty);
        }

        if scan.items.is_empty() {
            return Ok(Verdict::Empty);
        }

        if let Some(count) = text_count {
            if count as usize != scan.items.len() {
                info!(
                    "page text says {} item(s) but {} element(s) matched '{}'",
                    count,
                    scan.items.len(),
                    scan.matched_selector.unwrap_or("?")
                );
            }
        }

        let titles = scan
            .items
            .iter()
            .take(self.max_item_titles)
            .filter_map(|item| site::pick_item_title(&item.text_lines))
            .collect();

        Ok(Verdict::Listed {
            item_count: scan.items.len(),
            titles,
        })
    }

    fn apply(&self, seller: &mut Seller, verdict: Verdict) {
        match verdict {
            Verdict::Empty => {
                debug!("{} has no inventory", seller.username);
                seller.mark_no_inventory();
            }
            Verdict::Listed { item_count, titles } => {
                info!("{} has {} item(s) listed", seller.username, item_count);
                seller.mark_has_inventory(item_count, titles);
            }
        }
    }
}

enum Verdict {
    Empty,
    Listed {
        item_count: usize,
        titles: Vec<String>,
    },
}
