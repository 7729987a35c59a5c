//! One full scan: discover sellers from every admin's follow-list, union
//! them, then classify each seller's shop inventory.
//!
//! The two phases are strictly sequential and share one browser page, so
//! a scan holds exactly one session. Per-admin discovery failures are
//! recorded and skipped; only a dead session or an all-admins-empty
//! discovery aborts the scan.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::alerts::{alert_key, AlertSet};
use crate::classifier::InventoryClassifier;
use crate::config::AppConfig;
use crate::events::{EventSink, MonitorEvent};
use crate::models::{AdminAccount, AdminSummary, ScanResult, Seller, SellerStatus};
use crate::paginator::ListPaginator;
use crate::session::Page;
use crate::utils::error::{MonitorError, Result};

pub struct ScanCoordinator {
    paginator: ListPaginator,
    classifier: InventoryClassifier,
    delay_between: Duration,
    sink: EventSink,
}

impl ScanCoordinator {
    pub fn new(config: &AppConfig, sink: EventSink) -> Self {
        Self {
            paginator: ListPaginator::new(&config.fetcher, &config.scan),
            classifier: InventoryClassifier::new(&config.fetcher, &config.scan),
            delay_between: Duration::from_millis(config.scan.delay_between_requests_ms),
            sink,
        }
    }

    /// Run one scan on an already-acquired page. Cancellation during
    /// discovery aborts the scan; cancellation during classification
    /// returns the partial result.
    pub async fn run(
        &self,
        page: &dyn Page,
        admins: &[AdminAccount],
        alerts: &Arc<Mutex<AlertSet>>,
        cancel: &CancellationToken,
    ) -> Result<ScanResult> {
        let started = Instant::now();

        let (mut sellers, per_admin) = self.discover(page, admins, cancel).await?;

        if sellers.is_empty() {
            return Err(MonitorError::NoSellers(admins.len()));
        }

        let total = sellers.len();
        self.sink
            .status(format!("classifying {} seller(s)", total));

        for (i, seller) in sellers.iter_mut().enumerate() {
            if cancel.is_cancelled() {
                info!("scan cancelled after {} of {} seller(s)", i, total);
                break;
            }

            self.sink.progress(i + 1, total, seller.username.clone());
            self.classifier.classify(page, seller).await;
            self.update_alerts(seller, alerts).await;

            // An errored seller already cost a full fetch-retry budget;
            // no extra politeness delay on top.
            if seller.status != SellerStatus::Error {
                sleep(self.delay_between).await;
            }
        }

        let result = ScanResult::from_sellers(
            admins.to_vec(),
            sellers,
            started.elapsed(),
            per_admin,
        );
        info!("scan finished: {}", result.summary().status_line());
        Ok(result)
    }

    /// Phase 1: walk every admin's follow-list and union the sellers by id,
    /// keeping the first discovery and tagging it with its admin.
    async fn discover(
        &self,
        page: &dyn Page,
        admins: &[AdminAccount],
        cancel: &CancellationToken,
    ) -> Result<(Vec<Seller>, HashMap<String, AdminSummary>)> {
        let mut sellers: Vec<Seller> = Vec::new();
        let mut per_admin = HashMap::new();

        for (i, admin) in admins.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(MonitorError::Cancelled);
            }

            self.sink.progress(i + 1, admins.len(), admin.name.clone());
            self.sink
                .status(format!("reading follow-list of {}", admin.name));

            match self.paginator.collect(page, &admin.url, cancel).await {
                Ok(found) => {
                    // The summary counts this admin's whole list; the union
                    // below only controls who gets classified.
                    let listed = found.len();
                    let mut new = 0;
                    for mut seller in found {
                        if sellers.iter().any(|s| s.id == seller.id) {
                            continue;
                        }
                        seller.owner_admin = admin.name.clone();
                        sellers.push(seller);
                        new += 1;
                    }
                    info!("{}: {} seller(s) listed, {} new", admin.name, listed, new);
                    per_admin.insert(
                        admin.name.clone(),
                        AdminSummary {
                            url: admin.url.clone(),
                            discovered: listed,
                            error: None,
                        },
                    );
                }
                Err(e) if e.is_session_fatal() || matches!(e, MonitorError::Cancelled) => {
                    return Err(e);
                }
                Err(e) => {
                    warn!("discovery failed for {}: {}", admin.name, e);
                    per_admin.insert(
                        admin.name.clone(),
                        AdminSummary {
                            url: admin.url.clone(),
                            discovered: 0,
                            error: Some(e.to_string()),
                        },
                    );
                }
            }
        }

        Ok((sellers, per_admin))
    }

    /// Translate a classification verdict into alert-set mutations and
    /// notify only on actual transitions.
    async fn update_alerts(&self, seller: &Seller, alerts: &Arc<Mutex<AlertSet>>) {
        let key = alert_key(&seller.username, &seller.profile_url);
        match seller.status {
            SellerStatus::HasInventory => {
                let newly = alerts.lock().await.record_out_of_stock(&key);
                if newly {
                    self.sink.emit(MonitorEvent::OutOfStockAlert {
                        username: seller.username.clone(),
                        admin: seller.owner_admin.clone(),
                        profile_url: seller.profile_url.clone(),
                    });
                    self.sink.status(format!(
                        "{} now has {} item(s) listed",
                        seller.username, seller.item_count
                    ));
                }
            }
            SellerStatus::NoInventory => {
                let removed = alerts.lock().await.record_restocked(&key);
                if removed {
                    self.sink.emit(MonitorEvent::Restocked {
                        username: seller.username.clone(),
                        profile_url: seller.profile_url.clone(),
                    });
                }
            }
            // Errors and cancelled leftovers leave the alert set untouched.
            SellerStatus::Error | SellerStatus::Unknown => {}
        }
    }
}
