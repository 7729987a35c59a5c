use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::seller::{AdminAccount, Seller, SellerStatus};

/// Discovery outcome for one admin account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSummary {
    pub url: String,
    /// Sellers found on this admin's follow-list during the discovery
    /// phase. Not re-validated during classification.
    pub discovered: usize,
    pub error: Option<String>,
}

/// Aggregate over one full discovery + classification pass.
///
/// Created fresh per coordinator run, immutable once returned, never merged
/// across cycles; each cycle is independent ground truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub admins: Vec<AdminAccount>,
    pub total_sellers: usize,
    pub with_inventory: Vec<Seller>,
    pub without_inventory: Vec<Seller>,
    pub with_errors: Vec<Seller>,
    pub duration_secs: f64,
    pub timestamp: DateTime<Utc>,
    pub per_admin: HashMap<String, AdminSummary>,
}

/// Headline numbers for one scan, for status lines and exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_sellers: usize,
    pub with_inventory: usize,
    pub without_inventory: usize,
    pub with_errors: usize,
    pub success_rate: f64,
    pub total_items: usize,
}

impl ScanResult {
    /// Partition classified sellers by final status into a result.
    pub fn from_sellers(
        admins: Vec<AdminAccount>,
        sellers: Vec<Seller>,
        duration: Duration,
        per_admin: HashMap<String, AdminSummary>,
    ) -> Self {
        let total_sellers = sellers.len();
        let mut with_inventory = Vec::new();
        let mut without_inventory = Vec::new();
        let mut with_errors = Vec::new();

        for seller in sellers {
            match seller.status {
                SellerStatus::HasInventory => with_inventory.push(seller),
                SellerStatus::NoInventory => without_inventory.push(seller),
                // Unknown means classification never ran (cancelled mid-scan);
                // grouped with errors so no seller silently disappears.
                SellerStatus::Error | SellerStatus::Unknown => with_errors.push(seller),
            }
        }

        Self {
            admins,
            total_sellers,
            with_inventory,
            without_inventory,
            with_errors,
            duration_secs: duration.as_secs_f64(),
            timestamp: Utc::now(),
            per_admin,
        }
    }

    pub fn summary(&self) -> ScanSummary {
        let total = self.total_sellers;
        let classified = self.with_inventory.len() + self.without_inventory.len();

        ScanSummary {
            total_sellers: total,
            with_inventory: self.with_inventory.len(),
            without_inventory: self.without_inventory.len(),
            with_errors: self.with_errors.len(),
            success_rate: if total > 0 {
                classified as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            total_items: self.with_inventory.iter().map(|s| s.item_count).sum(),
        }
    }
}

impl ScanSummary {
    pub fn status_line(&self) -> String {
        format!(
            "{} sellers: {} with inventory, {} without, {} errors ({} items total)",
            self.total_sellers,
            self.with_inventory,
            self.without_inventory,
            self.with_errors,
            self.total_items
        )
    }
}
