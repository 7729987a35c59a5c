use serde::{Deserialize, Serialize};

/// An admin account whose follow-list seeds the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAccount {
    pub name: String,
    pub url: String,
}

impl AdminAccount {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Inventory state of a seller as classified from their shop page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellerStatus {
    Unknown,
    HasInventory,
    NoInventory,
    Error,
}

/// A monitored seller discovered from a follow-list.
///
/// Identity is `id` (parsed from the profile URL); the same seller reached
/// through two admin accounts is a logical duplicate and the coordinator's
/// union step keeps only the first discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seller {
    pub id: String,
    pub username: String,
    pub profile_url: String,
    /// Which admin's follow-list this seller was discovered on. Reporting
    /// only; never part of identity.
    pub owner_admin: String,
    pub status: SellerStatus,
    pub item_count: usize,
    /// Up to 20 extracted item titles, discovery order.
    pub items: Vec<String>,
    /// Present only when `status == Error`.
    pub error_detail: Option<String>,
}

impl Seller {
    pub fn new(id: impl Into<String>, username: impl Into<String>, profile_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            profile_url: profile_url.into(),
            owner_admin: String::new(),
            status: SellerStatus::Unknown,
            item_count: 0,
            items: Vec::new(),
            error_detail: None,
        }
    }

    /// Fallback display name for a seller whose username could not be
    /// resolved from the page.
    pub fn placeholder_username(id: &str) -> String {
        format!("User_{id}")
    }

    pub fn mark_error(&mut self, detail: impl Into<String>) {
        self.status = SellerStatus::Error;
        self.item_count = 0;
        self.items.clear();
        self.error_detail = Some(detail.into());
    }

    pub fn mark_no_inventory(&mut self) {
        self.status = SellerStatus::NoInventory;
        self.item_count = 0;
        self.items.clear();
        self.error_detail = None;
    }

    pub fn mark_has_inventory(&mut self, item_count: usize, items: Vec<String>) {
        self.status = SellerStatus::HasInventory;
        self.item_count = item_count;
        self.items = items;
        self.error_detail = None;
    }
}
