//! Persistent "needs restocking attention" set, shared across scan cycles.
//!
//! Entries are keyed by `"{username}({profile_url})"`, not by seller id:
//! a username change deliberately creates a new entry, matching how the
//! alert list has always behaved. The set lives in memory for the duration
//! of a monitoring session and has no size bound.

/// Deduplication identity for an alert entry.
pub fn alert_key(username: &str, profile_url: &str) -> String {
    format!("{username}({profile_url})")
}

/// Insertion-ordered, deduplicated set of currently alerted sellers.
#[derive(Debug, Default)]
pub struct AlertSet {
    entries: Vec<String>,
}

impl AlertSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a detection. Returns true when the key was newly inserted;
    /// repeat detections are no-ops so the operator is not re-alerted.
    pub fn record_out_of_stock(&mut self, key: &str) -> bool {
        if self.entries.iter().any(|e| e == key) {
            return false;
        }
        self.entries.push(key.to_string());
        true
    }

    /// Remove a key after a later cycle reports the seller restocked.
    /// Returns true when an entry was actually removed.
    pub fn record_restocked(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e != key);
        self.entries.len() != before
    }

    /// Manual removal by the operator. Idempotent.
    pub fn remove(&mut self, key: &str) -> bool {
        self.record_restocked(key)
    }

    /// Drop every entry. Idempotent.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Current entries in insertion order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
