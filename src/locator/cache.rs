//! Process-wide cache of located streams.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::Candidate;

/// Maps page URLs to their resolved stream candidate.
///
/// Keys are the exact URL string as received; no normalization, so two URLs
/// differing only by a trailing slash are distinct entries. Failed lookups
/// are never stored, which keeps every miss retryable. Unbounded growth is
/// an accepted tradeoff; `clear` is the only eviction mechanism.
#[derive(Default)]
pub struct LocatorCache {
    entries: Mutex<HashMap<String, Candidate>>,
}

impl LocatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, page_url: &str) -> Option<Candidate> {
        self.entries
            .lock()
            .expect("locator cache poisoned")
            .get(page_url)
            .cloned()
    }

    pub fn put(&self, page_url: &str, candidate: Candidate) {
        self.entries
            .lock()
            .expect("locator cache poisoned")
            .insert(page_url.to_string(), candidate);
    }

    /// Drop every entry. Exposed as an operator action via `/clear-cache`.
    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("locator cache poisoned")
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("locator cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
