//! Stream locators: resolve a page URL to a playable stream candidate.
//!
//! Two implementations sit behind one trait. [`StaticLocator`] scans the
//! fetched HTML; [`BrowserLocator`] drives a headless browser, executes the
//! page's scripts, and observes network traffic. The orchestrator depends
//! only on the trait, so tests swap in stubs.

pub mod cache;
pub mod static_locator;

#[cfg(feature = "browser")]
pub mod browser;

pub use cache::LocatorCache;
pub use static_locator::StaticLocator;

#[cfg(feature = "browser")]
pub use browser::{BrowserLocator, BrowserLocatorConfig};

use async_trait::async_trait;

use crate::models::Candidate;

/// A source of stream candidates for a page.
#[async_trait]
pub trait Locator: Send + Sync {
    /// Resolve a page URL to its best stream candidate.
    ///
    /// `Ok(None)` means no stream was found; internal faults (unreachable
    /// page, automation errors) are downgraded to `Ok(None)` as well so the
    /// caller can report not-found rather than crash. `Err` is reserved for
    /// failures worth surfacing to the client, like the page fetch itself.
    async fn locate(&self, page_url: &str) -> anyhow::Result<Option<Candidate>>;
}
