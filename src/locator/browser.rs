//! Browser-based stream location.
//!
//! Loads the page in headless Chrome via chromiumoxide (CDP), lets its
//! scripts run, and observes outbound network requests for stream URLs.
//! This catches players that assemble their stream URL at runtime, which the
//! static scan can never see.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventRequestWillBeSent, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::fetcher::BROWSER_USER_AGENT;
use crate::models::{select_best, Candidate, StreamKind};

use super::Locator;

/// Selector for play-like controls, matched by common ARIA/class/title
/// conventions.
const PLAY_BUTTON_SELECTOR: &str =
    r#"button[aria-label*="play"], button.play, .play-button, button[title*="Play"]"#;

/// Wait after navigation for deferred/XHR-driven video loads.
const SETTLE_AFTER_LOAD: Duration = Duration::from_secs(5);

/// Wait after each interaction heuristic.
const SETTLE_AFTER_CLICK: Duration = Duration::from_secs(3);

/// Browser locator configuration.
#[derive(Debug, Clone)]
pub struct BrowserLocatorConfig {
    /// Chrome/Chromium executable override. When unset, well-known install
    /// paths and `PATH` are probed.
    pub chrome_path: Option<PathBuf>,

    /// Run headless (default). Set false for debugging.
    pub headless: bool,

    /// Timeout for the navigation step. Settle and interaction budgets are
    /// additive on top of this.
    pub navigation_timeout: Duration,

    /// Cap on concurrent browser sessions.
    pub max_sessions: usize,
}

impl Default for BrowserLocatorConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            navigation_timeout: Duration::from_secs(30),
            max_sessions: 2,
        }
    }
}

/// Locator that drives an isolated headless browser session per invocation.
///
/// Sessions are never pooled or reused; each `locate` launches its own
/// browser and tears it down unconditionally, trading latency for isolation.
/// A semaphore bounds how many sessions run at once.
pub struct BrowserLocator {
    config: BrowserLocatorConfig,
    sessions: Semaphore,
}

impl BrowserLocator {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/opt/google/chrome/google-chrome",
    ];

    pub fn new(config: BrowserLocatorConfig) -> Self {
        let sessions = Semaphore::new(config.max_sessions.max(1));
        Self { config, sessions }
    }

    /// Find the Chrome executable: configured override first, then known
    /// install locations, then `PATH`.
    pub fn find_chrome(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config.chrome_path {
            return Ok(path.clone());
        }

        for path in Self::CHROME_PATHS {
            if Path::new(path).exists() {
                debug!("Found Chrome at: {}", path);
                return Ok(PathBuf::from(path));
            }
        }

        for cmd in [
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(path) = which::which(cmd) {
                debug!("Found Chrome in PATH: {}", path.display());
                return Ok(path);
            }
        }

        Err(anyhow::anyhow!(
            "Chrome/Chromium not found. Install it or set CHROME_PATH:\n\
             - Arch/Manjaro: sudo pacman -S chromium\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium"
        ))
    }

    /// Run one full observation session and return everything recorded,
    /// including recordings made before a navigation error.
    async fn observe(&self, page_url: &str) -> Result<Vec<Candidate>> {
        let chrome = self.find_chrome()?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome)
            .window_size(1920, 1080)
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-gpu");
        if !self.config.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let captured: Arc<Mutex<Vec<Candidate>>> = Arc::new(Mutex::new(Vec::new()));

        // Navigation/interaction faults do not discard what the interceptor
        // already recorded; teardown happens in every path.
        if let Err(e) = self.session_inner(&browser, page_url, captured.clone()).await {
            warn!(page = page_url, "browser session error: {:#}", e);
        }

        let _ = browser.close().await;
        let _ = browser.wait().await;

        let recorded = captured.lock().expect("capture list poisoned").clone();
        Ok(recorded)
    }

    async fn session_inner(
        &self,
        browser: &Browser,
        page_url: &str,
        captured: Arc<Mutex<Vec<Candidate>>>,
    ) -> Result<()> {
        let page = browser.new_page("about:blank").await?;

        // Realistic identity before any navigation; matches the Fetcher.
        page.execute(SetUserAgentOverrideParams::new(
            BROWSER_USER_AGENT.to_string(),
        ))
        .await?;

        // Observe every outbound request the page issues. The listener never
        // blocks or alters traffic, it only records matching URLs.
        page.execute(EnableParams::builder().build()).await?;
        let mut requests = page.event_listener::<EventRequestWillBeSent>().await?;
        let recorder = {
            let captured = captured.clone();
            tokio::spawn(async move {
                while let Some(event) = requests.next().await {
                    record_request(&captured, &event.request.url);
                }
            })
        };

        info!("Loading page: {}", page_url);
        let nav_params = NavigateParams::builder()
            .url(page_url)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build navigation params: {}", e))?;
        let timeout = self.config.navigation_timeout;
        tokio::time::timeout(timeout, page.goto(nav_params))
            .await
            .map_err(|_| {
                anyhow::anyhow!("Navigation timed out after {:?} for {}", timeout, page_url)
            })?
            .with_context(|| format!("Navigation failed for {}", page_url))?;

        tokio::time::sleep(SETTLE_AFTER_LOAD).await;

        // Best-effort interaction heuristics, each independently ignorable.
        try_click(&page, PLAY_BUTTON_SELECTOR, "play button").await;
        try_click(&page, "video", "video element").await;

        recorder.abort();
        let _ = page.close().await;
        Ok(())
    }
}

/// Click the first element matching `selector`, then wait for any triggered
/// loads. Failures are silently ignored; many pages have no such element.
async fn try_click(page: &Page, selector: &str, what: &str) {
    match page.find_element(selector).await {
        Ok(element) => {
            debug!("Clicking {}", what);
            if let Err(e) = element.click().await {
                debug!("Click on {} failed: {}", what, e);
            }
            tokio::time::sleep(SETTLE_AFTER_CLICK).await;
        }
        Err(_) => debug!("No {} found", what),
    }
}

/// Record a network request URL if it looks like a stream.
fn record_request(captured: &Mutex<Vec<Candidate>>, url: &str) {
    match StreamKind::classify(url) {
        Some(kind) => {
            debug!(kind = %kind, "Stream request detected: {}", url);
            captured
                .lock()
                .expect("capture list poisoned")
                .push(Candidate::new(kind, url.to_string()));
        }
        None if url.contains(".ts") => {
            // Segment traffic proves a player is running but is not itself
            // a playable entry point.
            debug!("Segment request observed: {}", url);
        }
        None => {}
    }
}

#[async_trait]
impl Locator for BrowserLocator {
    async fn locate(&self, page_url: &str) -> anyhow::Result<Option<Candidate>> {
        let _permit = self
            .sessions
            .acquire()
            .await
            .context("browser session semaphore closed")?;

        // Priority resolution happens over the whole session's recordings,
        // not the first match.
        match self.observe(page_url).await {
            Ok(recorded) => {
                let best = select_best(&recorded).cloned();
                match &best {
                    Some(candidate) => {
                        info!(kind = %candidate.kind, "Located stream: {}", candidate.url)
                    }
                    None => info!(page = page_url, "No stream traffic observed"),
                }
                Ok(best)
            }
            Err(e) => {
                warn!(page = page_url, "browser locate failed: {:#}", e);
                Ok(None)
            }
        }
    }
}
