//! Runtime configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 10000;

/// Process-wide settings, assembled from CLI flags and environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Bind address.
    pub host: String,

    /// Listen port.
    pub port: u16,

    /// Chrome/Chromium executable override for the browser locator.
    pub chrome_path: Option<PathBuf>,

    /// Upstream fetch timeout (header phase).
    pub fetch_timeout: Duration,

    /// Browser navigation timeout. Settle and interaction waits are
    /// additive on top of this.
    pub locate_timeout: Duration,

    /// Cap on concurrent browser sessions.
    pub browser_sessions: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            chrome_path: None,
            fetch_timeout: Duration::from_secs(10),
            locate_timeout: Duration::from_secs(30),
            browser_sessions: 2,
        }
    }
}
