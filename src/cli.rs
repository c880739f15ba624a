//! Command-line interface.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{Settings, DEFAULT_PORT};

#[derive(Parser)]
#[command(name = "vidrelay")]
#[command(about = "Video stream locator and manifest-rewriting streaming proxy")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Listen port
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Chrome/Chromium executable (overrides path discovery)
    #[arg(long, env = "CHROME_PATH")]
    chrome_path: Option<PathBuf>,

    /// Upstream fetch timeout in seconds (header phase)
    #[arg(long, env = "VIDRELAY_FETCH_TIMEOUT", default_value_t = 10)]
    fetch_timeout: u64,

    /// Browser navigation timeout in seconds
    #[arg(long, default_value_t = 30)]
    locate_timeout: u64,

    /// Maximum concurrent browser sessions
    #[arg(long, default_value_t = 2)]
    browser_sessions: usize,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Parse arguments and run the server.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        tracing::debug!("verbose logging enabled");
    }

    let settings = Settings {
        host: cli.host,
        port: cli.port,
        chrome_path: cli.chrome_path,
        fetch_timeout: Duration::from_secs(cli.fetch_timeout),
        locate_timeout: Duration::from_secs(cli.locate_timeout),
        browser_sessions: cli.browser_sessions,
    };

    crate::server::serve(&settings).await
}
