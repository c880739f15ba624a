//! vidrelay - video stream locator and streaming proxy.
//!
//! Finds the playable stream (HLS, MP4, or DASH) behind an arbitrary web
//! page and re-serves it through a same-origin proxy so browser clients can
//! play it without CORS or referrer restrictions.

mod cli;
mod config;
mod fetcher;
mod locator;
mod models;
mod rewrite;
mod server;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "vidrelay=debug"
    } else {
        "vidrelay=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
