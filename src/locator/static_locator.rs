//! Static stream location: regex and DOM scanning of fetched HTML.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::fetcher::Fetcher;
use crate::models::{select_best, Candidate, StreamKind};

use super::Locator;

static HLS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s"'<>\\]+\.m3u8[^\s"'<>\\]*"#).expect("hls pattern compiles")
});
static MP4_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s"'<>\\]+\.mp4[^\s"'<>\\]*"#).expect("mp4 pattern compiles")
});
static MPD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s"'<>\\]+\.mpd[^\s"'<>\\]*"#).expect("mpd pattern compiles")
});

static MEDIA_ELEMENTS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("video, source, iframe, script").expect("media selector parses")
});

/// Attributes inspected on media-bearing elements.
const URL_ATTRIBUTES: [&str; 5] = ["src", "data-src", "data-url", "data-video", "data-stream"];

/// Scan HTML for stream URLs: regex over the raw markup and inline script
/// bodies, plus DOM attribute inspection on video/source/iframe/script
/// elements. Relative attribute values resolve against `page_url`.
///
/// Malformed HTML never fails; the parse is best-effort and no match yields
/// an empty set. Results are deduplicated by exact URL within a kind,
/// preserving discovery order.
pub fn locate_static(html: &str, page_url: &str) -> Vec<Candidate> {
    let mut seen: HashSet<(StreamKind, String)> = HashSet::new();
    let mut candidates = Vec::new();
    let mut add = |kind: StreamKind, url: String| {
        if seen.insert((kind, url.clone())) {
            candidates.push(Candidate::new(kind, url));
        }
    };

    for (kind, pattern) in [
        (StreamKind::Hls, &*HLS_RE),
        (StreamKind::Mp4, &*MP4_RE),
        (StreamKind::Dash, &*MPD_RE),
    ] {
        for found in pattern.find_iter(html) {
            add(kind, found.as_str().to_string());
        }
    }

    let base = Url::parse(page_url).ok();
    let document = Html::parse_document(html);
    for element in document.select(&MEDIA_ELEMENTS) {
        // Inline script bodies get the same pattern scan as the raw markup.
        if element.value().name() == "script" {
            let body: String = element.text().collect();
            for (kind, pattern) in [
                (StreamKind::Hls, &*HLS_RE),
                (StreamKind::Mp4, &*MP4_RE),
                (StreamKind::Dash, &*MPD_RE),
            ] {
                for found in pattern.find_iter(&body) {
                    add(kind, found.as_str().to_string());
                }
            }
        }

        for attribute in URL_ATTRIBUTES {
            let Some(value) = element.value().attr(attribute) else {
                continue;
            };
            let Some(resolved) = resolve(base.as_ref(), value) else {
                continue;
            };
            if let Some(kind) = StreamKind::classify(&resolved) {
                add(kind, resolved);
            }
        }
    }

    candidates
}

fn resolve(base: Option<&Url>, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.starts_with("http://") || value.starts_with("https://") {
        return Some(value.to_string());
    }
    base?.join(value).ok().map(|u| u.to_string())
}

/// Locator backed by a plain page fetch and static scanning. The fallback
/// when the crate is built without the `browser` feature.
pub struct StaticLocator {
    fetcher: Arc<Fetcher>,
}

impl StaticLocator {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Locator for StaticLocator {
    async fn locate(&self, page_url: &str) -> anyhow::Result<Option<Candidate>> {
        let response = self.fetcher.get(page_url).await?;
        let html = response.text().await?;

        let candidates = locate_static(&html, page_url);
        debug!(
            page = page_url,
            found = candidates.len(),
            "static scan complete"
        );
        Ok(select_best(&candidates).cloned())
    }
}
