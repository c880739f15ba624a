//! HLS manifest rewriting.
//!
//! Every non-comment, non-blank line of a playlist is a reference to a
//! sub-resource (segment or variant stream). Each reference is resolved to an
//! absolute URL and replaced with a proxy-relative segment link so playback
//! routes back through this server. Directive lines and line order are
//! preserved exactly.

use url::Url;

/// Rewrite a playlist so every reference line routes through
/// `{proxy_base}/segment?url=...`.
///
/// The query string is deliberately left unescaped; this is the exact wire
/// format the client-side player receives. Master playlists are not treated
/// specially: variant-stream lines become segment links like any other
/// reference.
pub fn rewrite(playlist: &str, manifest_url: &str, proxy_base: &str) -> String {
    let base = Url::parse(manifest_url).ok();

    let lines: Vec<String> = playlist
        .split('\n')
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return line.to_string();
            }
            let absolute = resolve(base.as_ref(), trimmed);
            format!("{}/segment?url={}", proxy_base, absolute)
        })
        .collect();

    lines.join("\n")
}

/// Resolve a reference against the manifest URL. `Url::join` handles both
/// relative names (resolved against the manifest's directory) and already
/// absolute references (returned unchanged). Unresolvable references pass
/// through as written.
fn resolve(base: Option<&Url>, reference: &str) -> String {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        return reference.to_string();
    }
    match base.and_then(|b| b.join(reference).ok()) {
        Some(url) => url.to_string(),
        None => reference.to_string(),
    }
}
