//! Request handlers: extraction orchestration, direct relay routes, and
//! control endpoints.

use axum::extract::{Query, State};
use axum::http::header::{HeaderMap, HOST};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{debug, info};

use crate::models::StreamKind;

use super::error::{ApiError, ApiResult};
use super::relay;
use super::templates;
use super::AppState;

/// Query parameters for the media routes. `url` is optional here so the
/// handler owns the 400 response shape instead of axum's default rejection.
#[derive(Debug, Deserialize)]
pub struct UrlParams {
    pub url: Option<String>,
}

/// Proxy base for rewritten manifests, derived from the inbound Host header
/// so segment links resolve back to whatever address the client used.
fn proxy_base(headers: &HeaderMap, state: &AppState) -> String {
    headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(|host| format!("http://{}", host))
        .unwrap_or_else(|| state.public_base.clone())
}

/// `/extract` — resolve a page URL to its stream and relay it.
///
/// The cache is consulted first; a miss invokes the configured locator and a
/// successful resolution is cached. Failed lookups are never cached, so a
/// retry always re-runs the locator.
pub async fn extract(
    State(state): State<AppState>,
    Query(params): Query<UrlParams>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let page_url = params.url.ok_or_else(ApiError::missing_url)?;

    let candidate = match state.cache.get(&page_url) {
        Some(hit) => {
            debug!(page = %page_url, "using cached stream");
            hit
        }
        None => {
            info!(page = %page_url, "locating stream");
            let located = state
                .locator
                .locate(&page_url)
                .await
                .map_err(ApiError::upstream)?;
            match located {
                Some(candidate) => {
                    state.cache.put(&page_url, candidate.clone());
                    candidate
                }
                None => return Err(ApiError::no_video_found()),
            }
        }
    };

    info!(kind = %candidate.kind, "relaying {}", candidate.url);
    match candidate.kind {
        StreamKind::Hls => {
            let base = proxy_base(&headers, &state);
            relay::relay_hls(&state.fetcher, &candidate.url, &base).await
        }
        StreamKind::Mp4 => relay::relay_mp4(&state.fetcher, &candidate.url, &headers).await,
        StreamKind::Dash => relay::relay_mpd(&state.fetcher, &candidate.url).await,
    }
}

/// `/hls` — rewrite and relay a known manifest URL.
pub async fn hls(
    State(state): State<AppState>,
    Query(params): Query<UrlParams>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let url = params.url.ok_or_else(ApiError::missing_url)?;
    let base = proxy_base(&headers, &state);
    relay::relay_hls(&state.fetcher, &url, &base).await
}

/// `/mp4` — relay a known MP4 URL, honoring inbound Range.
pub async fn mp4(
    State(state): State<AppState>,
    Query(params): Query<UrlParams>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let url = params.url.ok_or_else(ApiError::missing_url)?;
    relay::relay_mp4(&state.fetcher, &url, &headers).await
}

/// `/segment` — streamed pass-through for media segments.
pub async fn segment(
    State(state): State<AppState>,
    Query(params): Query<UrlParams>,
) -> ApiResult<Response> {
    let url = params.url.ok_or_else(ApiError::missing_url)?;
    relay::relay_segment(&state.fetcher, &url).await
}

/// `/mpd` — streamed pass-through for DASH manifests.
pub async fn mpd(
    State(state): State<AppState>,
    Query(params): Query<UrlParams>,
) -> ApiResult<Response> {
    let url = params.url.ok_or_else(ApiError::missing_url)?;
    relay::relay_mpd(&state.fetcher, &url).await
}

/// `/clear-cache` — drop every cached resolution.
pub async fn clear_cache(State(state): State<AppState>) -> impl IntoResponse {
    state.cache.clear();
    info!("locator cache cleared");
    Json(serde_json::json!({
        "success": true,
        "message": "Cache cleared"
    }))
}

/// `/` — endpoint overview.
pub async fn home() -> Html<&'static str> {
    Html(templates::HOME_PAGE)
}

/// `/test` — interactive hls.js player page.
pub async fn test_page(Query(params): Query<UrlParams>) -> Html<String> {
    Html(templates::test_page(params.url.as_deref().unwrap_or("")))
}
