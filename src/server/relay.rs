//! Streaming relay: forwards upstream media to the client.
//!
//! Bodies are emitted as chunked streams, never buffered whole, so one
//! in-flight chunk bounds memory per transfer. Dropping the response stream
//! on client disconnect drops the upstream transfer with it.

use axum::body::Body;
use axum::http::header::{
    HeaderMap, HeaderValue, ACCEPT_RANGES, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_RANGE,
    CONTENT_TYPE, RANGE,
};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::TryStreamExt;
use tracing::debug;

use crate::fetcher::Fetcher;
use crate::models::StreamKind;
use crate::rewrite::rewrite;

use super::error::{ApiError, ApiResult};

/// Fetch an HLS manifest, rewrite its references through the proxy, and
/// return it as a playlist. Resources that turn out not to be playlists
/// (content-type/extension mismatch) fall through to raw byte streaming.
pub async fn relay_hls(fetcher: &Fetcher, url: &str, proxy_base: &str) -> ApiResult<Response> {
    let response = fetcher.get(url).await?;

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if url.contains(".m3u8") || content_type.contains("mpegurl") {
        let playlist = response.text().await.map_err(ApiError::upstream)?;
        let rewritten = rewrite(&playlist, url, proxy_base);
        debug!(
            manifest = url,
            bytes = rewritten.len(),
            "rewrote playlist"
        );

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(StreamKind::Hls.default_content_type()),
        );
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        );
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));

        return Ok((StatusCode::OK, headers, rewritten).into_response());
    }

    // Not actually a playlist; stream it through untouched.
    Ok(stream_response(response, "application/octet-stream"))
}

/// Stream an MP4, honoring seek: the inbound `Range` header is forwarded
/// verbatim upstream and the upstream's status (206 included) and
/// range-related headers are relayed back. Headers the upstream did not
/// supply are never fabricated.
pub async fn relay_mp4(fetcher: &Fetcher, url: &str, inbound: &HeaderMap) -> ApiResult<Response> {
    let range = inbound.get(RANGE).and_then(|v| v.to_str().ok());
    let response = fetcher.get_with_range(url, range).await?;

    let status = relay_status(&response);
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        upstream_content_type(&response, StreamKind::Mp4.default_content_type()),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    for name in [CONTENT_LENGTH, CONTENT_RANGE, ACCEPT_RANGES] {
        if let Some(value) = response.headers().get(name.as_str()) {
            if let Ok(value) = HeaderValue::from_bytes(value.as_bytes()) {
                headers.insert(name, value);
            }
        }
    }

    Ok((status, headers, stream_body(response)).into_response())
}

/// Plain streamed pass-through for media segments.
pub async fn relay_segment(fetcher: &Fetcher, url: &str) -> ApiResult<Response> {
    let response = fetcher.get(url).await?;
    Ok(stream_response(response, "video/mp2t"))
}

/// Plain streamed pass-through for DASH manifests.
pub async fn relay_mpd(fetcher: &Fetcher, url: &str) -> ApiResult<Response> {
    let response = fetcher.get(url).await?;
    Ok(stream_response(response, StreamKind::Dash.default_content_type()))
}

/// Pass-through response: upstream status and content type (with fallback),
/// permissive CORS, chunk-streamed body.
fn stream_response(response: reqwest::Response, default_content_type: &'static str) -> Response {
    let status = relay_status(&response);
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        upstream_content_type(&response, default_content_type),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

    (status, headers, stream_body(response)).into_response()
}

fn stream_body(response: reqwest::Response) -> Body {
    Body::from_stream(response.bytes_stream().map_err(std::io::Error::other))
}

fn relay_status(response: &reqwest::Response) -> StatusCode {
    StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::OK)
}

fn upstream_content_type(response: &reqwest::Response, fallback: &'static str) -> HeaderValue {
    response
        .headers()
        .get(CONTENT_TYPE.as_str())
        .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok())
        .unwrap_or_else(|| HeaderValue::from_static(fallback))
}
