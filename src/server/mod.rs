//! HTTP proxy server.
//!
//! Exposes the extraction orchestrator (`/extract`), the direct relay routes
//! (`/hls`, `/mp4`, `/segment`, `/mpd`), the cache-clear operator action, and
//! two demo pages.

mod error;
mod handlers;
mod relay;
mod routes;
mod templates;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::fetcher::Fetcher;
use crate::locator::{Locator, LocatorCache};

/// Shared state for the proxy server.
///
/// The cache is the only persistent shared mutable state; every request
/// reads and writes it through its own methods.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<Fetcher>,
    pub cache: Arc<LocatorCache>,
    pub locator: Arc<dyn Locator>,
    /// Fallback proxy base when the inbound request carries no Host header.
    pub public_base: String,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        let fetcher = Arc::new(Fetcher::new(settings.fetch_timeout));
        let locator = build_locator(settings, fetcher.clone());

        Self {
            fetcher,
            cache: Arc::new(LocatorCache::new()),
            locator,
            public_base: format!("http://{}:{}", settings.host, settings.port),
        }
    }
}

#[cfg(feature = "browser")]
fn build_locator(settings: &Settings, _fetcher: Arc<Fetcher>) -> Arc<dyn Locator> {
    use crate::locator::{BrowserLocator, BrowserLocatorConfig};

    let locator = BrowserLocator::new(BrowserLocatorConfig {
        chrome_path: settings.chrome_path.clone(),
        headless: true,
        navigation_timeout: settings.locate_timeout,
        max_sessions: settings.browser_sessions,
    });

    // Surface missing-Chrome problems at startup instead of on first request.
    match locator.find_chrome() {
        Ok(path) => tracing::info!("Browser locator using Chrome at {}", path.display()),
        Err(e) => tracing::warn!("Chrome not found, /extract will fail: {}", e),
    }

    Arc::new(locator)
}

#[cfg(not(feature = "browser"))]
fn build_locator(_settings: &Settings, fetcher: Arc<Fetcher>) -> Arc<dyn Locator> {
    use crate::locator::StaticLocator;

    tracing::info!("Browser support not compiled, using static locator");
    Arc::new(StaticLocator::new(fetcher))
}

/// Start the proxy server.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let state = AppState::new(settings);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    tracing::info!("Starting vidrelay at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::{to_bytes, Body};
    use axum::http::{header, HeaderValue, Request, Response as HttpResponse, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use crate::locator::StaticLocator;
    use crate::models::{Candidate, StreamKind};

    /// Locator stub with a fixed answer and an invocation counter.
    struct StubLocator {
        candidate: Option<Candidate>,
        calls: AtomicUsize,
    }

    impl StubLocator {
        fn new(candidate: Option<Candidate>) -> Arc<Self> {
            Arc::new(Self {
                candidate,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl Locator for StubLocator {
        async fn locate(&self, _page_url: &str) -> anyhow::Result<Option<Candidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.candidate.clone())
        }
    }

    fn test_state(locator: Arc<dyn Locator>) -> AppState {
        AppState {
            fetcher: Arc::new(Fetcher::default()),
            cache: Arc::new(LocatorCache::new()),
            locator,
            public_base: "http://127.0.0.1:10000".to_string(),
        }
    }

    /// Serve a router on an ephemeral local port, returning its base URL.
    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn missing_url_parameter_returns_400() {
        let app = create_router(test_state(StubLocator::new(None)));

        for route in ["/extract", "/hls", "/mp4", "/segment", "/mpd"] {
            let response = app
                .clone()
                .oneshot(Request::get(route).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{route}");

            let body = body_json(response).await;
            assert_eq!(body["error"], "URL parameter required", "{route}");
        }
    }

    #[tokio::test]
    async fn extract_returns_404_when_nothing_located() {
        let app = create_router(test_state(StubLocator::new(None)));

        let response = app
            .oneshot(
                Request::get("/extract?url=https://site.example/page")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "No video found");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn warm_cache_skips_locator_reinvocation() {
        let upstream = spawn_upstream(Router::new().route(
            "/index.m3u8",
            get(|| async { "#EXTM3U\n#EXTINF:4.0,\nseg.ts\n" }),
        ))
        .await;

        let stub = StubLocator::new(Some(Candidate::new(
            StreamKind::Hls,
            format!("{upstream}/index.m3u8"),
        )));
        let app = create_router(test_state(stub.clone()));

        let mut bodies = Vec::new();
        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(
                    Request::get("/extract?url=https://site.example/show")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            bodies.push(body_string(response).await);
        }

        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
        assert_eq!(bodies[0], bodies[1]);
    }

    #[tokio::test]
    async fn rewritten_manifest_routes_segments_through_proxy() {
        let upstream = spawn_upstream(Router::new().route(
            "/live/index.m3u8",
            get(|| async { "#EXTM3U\n#EXT-X-TARGETDURATION:4\n#EXTINF:4.0,\nseg1.ts\n#EXTINF:4.0,\nseg2.ts\n" }),
        ))
        .await;

        let app = create_router(test_state(StubLocator::new(None)));
        let response = app
            .oneshot(
                Request::get(format!("/hls?url={upstream}/live/index.m3u8"))
                    .header(header::HOST, "proxy.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/vnd.apple.mpegurl"
        );
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );

        let body = body_string(response).await;
        let lines: Vec<&str> = body.split('\n').collect();
        assert_eq!(lines[0], "#EXTM3U");
        assert_eq!(
            lines[3],
            format!("http://proxy.test/segment?url={upstream}/live/seg1.ts")
        );
        assert_eq!(
            lines[5],
            format!("http://proxy.test/segment?url={upstream}/live/seg2.ts")
        );
    }

    #[tokio::test]
    async fn non_playlist_hls_request_falls_through_to_raw_bytes() {
        let upstream = spawn_upstream(Router::new().route(
            "/file.bin",
            get(|| async {
                ([(header::CONTENT_TYPE, "application/x-thing")], "raw-bytes")
            }),
        ))
        .await;

        let app = create_router(test_state(StubLocator::new(None)));
        let response = app
            .oneshot(
                Request::get(format!("/hls?url={upstream}/file.bin"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/x-thing"
        );
        assert_eq!(body_string(response).await, "raw-bytes");
    }

    #[tokio::test]
    async fn range_header_passes_through_and_upstream_range_relays_back() {
        let upstream = spawn_upstream(Router::new().route(
            "/clip.mp4",
            get(|request: Request<Body>| async move {
                // 206 only when the exact forwarded header arrives, so the
                // assertion below proves verbatim pass-through.
                match request.headers().get(header::RANGE) {
                    Some(range) if range == &HeaderValue::from_static("bytes=100-199") => {
                        HttpResponse::builder()
                            .status(StatusCode::PARTIAL_CONTENT)
                            .header(header::CONTENT_TYPE, "video/mp4")
                            .header(header::CONTENT_RANGE, "bytes 100-199/1000")
                            .header(header::ACCEPT_RANGES, "bytes")
                            .body(Body::from(vec![0u8; 100]))
                            .unwrap()
                    }
                    Some(_) => HttpResponse::builder()
                        .status(StatusCode::RANGE_NOT_SATISFIABLE)
                        .body(Body::empty())
                        .unwrap(),
                    None => HttpResponse::builder()
                        .header(header::CONTENT_TYPE, "video/mp4")
                        .body(Body::from(vec![0u8; 1000]))
                        .unwrap(),
                }
            }),
        ))
        .await;

        let app = create_router(test_state(StubLocator::new(None)));

        let response = app
            .clone()
            .oneshot(
                Request::get(format!("/mp4?url={upstream}/clip.mp4"))
                    .header(header::RANGE, "bytes=100-199")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            response.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes 100-199/1000"
        );
        assert_eq!(response.headers().get(header::ACCEPT_RANGES).unwrap(), "bytes");

        // Without an inbound Range, none goes upstream and no range headers
        // are fabricated on the way back.
        let response = app
            .oneshot(
                Request::get(format!("/mp4?url={upstream}/clip.mp4"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_RANGE).is_none());
        assert!(response.headers().get(header::ACCEPT_RANGES).is_none());
    }

    #[tokio::test]
    async fn segment_defaults_content_type_when_upstream_omits_it() {
        let upstream = spawn_upstream(Router::new().route(
            "/seg1.ts",
            get(|| async {
                HttpResponse::builder()
                    .body(Body::from(&b"tsbytes"[..]))
                    .unwrap()
            }),
        ))
        .await;

        let app = create_router(test_state(StubLocator::new(None)));
        let response = app
            .oneshot(
                Request::get(format!("/segment?url={upstream}/seg1.ts"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "video/mp2t"
        );
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
        assert_eq!(body_string(response).await, "tsbytes");
    }

    #[tokio::test]
    async fn upstream_error_is_a_structured_500_not_a_crash() {
        // Nothing listens on this port.
        let app = create_router(test_state(StubLocator::new(None)));
        let response = app
            .oneshot(
                Request::get("/segment?url=http://127.0.0.1:1/seg.ts")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Upstream fetch failed");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn clear_cache_empties_resolutions() {
        let state = test_state(StubLocator::new(None));
        state.cache.put(
            "https://site.example/page",
            Candidate::new(StreamKind::Hls, "https://cdn.example/i.m3u8"),
        );
        let cache = state.cache.clone();

        let app = create_router(state);
        let response = app
            .oneshot(Request::get("/clear-cache").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Cache cleared");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn end_to_end_static_extraction_yields_rewritten_playlist() {
        let upstream = spawn_upstream(
            Router::new()
                .route(
                    "/page",
                    get(|| async {
                        axum::response::Html(
                            r#"<html><body><video src="video.m3u8"></video></body></html>"#,
                        )
                    }),
                )
                .route(
                    "/video.m3u8",
                    get(|| async { "#EXTM3U\n#EXTINF:6.0,\nseg1.ts\n#EXT-X-ENDLIST" }),
                ),
        )
        .await;

        let fetcher = Arc::new(Fetcher::default());
        let state = AppState {
            fetcher: fetcher.clone(),
            cache: Arc::new(LocatorCache::new()),
            locator: Arc::new(StaticLocator::new(fetcher)),
            public_base: "http://127.0.0.1:10000".to_string(),
        };

        let app = create_router(state);
        let response = app
            .oneshot(
                Request::get(format!("/extract?url={upstream}/page"))
                    .header(header::HOST, "proxy.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        let lines: Vec<&str> = body.split('\n').collect();
        assert_eq!(
            lines[2],
            format!("http://proxy.test/segment?url={upstream}/seg1.ts")
        );
        assert_eq!(lines[3], "#EXT-X-ENDLIST");
    }

    #[tokio::test]
    async fn extraction_prefers_hls_when_page_offers_both() {
        let upstream = spawn_upstream(
            Router::new()
                .route(
                    "/page",
                    get(|| async {
                        axum::response::Html(
                            r#"<video src="movie.mp4"></video><script>var s = "best.m3u8";</script>
                               <source src="best.m3u8">"#,
                        )
                    }),
                )
                .route("/best.m3u8", get(|| async { "#EXTM3U\nseg.ts" })),
        )
        .await;

        let fetcher = Arc::new(Fetcher::default());
        let state = AppState {
            fetcher: fetcher.clone(),
            cache: Arc::new(LocatorCache::new()),
            locator: Arc::new(StaticLocator::new(fetcher)),
            public_base: "http://127.0.0.1:10000".to_string(),
        };

        let app = create_router(state);
        let response = app
            .oneshot(
                Request::get(format!("/extract?url={upstream}/page"))
                    .header(header::HOST, "proxy.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/vnd.apple.mpegurl"
        );
        assert!(body_string(response)
            .await
            .contains(&format!("/segment?url={upstream}/seg.ts")));
    }
}
