//! HTML pages for the root help endpoint and the player test page.

/// Escape HTML special characters for safe attribute interpolation.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Root endpoint overview.
pub const HOME_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>vidrelay</title>
    <style>
        body { font-family: Arial, sans-serif; max-width: 800px; margin: 50px auto; padding: 20px; }
        h1 { color: #333; }
        .endpoint { background: #f4f4f4; padding: 15px; border-radius: 5px; margin: 20px 0; }
        code { background: #e8e8e8; padding: 2px 6px; border-radius: 3px; }
        .warning { background: #fff3cd; border-left: 4px solid #ffc107; padding: 10px; margin: 15px 0; }
    </style>
</head>
<body>
    <h1>vidrelay</h1>
    <p>Locates the video stream behind a web page and re-serves it through a same-origin proxy.</p>

    <div class="warning">
        Browser-based extraction takes 10-15 seconds per uncached page.
    </div>

    <div class="endpoint">
        <h3>Endpoints</h3>
        <p><strong>Auto-extraction:</strong><br>
        <code>GET /extract?url=PAGE_URL</code><br>
        <small>Loads the page, runs its scripts, observes the network for stream URLs.</small></p>

        <p><strong>Direct HLS relay:</strong><br>
        <code>GET /hls?url=M3U8_URL</code></p>

        <p><strong>Direct MP4 relay (seek supported):</strong><br>
        <code>GET /mp4?url=MP4_URL</code></p>

        <p><strong>Clear the resolution cache:</strong><br>
        <code>GET /clear-cache</code></p>
    </div>

    <div class="endpoint">
        <h3>Usage</h3>
        <p><code>&lt;video controls src="/extract?url=https://site.example/video-page"&gt;&lt;/video&gt;</code></p>
    </div>

    <p><a href="/test">Interactive test page</a></p>
</body>
</html>
"#;

const TEST_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>vidrelay test</title>
    <script src="https://cdn.jsdelivr.net/npm/hls.js@latest"></script>
    <style>
        body { font-family: Arial, sans-serif; max-width: 900px; margin: 50px auto; padding: 20px; }
        video { width: 100%; max-width: 800px; background: #000; }
        input { width: 70%; padding: 10px; margin: 10px 0; }
        button { padding: 10px 20px; background: #007bff; color: white; border: none; cursor: pointer; }
        #status { margin: 20px 0; padding: 10px; border-radius: 5px; }
        .loading { background: #fff3cd; color: #856404; }
        .success { background: #d4edda; color: #155724; }
        .error { background: #f8d7da; color: #721c24; }
    </style>
</head>
<body>
    <h1>vidrelay test</h1>

    <input type="text" id="urlInput" placeholder="Video page URL" value="__PREFILL__">
    <button onclick="loadVideo()">Extract and play</button>

    <div id="status"></div>

    <video id="videoPlayer" controls></video>

    <script>
        function setStatus(message, type) {
            const status = document.getElementById('status');
            status.textContent = message;
            status.className = type;
        }

        function loadVideo() {
            const url = document.getElementById('urlInput').value;
            const video = document.getElementById('videoPlayer');

            if (!url) {
                setStatus('Enter a URL first', 'error');
                return;
            }

            setStatus('Loading page in the browser backend (10-15 seconds)...', 'loading');

            const proxyUrl = '/extract?url=' + encodeURIComponent(url);

            if (Hls.isSupported()) {
                const hls = new Hls({ enableWorker: true });
                hls.loadSource(proxyUrl);
                hls.attachMedia(video);
                hls.on(Hls.Events.MANIFEST_PARSED, function() {
                    setStatus('Playing (HLS)', 'success');
                    video.play();
                });
                hls.on(Hls.Events.ERROR, function(event, data) {
                    if (data.fatal) {
                        setStatus('Error: ' + data.type + ' - ' + data.details, 'error');
                    }
                });
            } else if (video.canPlayType('application/vnd.apple.mpegurl')) {
                video.src = proxyUrl;
                video.addEventListener('loadedmetadata', function() {
                    setStatus('Playing (native HLS)', 'success');
                    video.play();
                });
            } else {
                video.src = proxyUrl;
                video.addEventListener('loadedmetadata', function() {
                    setStatus('Playing (MP4)', 'success');
                    video.play();
                });
            }
        }

        if (document.getElementById('urlInput').value) {
            loadVideo();
        }
    </script>
</body>
</html>
"#;

/// Player test page, optionally pre-filled with a page URL.
pub fn test_page(prefill: &str) -> String {
    TEST_PAGE.replace("__PREFILL__", &html_escape(prefill))
}
