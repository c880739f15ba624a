//! Core data types: stream kinds and located candidates.

use serde::{Deserialize, Serialize};

/// Kind of playable stream, classified by file extension.
///
/// Preference order is fixed: HLS beats MP4 beats DASH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Hls,
    Mp4,
    Dash,
}

impl StreamKind {
    /// All kinds in preference order, highest first.
    pub const PRIORITY: [StreamKind; 3] = [StreamKind::Hls, StreamKind::Mp4, StreamKind::Dash];

    /// Classify a URL by extension substring. Non-stream URLs return None.
    pub fn classify(url: &str) -> Option<Self> {
        if url.contains(".m3u8") {
            Some(StreamKind::Hls)
        } else if url.contains(".mp4") {
            Some(StreamKind::Mp4)
        } else if url.contains(".mpd") {
            Some(StreamKind::Dash)
        } else {
            None
        }
    }

    /// Content type served when the upstream omits one.
    pub fn default_content_type(self) -> &'static str {
        match self {
            StreamKind::Hls => "application/vnd.apple.mpegurl",
            StreamKind::Mp4 => "video/mp4",
            StreamKind::Dash => "application/dash+xml",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::Hls => write!(f, "hls"),
            StreamKind::Mp4 => write!(f, "mp4"),
            StreamKind::Dash => write!(f, "dash"),
        }
    }
}

/// A discovered (kind, absolute URL) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub kind: StreamKind,
    pub url: String,
}

impl Candidate {
    pub fn new(kind: StreamKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
        }
    }
}

/// Pick the winning candidate: highest-priority kind, first discovered
/// within that kind.
pub fn select_best(candidates: &[Candidate]) -> Option<&Candidate> {
    for kind in StreamKind::PRIORITY {
        if let Some(candidate) = candidates.iter().find(|c| c.kind == kind) {
            return Some(candidate);
        }
    }
    None
}
