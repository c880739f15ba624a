//! HTTP error responses.
//!
//! Every handler failure becomes a structured JSON body of the shape
//! `{"error": string, "message"?: string}` with a non-200 status. Raw errors
//! never cross the HTTP boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::fetcher::FetchError;

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error type convertible to an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub message: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// 400 for a request missing its `url` query parameter.
    pub fn missing_url() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "URL parameter required")
    }

    /// 404 when no locator produced a candidate. Distinct from upstream
    /// failures so callers can tell "no video" from "fetch broke".
    pub fn no_video_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "No video found")
            .with_message("No video stream was detected on this page")
    }

    /// 500 with the underlying error surfaced; acceptable for a diagnostic
    /// proxy.
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Upstream fetch failed")
            .with_message(err.to_string())
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        Self::upstream(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
