//! Error taxonomy shared across the API surface.
//!
//! Component-local problems (a malformed upstream item, a missing store file)
//! are absorbed value-wise and never reach this module. Whole-call failures
//! propagate as exactly one of these variants and render as a JSON envelope
//! `{"error": <message>}` with a 4xx/5xx status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required credential or provider entry is missing. Not retried.
    #[error("{0}")]
    Configuration(String),

    /// Network-level failure reaching an upstream (connect, timeout).
    #[error("{0}")]
    UpstreamTransport(String),

    /// Upstream was reached but answered non-2xx; its message is passed through.
    #[error("{0}")]
    UpstreamProtocol(String),

    /// Whole-search failure. No partial result set accompanies this.
    #[error("데이터 수집 실패: {0}")]
    SearchFailed(String),

    /// Every model in the fallback sequence failed, or the sequence aborted.
    #[error("AI 초안 생성 실패: {0}")]
    DraftGenerationFailed(String),

    /// Publishing to the blog platform failed.
    #[error("티스토리 게시 실패: {0}")]
    Publish(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Configuration(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(status = %status, error = %self, "request failed");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
