//! Error types for the highlight proxy

use std::time::Duration;

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use highlight_core::{ErrorBody, ErrorKind, UploadRejection, ERROR_KIND_HEADER};
use thiserror::Error;
use tower_governor::GovernorError;

/// Everything that can go wrong while proxying one upload.
///
/// Every variant renders as `{"error": "..."}`.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("{0}")]
    Rejected(#[from] UploadRejection),

    #[error("Processing failed: {body}")]
    Backend { status: StatusCode, body: String },

    #[error("Processing failed: highlighting backend did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Processing failed: {0}")]
    Transport(String),

    /// Per-IP limit hit; carries the suggested wait in seconds
    #[error("Too many requests. Please try again in {0}s.")]
    RateLimited(u64),
}

impl From<GovernorError> for ProxyError {
    fn from(err: GovernorError) -> Self {
        match err {
            GovernorError::TooManyRequests { wait_time, .. } => {
                ProxyError::RateLimited(wait_time.max(1))
            }
            other => ProxyError::Transport(other.to_string()),
        }
    }
}

impl ProxyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProxyError::Rejected(_) => ErrorKind::Validation,
            ProxyError::Backend { .. } => ErrorKind::Backend,
            ProxyError::Timeout(_) | ProxyError::Transport(_) | ProxyError::RateLimited(_) => {
                ErrorKind::Transport
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Rejected(_) => StatusCode::BAD_REQUEST,
            ProxyError::Backend { status, .. } => *status,
            ProxyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        match &self {
            ProxyError::Rejected(reason) => tracing::info!("Upload rejected: {}", reason),
            ProxyError::Backend { status, body } => {
                tracing::error!("Highlighting backend error: {} {}", status, body)
            }
            ProxyError::RateLimited(wait) => tracing::warn!("Rate limited for {}s", wait),
            other => tracing::error!("Proxy failure: {}", other),
        }

        let mut response = (status, Json(ErrorBody::new(self.to_string()))).into_response();
        response.headers_mut().insert(
            ERROR_KIND_HEADER,
            HeaderValue::from_static(kind.as_str()),
        );
        if let ProxyError::RateLimited(wait) = self {
            response.headers_mut().insert(RETRY_AFTER, HeaderValue::from(wait));
        }
        response
    }
}
