//! Error taxonomy and the JSON error body shared by server and client

use serde::{Deserialize, Serialize};

/// Response header carrying the [`ErrorKind`] of a failed request
pub const ERROR_KIND_HEADER: &str = "x-error-kind";

/// Broad class of a failed upload, used to decide whether a retry makes sense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Rejected input: missing file, wrong type, oversized, no platform
    Validation,
    /// The highlighting backend answered with a non-success status
    Backend,
    /// Network failure, timeout, or an unreadable response
    Transport,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Backend => "backend",
            ErrorKind::Transport => "transport",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim() {
            "validation" => Some(ErrorKind::Validation),
            "backend" => Some(ErrorKind::Backend),
            "transport" => Some(ErrorKind::Transport),
            _ => None,
        }
    }

    /// Best guess when the response carries no [`ERROR_KIND_HEADER`]
    pub fn from_status(status: u16) -> Self {
        match status {
            408 | 429 | 500 | 502 | 503 | 504 => ErrorKind::Transport,
            400..=499 => ErrorKind::Validation,
            _ => ErrorKind::Backend,
        }
    }

    /// Only transport failures are worth retrying unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Transport)
    }
}

/// `{"error": "<message>"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }

    /// Pull the `error` string out of an arbitrary response body.
    ///
    /// Returns `Err(())` when the body is not JSON at all and `Ok(None)`
    /// when it is JSON without a string `error` field.
    #[allow(clippy::result_unit_err)]
    pub fn extract(body: &str) -> Result<Option<String>, ()> {
        let value: serde_json::Value = serde_json::from_str(body).map_err(|_| ())?;
        Ok(value
            .get("error")
            .and_then(|e| e.as_str())
            .map(str::to_string))
    }
}
