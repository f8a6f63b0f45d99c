//! Client for the external highlighting backend
//!
//! The backend accepts the same multipart body the browser sends and
//! answers with PDF bytes or an error status. The body is forwarded
//! untouched, boundary and all, so the original `Content-Type` header
//! travels with it.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderName, HeaderValue};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info};

use crate::config::ProxyConfig;
use crate::error::ProxyError;

#[derive(Debug, thiserror::Error)]
pub enum BackendSetupError {
    #[error("Invalid bypass header name '{0}'")]
    InvalidHeaderName(String),

    #[error("Bypass secret is not a valid header value")]
    InvalidSecret,

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct HighlightBackend {
    client: reqwest::Client,
    endpoint: String,
    bypass: Option<(HeaderName, HeaderValue)>,
    timeout: Duration,
}

impl HighlightBackend {
    pub fn new(config: &ProxyConfig) -> Result<Self, BackendSetupError> {
        let bypass = match &config.bypass_secret {
            Some(secret) => {
                let name = HeaderName::from_bytes(config.bypass_header.as_bytes()).map_err(|_| {
                    BackendSetupError::InvalidHeaderName(config.bypass_header.clone())
                })?;
                let mut value =
                    HeaderValue::from_str(secret).map_err(|_| BackendSetupError::InvalidSecret)?;
                value.set_sensitive(true);
                Some((name, value))
            }
            None => None,
        };

        let client = reqwest::Client::builder()
            .timeout(config.backend_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.backend_endpoint(),
            bypass,
            timeout: config.backend_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the multipart body to the backend and return the highlighted PDF.
    pub async fn highlight(
        &self,
        content_type: HeaderValue,
        body: Bytes,
    ) -> Result<Bytes, ProxyError> {
        info!("Forwarding {} bytes to {}", body.len(), self.endpoint);

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, content_type)
            .body(body);
        if let Some((name, value)) = &self.bypass {
            request = request.header(name.clone(), value.clone());
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        debug!("Highlighting backend responded with {}", status);

        if !status.is_success() {
            let body = response.text().await.map_err(|e| self.transport_error(e))?;
            return Err(ProxyError::Backend { status, body });
        }

        response.bytes().await.map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, err: reqwest::Error) -> ProxyError {
        if err.is_timeout() {
            ProxyError::Timeout(self.timeout)
        } else {
            ProxyError::Transport(err.to_string())
        }
    }
}
