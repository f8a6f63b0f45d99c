//! Proxy configuration resolved once at startup

use std::time::Duration;

/// `Content-Disposition` sent with every highlighted PDF
pub const DOWNLOAD_DISPOSITION: &str = "attachment; filename=\"highlighted.pdf\"";

/// Everything the proxy handler needs to reach the highlighting backend
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Base URL of the highlighting backend, e.g. `https://highlighter.internal`
    pub backend_url: String,
    /// Path appended to `backend_url`
    pub backend_path: String,
    /// Optional secret sent in `bypass_header` on every forwarded request
    pub bypass_secret: Option<String>,
    pub bypass_header: String,
    /// Upper bound on the whole backend round trip
    pub backend_timeout: Duration,
    /// Upper bound on the buffered multipart body, framing included
    pub max_body_bytes: usize,
    /// Also require the `%PDF-` header, not just the declared type
    pub require_pdf_signature: bool,
}

impl ProxyConfig {
    pub const DEFAULT_BACKEND_PATH: &'static str = "/highlight";
    pub const DEFAULT_BYPASS_HEADER: &'static str = "x-vercel-protection-bypass";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
    pub const DEFAULT_MAX_BODY_BYTES: usize = 12 * 1024 * 1024;

    /// Config with defaults for everything but the backend location
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            backend_path: Self::DEFAULT_BACKEND_PATH.to_string(),
            bypass_secret: None,
            bypass_header: Self::DEFAULT_BYPASS_HEADER.to_string(),
            backend_timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            max_body_bytes: Self::DEFAULT_MAX_BODY_BYTES,
            require_pdf_signature: false,
        }
    }

    /// Full URL of the backend's highlight endpoint
    pub fn backend_endpoint(&self) -> String {
        let base = self.backend_url.trim_end_matches('/');
        let path = self.backend_path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }
}
