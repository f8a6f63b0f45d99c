//! Highlight Proxy Server
//!
//! Gateway between the dashboard and the highlighting backend that marks
//! "Adjustments and Credit" sections in legal invoices. Provides:
//!
//! - `POST /api/process-pdf` (and the legacy `POST /api/highlight`)
//! - `GET /health`
//!
//! ## Architecture
//!
//! Each upload is validated with the same rules the browser applies, then
//! forwarded byte-for-byte to the backend. The server keeps no state
//! between requests: uploads live in memory for one round trip and are
//! never written to disk.
//!
//! - Rate limiting via tower-governor
//! - Explicit backend timeout, surfaced as a retryable 504
//! - Authentication (future)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderName,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use clap::Parser;
use highlight_core::ERROR_KIND_HEADER;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod backend;
mod config;
mod error;

use api::{handle_health, handle_process_pdf};
use backend::HighlightBackend;
use config::ProxyConfig;

/// Command-line arguments for the highlight proxy
#[derive(Parser, Debug)]
#[command(name = "highlight-server")]
#[command(about = "Upload proxy for the Adjustments & Credit highlighter")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Base URL of the highlighting backend
    #[arg(long, env = "HIGHLIGHT_API_URL")]
    backend_url: String,

    /// Path of the highlight endpoint on the backend
    #[arg(long, env = "HIGHLIGHT_API_PATH", default_value = ProxyConfig::DEFAULT_BACKEND_PATH)]
    backend_path: String,

    /// Secret forwarded to the backend in the bypass header
    #[arg(long, env = "HIGHLIGHT_BYPASS_SECRET", hide_env_values = true)]
    bypass_secret: Option<String>,

    /// Header name used for the bypass secret
    #[arg(long, env = "HIGHLIGHT_BYPASS_HEADER", default_value = ProxyConfig::DEFAULT_BYPASS_HEADER)]
    bypass_header: String,

    /// Backend round-trip timeout in seconds
    #[arg(long, env = "HIGHLIGHT_TIMEOUT_SECS", default_value_t = ProxyConfig::DEFAULT_TIMEOUT_SECS)]
    backend_timeout_secs: u64,

    /// Maximum accepted request body in bytes, multipart framing included
    #[arg(long, env = "HIGHLIGHT_MAX_BODY_BYTES", default_value_t = ProxyConfig::DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,

    /// Rate limit: requests per second per IP
    #[arg(long, env = "HIGHLIGHT_RATE_LIMIT", default_value = "10")]
    rate_limit: u32,

    /// Reject uploads that do not start with a %PDF- header
    #[arg(long, env = "HIGHLIGHT_REQUIRE_PDF_SIGNATURE")]
    require_pdf_signature: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn proxy_config(&self) -> ProxyConfig {
        ProxyConfig {
            backend_url: self.backend_url.clone(),
            backend_path: self.backend_path.clone(),
            bypass_secret: self.bypass_secret.clone().filter(|s| !s.is_empty()),
            bypass_header: self.bypass_header.clone(),
            backend_timeout: Duration::from_secs(self.backend_timeout_secs),
            max_body_bytes: self.max_body_bytes,
            require_pdf_signature: self.require_pdf_signature,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub backend: HighlightBackend,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> Result<Self, backend::BackendSetupError> {
        let backend = HighlightBackend::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            backend,
        })
    }
}

/// Routes without the per-IP rate limiter, which needs a real peer address
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        // Health check
        .route("/health", get(handle_health))
        // Upload endpoints; the second path is kept for older dashboards
        .route("/api/process-pdf", post(handle_process_pdf))
        .route("/api/highlight", post(handle_process_pdf))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Full service: routes plus rate limiting, CORS and request tracing.
///
/// Must be served with connect info; the limiter keys on the peer address.
pub fn app(state: AppState, rate_limit: u32) -> anyhow::Result<Router> {
    let rate_limit = rate_limit.max(1);

    // One token every 1000/rate ms, so `rate_limit` requests per second
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond((1000 / u64::from(rate_limit)).max(1))
            .burst_size(rate_limit)
            .error_handler(|err| error::ProxyError::from(err).into_response())
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration"))?,
    );

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(ERROR_KIND_HEADER)]);

    Ok(router(state)
        .layer(GovernorLayer {
            config: governor_conf,
        })
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting highlight proxy on {}:{}", args.host, args.port);

    let state = AppState::new(args.proxy_config())?;
    info!("Highlighting backend: {}", state.backend.endpoint());
    info!("Backend timeout: {:?}", state.config.backend_timeout);
    if state.config.bypass_secret.is_some() {
        info!("Bypass header {} will be attached", state.config.bypass_header);
    }

    let app = app(state, args.rate_limit)?;

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!(
        "Rate limit: {} requests/second per IP",
        args.rate_limit.max(1)
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
