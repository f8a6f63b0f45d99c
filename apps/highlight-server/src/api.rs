//! API handlers for the highlight proxy
//!
//! Provides REST endpoints for:
//! - Health check
//! - Invoice upload (validated, then relayed to the highlighting backend)

use axum::{
    body::{self, Body, Bytes},
    extract::{FromRequest, Multipart, Request, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderValue,
    },
    response::{IntoResponse, Response},
    Json,
};
use highlight_core::{has_pdf_signature, validate_upload, UploadRejection, PDF_MIME_TYPE};
use http_body_util::LengthLimitError;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::DOWNLOAD_DISPOSITION;
use crate::error::ProxyError;
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "highlight-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// The `file` part of an upload, as declared by the browser
#[derive(Debug)]
struct UploadedFile {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

/// Fields the proxy cares about; anything else is forwarded but ignored here
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    platform: Option<String>,
}

/// Handler: POST /api/process-pdf (also mounted at POST /api/highlight)
///
/// Re-validates the upload, forwards the untouched multipart body to the
/// highlighting backend and streams its PDF back as an attachment.
pub async fn handle_process_pdf(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ProxyError> {
    let (parts, body) = request.into_parts();
    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));

    let raw = body::to_bytes(body, state.config.max_body_bytes)
        .await
        .map_err(|e| {
            let inner = e.into_inner();
            if inner.downcast_ref::<LengthLimitError>().is_some() {
                ProxyError::Rejected(UploadRejection::TooLarge)
            } else {
                ProxyError::Transport(inner.to_string())
            }
        })?;

    let form = parse_upload(Request::from_parts(parts, Body::from(raw.clone()))).await?;
    let file = form.file.ok_or(UploadRejection::MissingFile)?;

    info!(
        "Upload received: name={:?}, type={:?}, size={}, platform={:?}",
        file.file_name,
        file.content_type,
        file.data.len(),
        form.platform
    );

    validate_upload(
        file.content_type.as_deref().unwrap_or_default(),
        file.data.len() as u64,
    )?;
    if state.config.require_pdf_signature && !has_pdf_signature(&file.data) {
        return Err(UploadRejection::NotPdf.into());
    }
    // The parsed copy is no longer needed; only the raw body goes upstream
    drop(file);

    let pdf = state.backend.highlight(content_type, raw).await?;
    info!("Highlighted PDF ready: {} bytes", pdf.len());

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static(PDF_MIME_TYPE)),
            (CONTENT_DISPOSITION, HeaderValue::from_static(DOWNLOAD_DISPOSITION)),
        ],
        pdf,
    )
        .into_response())
}

/// Pull the `file` and `platform` fields out of a buffered multipart body
async fn parse_upload(request: Request) -> Result<UploadForm, ProxyError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ProxyError::Transport(e.body_text()))?;

    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ProxyError::Transport(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") if form.file.is_none() => {
                let file_name = field.file_name().map(str::to_string);
                // Raw header value; the parsed mime is case-normalised
                let content_type = field
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ProxyError::Transport(e.body_text()))?;
                form.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            Some("platform") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ProxyError::Transport(e.body_text()))?;
                form.platform = Some(value);
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    Ok(form)
}
