//! WASM bindings for the highlighter dashboard upload form
//!
//! The form's state lives in Rust. JavaScript only wires DOM events to
//! [`HighlightUploader`] and re-renders from its getters.
//!
//! ## Architecture
//!
//! - `controller`: platform-agnostic form state machine, unit tested natively
//! - `storage`: remembers the chosen platform in localStorage
//! - `uploader`: fetch, timeout/cancel via AbortController, blob download
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { HighlightUploader } from './pkg/highlight_wasm.js';
//!
//! await init();
//!
//! const uploader = new HighlightUploader();
//! platformSelect.value = uploader.platform ?? '';
//! platformSelect.onchange = (e) => uploader.setPlatform(e.target.value);
//!
//! fileInput.onchange = (e) => {
//!     try {
//!         const info = uploader.selectFile(e.target.files[0]);
//!         showFile(info.name, info.sizeLabel, info.outputFilename);
//!     } catch (message) {
//!         showError(message);
//!     }
//! };
//!
//! submitButton.onclick = async () => {
//!     const result = await uploader.submit();
//!     if (!result.success && !result.cancelled) showError(result.error);
//! };
//!
//! window.addEventListener('pagehide', () => uploader.cancel());
//! ```

pub mod controller;
pub mod storage;
pub mod uploader;

use wasm_bindgen::prelude::*;

pub use controller::{ClientError, UploadController};
pub use storage::LocalStoragePreference;
pub use uploader::HighlightUploader;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Human-readable size for a `File.size` value
#[wasm_bindgen(js_name = formatFileSize)]
pub fn format_file_size(bytes: f64) -> String {
    highlight_core::format_file_size(bytes.max(0.0) as u64)
}

/// Check a file's declared type and size without staging it.
/// Throws the user-facing message on rejection.
#[wasm_bindgen(js_name = validateFile)]
pub fn validate_file(mime_type: &str, size: f64) -> Result<(), JsValue> {
    highlight_core::validate_upload(mime_type, size.max(0.0) as u64)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Best-effort message from a thrown JS value
pub(crate) fn js_error_message(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}
