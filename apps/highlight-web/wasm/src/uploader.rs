//! Browser bindings for the dashboard upload form
//!
//! JavaScript forwards DOM events (file picked, platform changed, submit
//! clicked) to [`HighlightUploader`] and re-renders from its getters. The
//! network call, the timeout and the download all happen here.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use highlight_core::{Platform, PreferenceStore, ERROR_KIND_HEADER};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, Blob, FormData, HtmlAnchorElement, RequestInit, Response, Url};

use crate::controller::{FileCandidate, SubmitPlan, UploadController};
use crate::js_error_message;
use crate::storage::LocalStoragePreference;

/// Proxy endpoint served by highlight-server
pub const DEFAULT_ENDPOINT: &str = "/api/process-pdf";

/// Client-side limit for one upload round trip
pub const DEFAULT_TIMEOUT_MS: u32 = 120_000;

type Controller = UploadController<LocalStoragePreference, web_sys::File>;

/// Staged file summary for rendering
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StagedFileInfo {
    name: String,
    size: u64,
    size_label: String,
    output_filename: String,
}

/// Outcome of one submit, for rendering
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResult {
    success: bool,
    cancelled: bool,
    filename: Option<String>,
    error: Option<String>,
    retryable: bool,
}

impl SubmitResult {
    fn downloaded(filename: String) -> Self {
        Self {
            success: true,
            cancelled: false,
            filename: Some(filename),
            error: None,
            retryable: false,
        }
    }

    fn failed(error: String, retryable: bool) -> Self {
        Self {
            success: false,
            cancelled: false,
            filename: None,
            error: Some(error),
            retryable,
        }
    }

    fn cancelled() -> Self {
        Self {
            success: false,
            cancelled: true,
            filename: None,
            error: None,
            retryable: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AbortReason {
    Timeout,
    Cancelled,
}

/// The single request currently in flight
struct InFlight {
    controller: AbortController,
    reason: Rc<Cell<Option<AbortReason>>>,
}

/// Upload form state for the dashboard page
#[wasm_bindgen]
pub struct HighlightUploader {
    state: Rc<RefCell<Controller>>,
    in_flight: Rc<RefCell<Option<InFlight>>>,
    endpoint: String,
    timeout_ms: u32,
}

#[wasm_bindgen]
impl HighlightUploader {
    /// Create an uploader; restores the remembered platform from localStorage
    #[wasm_bindgen(constructor)]
    pub fn new(endpoint: Option<String>, timeout_ms: Option<u32>) -> Self {
        Self {
            state: Rc::new(RefCell::new(UploadController::new(
                LocalStoragePreference::new(),
            ))),
            in_flight: Rc::new(RefCell::new(None)),
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            timeout_ms: timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn platform(&self) -> Option<String> {
        self.state.borrow().platform().map(|p| p.as_str().to_string())
    }

    /// Platform `<select>` changed. Empty string clears the preference.
    #[wasm_bindgen(js_name = setPlatform)]
    pub fn set_platform(&self, value: &str) {
        if let Err(e) = self.state.borrow_mut().set_platform_value(value) {
            web_sys::console::warn_1(&e.to_string().into());
        }
    }

    /// Platforms for the `<select>` options
    #[wasm_bindgen(js_name = platformOptions)]
    pub fn platform_options() -> Vec<String> {
        Platform::ALL.iter().map(|p| p.as_str().to_string()).collect()
    }

    #[wasm_bindgen(getter, js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    #[wasm_bindgen(getter, js_name = canSubmit)]
    pub fn can_submit(&self) -> bool {
        self.state.borrow().can_submit()
    }

    #[wasm_bindgen(getter, js_name = submitLabel)]
    pub fn submit_label(&self) -> String {
        self.state.borrow().submit_label().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error().map(|e| e.message.clone())
    }

    #[wasm_bindgen(getter, js_name = errorRetryable)]
    pub fn error_retryable(&self) -> bool {
        self.state.borrow().last_error_retryable()
    }

    #[wasm_bindgen(getter, js_name = outputFilename)]
    pub fn output_filename(&self) -> String {
        self.state.borrow().output_filename().to_string()
    }

    #[wasm_bindgen(js_name = setOutputFilename)]
    pub fn set_output_filename(&self, name: &str) {
        self.state.borrow_mut().set_output_filename(name);
    }

    /// Stage a file from the picker or a drop event.
    /// Returns the staged file summary, or throws the validation message.
    #[wasm_bindgen(js_name = selectFile)]
    pub fn select_file(&self, file: web_sys::File) -> Result<JsValue, JsValue> {
        let candidate = FileCandidate {
            name: file.name(),
            mime_type: file.type_(),
            size: file.size() as u64,
            handle: file,
        };

        let mut state = self.state.borrow_mut();
        let (name, size, size_label) = state
            .select_file(candidate)
            .map(|staged| (staged.name.clone(), staged.size, staged.size_label.clone()))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let info = StagedFileInfo {
            name,
            size,
            size_label,
            output_filename: state.output_filename().to_string(),
        };

        serde_wasm_bindgen::to_value(&info)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Remove the staged file. Pass the file input so the same file can be
    /// picked again.
    #[wasm_bindgen(js_name = clearFile)]
    pub fn clear_file(&self, input: Option<web_sys::HtmlInputElement>) {
        self.state.borrow_mut().clear_file();
        if let Some(input) = input {
            input.set_value("");
        }
    }

    /// Abort the in-flight upload, if any. Call on unmount or navigation.
    #[wasm_bindgen]
    pub fn cancel(&self) {
        abort_in_flight(&self.in_flight, AbortReason::Cancelled);
    }

    /// Upload the staged file and download the highlighted result
    #[wasm_bindgen]
    pub async fn submit(&self) -> Result<JsValue, JsValue> {
        let planned = self.state.borrow_mut().begin_submit();
        let plan = match planned {
            Ok(plan) => plan,
            Err(reason) => {
                return to_js(&SubmitResult::failed(reason.to_string(), false));
            }
        };

        let result = match self.send(&plan).await {
            Ok(result) => result,
            Err(err) => {
                let mut state = self.state.borrow_mut();
                let error = state.complete_network_error(&js_error_message(&err));
                SubmitResult::failed(error.message.clone(), error.is_retryable())
            }
        };

        to_js(&result)
    }
}

impl HighlightUploader {
    /// Issue the request and resolve it into a result.
    ///
    /// `Err` is only returned for failures before a response exists.
    async fn send(&self, plan: &SubmitPlan<web_sys::File>) -> Result<SubmitResult, JsValue> {
        let window = web_sys::window().ok_or("No window")?;

        let form = FormData::new()?;
        form.append_with_blob_and_filename("file", &plan.handle, &plan.file_name)?;
        form.append_with_str("platform", plan.platform.as_str())?;

        let abort = AbortController::new()?;
        let reason = Rc::new(Cell::new(None));
        *self.in_flight.borrow_mut() = Some(InFlight {
            controller: abort.clone(),
            reason: reason.clone(),
        });

        let in_flight = self.in_flight.clone();
        let on_timeout = Closure::once(move || abort_in_flight(&in_flight, AbortReason::Timeout));
        let timer = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            on_timeout.as_ref().unchecked_ref(),
            timer_delay(self.timeout_ms),
        )?;

        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_body(&form);
        opts.set_signal(Some(&abort.signal()));

        let outcome = self.exchange(&window, &opts, plan).await;

        window.clear_timeout_with_handle(timer);
        drop(on_timeout);
        self.in_flight.borrow_mut().take();

        match (outcome, reason.get()) {
            (Ok(result), _) => Ok(result),
            (Err(_), Some(why)) => Ok(settle_aborted(
                &mut self.state.borrow_mut(),
                why,
                self.timeout_ms,
            )),
            (Err(err), None) => Err(err),
        }
    }

    /// Fetch, then either download the PDF or record the error body
    async fn exchange(
        &self,
        window: &web_sys::Window,
        opts: &RequestInit,
        plan: &SubmitPlan<web_sys::File>,
    ) -> Result<SubmitResult, JsValue> {
        let response: Response = JsFuture::from(window.fetch_with_str_and_init(&self.endpoint, opts))
            .await?
            .dyn_into()?;

        if response.ok() {
            let blob: Blob = JsFuture::from(response.blob()?).await?.dyn_into()?;
            let mut state = self.state.borrow_mut();
            // The staged file is only released once the download has started
            if let Err(err) = trigger_download(window, &blob, &plan.download_name) {
                let error = state.complete_download_error(&js_error_message(&err));
                return Ok(SubmitResult::failed(
                    error.message.clone(),
                    error.is_retryable(),
                ));
            }
            return Ok(SubmitResult::downloaded(state.complete_success(plan)));
        }

        let status = response.status();
        let kind = response.headers().get(ERROR_KIND_HEADER)?;
        let body = JsFuture::from(response.text()?)
            .await?
            .as_string()
            .unwrap_or_default();

        let mut state = self.state.borrow_mut();
        let error = state.complete_failure(status, kind.as_deref(), &body);
        web_sys::console::error_1(&format!("Upload failed: {} - {}", status, error.message).into());
        Ok(SubmitResult::failed(
            error.message.clone(),
            error.is_retryable(),
        ))
    }
}

impl Drop for HighlightUploader {
    fn drop(&mut self) {
        abort_in_flight(&self.in_flight, AbortReason::Cancelled);
    }
}

/// Resolve a request that ended because its signal was aborted
fn settle_aborted<S: PreferenceStore, H: Clone>(
    state: &mut UploadController<S, H>,
    why: AbortReason,
    timeout_ms: u32,
) -> SubmitResult {
    match why {
        AbortReason::Timeout => {
            let error = state.complete_timeout(timeout_ms);
            SubmitResult::failed(error.message.clone(), error.is_retryable())
        }
        AbortReason::Cancelled => {
            state.cancel();
            SubmitResult::cancelled()
        }
    }
}

/// `setTimeout` delay; limits past `i32::MAX` ms would wrap and fire at once
fn timer_delay(timeout_ms: u32) -> i32 {
    i32::try_from(timeout_ms).unwrap_or(i32::MAX)
}

/// First reason wins; a timeout racing a cancel keeps whichever came first
fn abort_in_flight(in_flight: &RefCell<Option<InFlight>>, why: AbortReason) {
    if let Some(current) = in_flight.borrow().as_ref() {
        if current.reason.get().is_none() {
            current.reason.set(Some(why));
        }
        current.controller.abort();
    }
}

/// Save a blob through a temporary object URL and a synthetic link click
fn trigger_download(window: &web_sys::Window, blob: &Blob, filename: &str) -> Result<(), JsValue> {
    let document = window.document().ok_or("No document")?;
    let body = document.body().ok_or("No body")?;

    let url = Url::create_object_url_with_blob(blob)?;
    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(filename);
    body.append_child(&anchor)?;
    anchor.click();
    anchor.remove();
    Url::revoke_object_url(&url)?;

    Ok(())
}

fn to_js(result: &SubmitResult) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(result)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
