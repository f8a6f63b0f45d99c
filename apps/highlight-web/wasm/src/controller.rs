//! Upload controller state machine
//!
//! Holds everything the dashboard form needs between events: the selected
//! platform, the staged file, the output filename, the visible error and the
//! busy flag. It performs no I/O; the browser bindings feed it events and
//! act on what it returns, which keeps the whole flow testable natively.

use highlight_core::{
    default_output_filename, format_file_size, validate_upload, ErrorBody, ErrorKind, Platform,
    PlatformPreference, PreferenceError, PreferenceStore, UploadRejection,
};

pub const SUBMIT_LABEL: &str = "Highlight PDF";
pub const BUSY_LABEL: &str = "Processing...";

/// A file picked or dropped by the user, before validation
#[derive(Debug, Clone)]
pub struct FileCandidate<H> {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub handle: H,
}

/// A file that passed validation and waits for submit
#[derive(Debug, Clone)]
pub struct StagedFile<H> {
    pub name: String,
    pub size: u64,
    pub size_label: String,
    pub handle: H,
}

/// Everything needed to issue the upload request
#[derive(Debug, Clone)]
pub struct SubmitPlan<H> {
    pub handle: H,
    pub file_name: String,
    pub platform: Platform,
    pub download_name: String,
}

/// Error shown in the dashboard banner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub message: String,
    pub kind: ErrorKind,
}

impl ClientError {
    fn validation(reason: UploadRejection) -> Self {
        Self {
            message: reason.to_string(),
            kind: ErrorKind::Validation,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Dashboard upload form state.
///
/// `H` is whatever identifies the file to the transport layer: a browser
/// `File` in the wasm bindings, anything cloneable in tests.
pub struct UploadController<S, H> {
    preference: PlatformPreference<S>,
    platform: Option<Platform>,
    staged: Option<StagedFile<H>>,
    output_filename: String,
    error: Option<ClientError>,
    loading: bool,
}

impl<S: PreferenceStore, H: Clone> UploadController<S, H> {
    /// Create a controller, restoring the remembered platform
    pub fn new(store: S) -> Self {
        let preference = PlatformPreference::new(store);
        let platform = preference.restore();
        Self {
            preference,
            platform,
            staged: None,
            output_filename: String::new(),
            error: None,
            loading: false,
        }
    }

    pub fn platform(&self) -> Option<Platform> {
        self.platform
    }

    pub fn staged(&self) -> Option<&StagedFile<H>> {
        self.staged.as_ref()
    }

    pub fn output_filename(&self) -> &str {
        &self.output_filename
    }

    pub fn error(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }

    /// Whether the visible error came from a transient failure
    pub fn last_error_retryable(&self) -> bool {
        self.error.as_ref().is_some_and(ClientError::is_retryable)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn submit_label(&self) -> &'static str {
        if self.loading {
            BUSY_LABEL
        } else {
            SUBMIT_LABEL
        }
    }

    /// Whether the submit control should be enabled
    pub fn can_submit(&self) -> bool {
        !self.loading
            && self.staged.is_some()
            && self.platform.map(|p| p.is_supported()).unwrap_or(false)
    }

    /// Change the platform and persist the choice; `None` forgets it.
    ///
    /// The in-memory selection changes even when persisting fails.
    pub fn set_platform(&mut self, platform: Option<Platform>) -> Result<(), PreferenceError> {
        self.platform = platform;
        self.preference.remember(platform)
    }

    /// Same as [`set_platform`](Self::set_platform) for raw `<select>` values.
    /// Empty or unknown values clear the selection.
    pub fn set_platform_value(&mut self, value: &str) -> Result<(), PreferenceError> {
        self.set_platform(value.parse().ok())
    }

    /// Validate and stage a file. On rejection nothing stays staged.
    pub fn select_file(
        &mut self,
        candidate: FileCandidate<H>,
    ) -> Result<&StagedFile<H>, UploadRejection> {
        if let Err(reason) = validate_upload(&candidate.mime_type, candidate.size) {
            self.staged = None;
            self.output_filename.clear();
            self.error = Some(ClientError::validation(reason));
            return Err(reason);
        }

        self.error = None;
        self.output_filename = default_output_filename(&candidate.name);
        Ok(self.staged.insert(StagedFile {
            size_label: format_file_size(candidate.size),
            name: candidate.name,
            size: candidate.size,
            handle: candidate.handle,
        }))
    }

    /// User edit of the download name
    pub fn set_output_filename(&mut self, name: &str) {
        self.output_filename = name.to_string();
    }

    /// Drop the staged file along with any error
    pub fn clear_file(&mut self) {
        self.staged = None;
        self.output_filename.clear();
        self.error = None;
    }

    /// Guard and start a submit. Nothing is sent when this fails.
    pub fn begin_submit(&mut self) -> Result<SubmitPlan<H>, UploadRejection> {
        match self.plan_submit() {
            Ok(plan) => {
                self.loading = true;
                self.error = None;
                Ok(plan)
            }
            Err(UploadRejection::Busy) => Err(UploadRejection::Busy),
            Err(reason) => {
                self.error = Some(ClientError::validation(reason));
                Err(reason)
            }
        }
    }

    fn plan_submit(&self) -> Result<SubmitPlan<H>, UploadRejection> {
        if self.loading {
            return Err(UploadRejection::Busy);
        }
        let platform = self.platform.ok_or(UploadRejection::MissingPlatform)?;
        if !platform.is_supported() {
            return Err(UploadRejection::PlatformUnavailable(platform));
        }
        let staged = self.staged.as_ref().ok_or(UploadRejection::NoFileStaged)?;

        let edited = self.output_filename.trim();
        let download_name = if edited.is_empty() {
            default_output_filename(&staged.name)
        } else {
            edited.to_string()
        };

        Ok(SubmitPlan {
            handle: staged.handle.clone(),
            file_name: staged.name.clone(),
            platform,
            download_name,
        })
    }

    /// The highlighted PDF arrived. Returns the name to download it under.
    pub fn complete_success(&mut self, plan: &SubmitPlan<H>) -> String {
        self.loading = false;
        self.staged = None;
        self.output_filename.clear();
        plan.download_name.clone()
    }

    /// The proxy answered with a non-success status
    pub fn complete_failure(
        &mut self,
        status: u16,
        kind_header: Option<&str>,
        body: &str,
    ) -> &ClientError {
        let message = match ErrorBody::extract(body) {
            Ok(Some(message)) => message,
            Ok(None) => format!("Upload failed with status {}", status),
            Err(()) => format!("Server returned non-JSON response (status {})", status),
        };
        let kind = kind_header
            .and_then(ErrorKind::parse)
            .unwrap_or_else(|| ErrorKind::from_status(status));
        self.fail(message, kind)
    }

    /// The request never got a response
    pub fn complete_network_error(&mut self, message: &str) -> &ClientError {
        self.fail(format!("Network error: {}", message), ErrorKind::Transport)
    }

    /// The PDF arrived but could not be handed to the browser.
    /// The file stays staged so the user can try again.
    pub fn complete_download_error(&mut self, message: &str) -> &ClientError {
        self.fail(format!("Download failed: {}", message), ErrorKind::Transport)
    }

    /// The request was aborted by the client-side timeout
    pub fn complete_timeout(&mut self, timeout_ms: u32) -> &ClientError {
        let limit = if timeout_ms < 1000 {
            format!("{}ms", timeout_ms)
        } else {
            format!("{}s", timeout_ms.div_ceil(1000))
        };
        self.fail(
            format!("Request timed out after {}. Please try again.", limit),
            ErrorKind::Transport,
        )
    }

    /// The request was cancelled on purpose (unmount, navigation)
    pub fn cancel(&mut self) {
        self.loading = false;
    }

    fn fail(&mut self, message: String, kind: ErrorKind) -> &ClientError {
        self.loading = false;
        self.error.insert(ClientError { message, kind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use highlight_core::{MemoryPreferenceStore, PLATFORM_PREFERENCE_KEY};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    type Controller = UploadController<MemoryPreferenceStore, u32>;

    fn controller() -> Controller {
        UploadController::new(MemoryPreferenceStore::new())
    }

    fn pdf(name: &str, size: u64) -> FileCandidate<u32> {
        FileCandidate {
            name: name.to_string(),
            mime_type: "application/pdf".to_string(),
            size,
            handle: 7,
        }
    }

    fn ready() -> Controller {
        let mut c = controller();
        c.set_platform(Some(Platform::T360)).unwrap();
        c.select_file(pdf("invoice.pdf", 2048)).unwrap();
        c
    }

    #[test]
    fn test_select_stages_file_with_label_and_name() {
        let mut c = controller();
        let staged = c.select_file(pdf("March Invoice.pdf", 1_048_576)).unwrap();
        assert_eq!(staged.size_label, "1 MB");
        assert_eq!(staged.handle, 7);
        assert_eq!(c.output_filename(), "March Invoice-highlighted.pdf");
        assert!(c.error().is_none());
    }

    #[test]
    fn test_select_rejects_non_pdf() {
        let mut c = controller();
        let mut candidate = pdf("photo.png", 10);
        candidate.mime_type = "image/png".to_string();

        assert_eq!(c.select_file(candidate).unwrap_err(), UploadRejection::NotPdf);
        assert_eq!(c.error().unwrap().message, "Only PDF files are allowed");
    }

    #[test]
    fn test_rejected_file_leaves_nothing_staged() {
        let mut c = controller();
        c.select_file(pdf("first.pdf", 10)).unwrap();
        assert!(c.select_file(pdf("huge.pdf", 11 * 1024 * 1024)).is_err());

        assert!(c.staged().is_none());
        assert_eq!(
            c.error().unwrap().message,
            "File size must be less than 10MB"
        );
        assert_eq!(c.error().unwrap().kind, ErrorKind::Validation);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut c = ready();
        c.set_output_filename("custom.pdf");
        c.clear_file();
        assert!(c.staged().is_none());
        assert_eq!(c.output_filename(), "");
        assert!(c.error().is_none());
        // Platform survives a clear
        assert_eq!(c.platform(), Some(Platform::T360));
    }

    #[test]
    fn test_submit_requires_platform() {
        let mut c = controller();
        c.select_file(pdf("invoice.pdf", 10)).unwrap();

        assert_eq!(
            c.begin_submit().unwrap_err(),
            UploadRejection::MissingPlatform
        );
        assert_eq!(
            c.error().unwrap().message,
            "Please select a platform before uploading"
        );
        assert!(!c.is_loading());
    }

    #[test]
    fn test_submit_requires_file() {
        let mut c = controller();
        c.set_platform(Some(Platform::T360)).unwrap();
        assert_eq!(c.begin_submit().unwrap_err(), UploadRejection::NoFileStaged);
        assert_eq!(c.error().unwrap().message, "Please select a PDF file");
    }

    #[test]
    fn test_counsellink_is_blocked() {
        let mut c = controller();
        c.set_platform(Some(Platform::CounselLink)).unwrap();
        c.select_file(pdf("invoice.pdf", 10)).unwrap();

        assert!(!c.can_submit());
        assert_eq!(
            c.begin_submit().unwrap_err(),
            UploadRejection::PlatformUnavailable(Platform::CounselLink)
        );
    }

    #[test]
    fn test_submit_sets_busy_and_blocks_second_submit() {
        let mut c = ready();
        assert!(c.can_submit());

        let plan = c.begin_submit().unwrap();
        assert_eq!(plan.platform, Platform::T360);
        assert_eq!(plan.file_name, "invoice.pdf");
        assert_eq!(plan.download_name, "invoice-highlighted.pdf");
        assert!(c.is_loading());
        assert_eq!(c.submit_label(), BUSY_LABEL);
        assert!(!c.can_submit());

        assert_eq!(c.begin_submit().unwrap_err(), UploadRejection::Busy);
        // The busy guard does not replace the banner
        assert!(c.error().is_none());
    }

    #[test]
    fn test_edited_output_name_is_used() {
        let mut c = ready();
        c.set_output_filename("  Q1 review.pdf ");
        assert_eq!(c.begin_submit().unwrap().download_name, "Q1 review.pdf");
    }

    #[test]
    fn test_blank_output_name_falls_back_to_default() {
        let mut c = ready();
        c.set_output_filename("   ");
        assert_eq!(
            c.begin_submit().unwrap().download_name,
            "invoice-highlighted.pdf"
        );
    }

    #[test]
    fn test_success_clears_busy_and_staged_file() {
        let mut c = ready();
        let plan = c.begin_submit().unwrap();
        assert_eq!(c.complete_success(&plan), "invoice-highlighted.pdf");
        assert!(!c.is_loading());
        assert!(c.staged().is_none());
        assert_eq!(c.submit_label(), SUBMIT_LABEL);
    }

    #[test]
    fn test_failure_with_json_error() {
        let mut c = ready();
        c.begin_submit().unwrap();
        let err = c
            .complete_failure(
                502,
                Some("backend"),
                r#"{"error":"Processing failed: backend down"}"#,
            )
            .clone();
        assert_eq!(err.message, "Processing failed: backend down");
        assert_eq!(err.kind, ErrorKind::Backend);
        assert!(!c.last_error_retryable());
        assert!(!c.is_loading());
        // The file stays staged so the user can resubmit
        assert!(c.staged().is_some());
    }

    #[test]
    fn test_failure_with_non_json_body() {
        let mut c = ready();
        c.begin_submit().unwrap();
        let err = c.complete_failure(502, None, "<html>Bad Gateway</html>").clone();
        assert_eq!(
            err.message,
            "Server returned non-JSON response (status 502)"
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn test_failure_with_json_without_error_field() {
        let mut c = ready();
        c.begin_submit().unwrap();
        let err = c.complete_failure(413, None, r#"{"detail":"too big"}"#).clone();
        assert_eq!(err.message, "Upload failed with status 413");
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_network_error_and_timeout_are_retryable() {
        let mut c = ready();
        c.begin_submit().unwrap();
        let err = c.complete_network_error("Failed to fetch").clone();
        assert_eq!(err.message, "Network error: Failed to fetch");
        assert!(err.is_retryable());
        assert!(c.last_error_retryable());
        assert!(!c.is_loading());

        c.begin_submit().unwrap();
        let err = c.complete_timeout(120_000).clone();
        assert_eq!(err.message, "Request timed out after 120s. Please try again.");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_timeout_message_for_short_and_odd_limits() {
        let mut c = ready();
        c.begin_submit().unwrap();
        assert_eq!(
            c.complete_timeout(250).message,
            "Request timed out after 250ms. Please try again."
        );

        c.begin_submit().unwrap();
        assert_eq!(
            c.complete_timeout(1_500).message,
            "Request timed out after 2s. Please try again."
        );
    }

    #[test]
    fn test_download_error_keeps_file_staged() {
        let mut c = ready();
        c.begin_submit().unwrap();
        let err = c.complete_download_error("No body").clone();
        assert_eq!(err.message, "Download failed: No body");
        assert!(err.is_retryable());
        assert!(!c.is_loading());
        assert!(c.staged().is_some());

        // A retry goes through with the same file
        assert!(c.begin_submit().is_ok());
    }

    #[test]
    fn test_cancel_clears_busy_without_error() {
        let mut c = ready();
        c.begin_submit().unwrap();
        c.cancel();
        assert!(!c.is_loading());
        assert!(c.error().is_none());
    }

    #[test]
    fn test_platform_preference_persists_and_clears() {
        let mut c = controller();
        c.set_platform_value("T360").unwrap();

        let store = c.preference.store().clone();
        assert!(store.contains(PLATFORM_PREFERENCE_KEY));

        // Next visit restores the selection
        let mut next: Controller = UploadController::new(store);
        assert_eq!(next.platform(), Some(Platform::T360));

        next.set_platform_value("").unwrap();
        let store = next.preference.store().clone();
        assert!(!store.contains(PLATFORM_PREFERENCE_KEY));

        let fresh: Controller = UploadController::new(store);
        assert_eq!(fresh.platform(), None);
    }

    proptest! {
        /// Property: any non-PDF type is refused with the shared message
        #[test]
        fn non_pdf_never_staged(mime in "[a-z]{1,10}/[a-z]{1,10}", size in 0u64..1_000_000) {
            prop_assume!(mime != "application/pdf");
            let mut c = controller();
            let candidate = FileCandidate { name: "x".into(), mime_type: mime, size, handle: 0 };
            prop_assert!(c.select_file(candidate).is_err());
            prop_assert!(c.staged().is_none());
            prop_assert_eq!(&c.error().unwrap().message, "Only PDF files are allowed");
        }

        /// Property: a valid T360 upload always produces a submit plan
        #[test]
        fn valid_t360_upload_proceeds(size in 0u64..=10 * 1024 * 1024) {
            let mut c = controller();
            c.set_platform(Some(Platform::T360)).unwrap();
            c.select_file(pdf("invoice.pdf", size)).unwrap();
            prop_assert!(c.begin_submit().is_ok());
        }
    }
}
