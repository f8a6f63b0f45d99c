//! Shared upload contract for the Adjustments & Credit highlighter
//!
//! Both sides of the trust boundary depend on this crate: the browser
//! upload controller uses it to fail fast, the proxy server uses it to
//! enforce the same rules on untrusted input.

pub mod error;
pub mod format;
pub mod platform;
pub mod preference;
pub mod validation;

pub use error::{ErrorBody, ErrorKind, ERROR_KIND_HEADER};
pub use format::{default_output_filename, format_file_size};
pub use platform::{Platform, UnknownPlatform};
pub use preference::{
    MemoryPreferenceStore, PlatformPreference, PreferenceError, PreferenceStore,
    PLATFORM_PREFERENCE_KEY,
};
pub use validation::{
    has_pdf_signature, validate_upload, UploadRejection, MAX_UPLOAD_BYTES, PDF_MIME_TYPE,
};
