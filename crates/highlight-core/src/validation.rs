//! Upload validation shared by the browser and the proxy
//!
//! Checks only look at the declared media type and the byte length. The
//! content itself is not inspected unless a caller opts into
//! [`has_pdf_signature`].

use thiserror::Error;

use crate::platform::Platform;

/// The only media type accepted for uploads
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Upload size limit: 10 MiB
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Reasons an upload is refused before any network call is made.
///
/// The `Display` text is shown to end users verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Only PDF files are allowed")]
    NotPdf,

    #[error("File size must be less than 10MB")]
    TooLarge,

    #[error("Please select a platform before uploading")]
    MissingPlatform,

    #[error("Please select a PDF file")]
    NoFileStaged,

    #[error("{0} highlighting is currently in development")]
    PlatformUnavailable(Platform),

    #[error("An upload is already in progress")]
    Busy,
}

/// Validate a file by its declared media type and size.
///
/// The type must match [`PDF_MIME_TYPE`] exactly and the size must not
/// exceed [`MAX_UPLOAD_BYTES`]. The type check runs first.
pub fn validate_upload(declared_type: &str, byte_len: u64) -> Result<(), UploadRejection> {
    if declared_type != PDF_MIME_TYPE {
        return Err(UploadRejection::NotPdf);
    }
    if byte_len > MAX_UPLOAD_BYTES {
        return Err(UploadRejection::TooLarge);
    }
    Ok(())
}

/// Check for the `%PDF-` header.
pub fn has_pdf_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accepts_pdf_at_limit() {
        assert_eq!(validate_upload("application/pdf", MAX_UPLOAD_BYTES), Ok(()));
    }

    #[test]
    fn test_rejects_one_byte_over_limit() {
        assert_eq!(
            validate_upload("application/pdf", MAX_UPLOAD_BYTES + 1),
            Err(UploadRejection::TooLarge)
        );
    }

    #[test]
    fn test_empty_pdf_passes() {
        // Only declared type and length are examined, not content
        assert_eq!(validate_upload("application/pdf", 0), Ok(()));
    }

    #[test]
    fn test_type_match_is_exact() {
        assert_eq!(
            validate_upload("application/PDF", 10),
            Err(UploadRejection::NotPdf)
        );
        assert_eq!(
            validate_upload("application/pdf; charset=binary", 10),
            Err(UploadRejection::NotPdf)
        );
        assert_eq!(validate_upload("", 10), Err(UploadRejection::NotPdf));
    }

    #[test]
    fn test_wrong_type_wins_over_size() {
        assert_eq!(
            validate_upload("image/png", MAX_UPLOAD_BYTES * 2),
            Err(UploadRejection::NotPdf)
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(UploadRejection::NotPdf.to_string(), "Only PDF files are allowed");
        assert_eq!(
            UploadRejection::TooLarge.to_string(),
            "File size must be less than 10MB"
        );
        assert_eq!(UploadRejection::MissingFile.to_string(), "No file uploaded");
        assert_eq!(
            UploadRejection::MissingPlatform.to_string(),
            "Please select a platform before uploading"
        );
        assert_eq!(
            UploadRejection::NoFileStaged.to_string(),
            "Please select a PDF file"
        );
        assert_eq!(
            UploadRejection::PlatformUnavailable(Platform::CounselLink).to_string(),
            "CounselLink highlighting is currently in development"
        );
    }

    #[test]
    fn test_pdf_signature() {
        assert!(has_pdf_signature(b"%PDF-1.7\n"));
        assert!(!has_pdf_signature(b""));
        assert!(!has_pdf_signature(b"PK\x03\x04"));
    }

    proptest! {
        #[test]
        fn non_pdf_types_always_rejected(
            mime in "[a-z]{1,12}/[a-z0-9.+-]{1,20}",
            size in 0u64..=MAX_UPLOAD_BYTES,
        ) {
            prop_assume!(mime != PDF_MIME_TYPE);
            prop_assert_eq!(validate_upload(&mime, size), Err(UploadRejection::NotPdf));
        }

        #[test]
        fn oversized_pdfs_always_rejected(extra in 1u64..(1 << 32)) {
            prop_assert_eq!(
                validate_upload(PDF_MIME_TYPE, MAX_UPLOAD_BYTES + extra),
                Err(UploadRejection::TooLarge)
            );
        }

        #[test]
        fn pdfs_within_limit_always_accepted(size in 0u64..=MAX_UPLOAD_BYTES) {
            prop_assert_eq!(validate_upload(PDF_MIME_TYPE, size), Ok(()));
        }
    }
}
