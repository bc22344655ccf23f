//! PDF text extraction.

use std::fs;
use std::panic;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, WordFreqError};

/// Text of every page, concatenated in page order.
///
/// Malformed documents are reported as [`WordFreqError::Pdf`]. The extractor
/// panics on some broken inputs, so panics are caught and reported the same way.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    if bytes.is_empty() {
        return Err(WordFreqError::EmptyInput("pdf"));
    }
    debug!(bytes = bytes.len(), "extracting PDF text");
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => {
            warn!(error = %e, "PDF extraction failed");
            Err(WordFreqError::Pdf(e.to_string()))
        }
        Err(_) => {
            warn!("PDF extractor panicked");
            Err(WordFreqError::Pdf("document could not be parsed".into()))
        }
    }
}

/// Read a PDF from disk and extract its text.
pub fn extract_text_from_path<P: AsRef<Path>>(path: P) -> Result<String> {
    let bytes = fs::read(path)?;
    extract_text(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bytes_rejected() {
        assert!(matches!(
            extract_text(&[]),
            Err(WordFreqError::EmptyInput("pdf"))
        ));
    }

    #[test]
    fn garbage_is_pdf_error() {
        let err = extract_text(b"this is not a pdf document at all").unwrap_err();
        assert!(matches!(err, WordFreqError::Pdf(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = extract_text_from_path("/nonexistent/definitely/missing.pdf").unwrap_err();
        assert!(matches!(err, WordFreqError::Io(_)));
    }
}
