//! PDF text extraction.
//!
//! Produces a flat UTF-8 text stream from an in-memory PDF; page structure is
//! not preserved. The document title never comes from the PDF itself but from
//! the uploaded file name (see [`title_from_file_name`]).

use std::path::Path;

use crate::error::{IngestError, Result};

/// Title used when the uploaded file name yields nothing usable.
pub const UNTITLED_DOCUMENT: &str = "Untitled Document";

/// Maximum accepted upload size in bytes.
pub const MAX_PDF_BYTES: usize = 64 * 1024 * 1024;

/// Extracts the text stream of a PDF buffer.
///
/// CPU-bound; async callers should run it on a blocking thread.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    if bytes.is_empty() {
        return Err(IngestError::PdfParse("empty file".to_string()));
    }
    if bytes.len() > MAX_PDF_BYTES {
        return Err(IngestError::PdfParse(format!(
            "file exceeds size limit ({} bytes)",
            MAX_PDF_BYTES
        )));
    }
    if !looks_like_pdf(bytes) {
        return Err(IngestError::PdfParse("missing %PDF- header".to_string()));
    }
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| IngestError::PdfParse(e.to_string()))
}

/// Derives a document title from an uploaded file name: directories and the
/// extension are stripped, falling back to [`UNTITLED_DOCUMENT`].
pub fn title_from_file_name(file_name: &str) -> String {
    let name = Path::new(file_name.trim())
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    // ".pdf" has an empty stem, unlike what `Path::file_stem` reports.
    let stem = match name.rsplit_once('.') {
        Some((stem, _ext)) => stem.trim().to_string(),
        None => name.trim().to_string(),
    };

    if stem.is_empty() {
        UNTITLED_DOCUMENT.to_string()
    } else {
        stem
    }
}

/// Cheap sniff of the `%PDF-` magic header.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    head.windows(5).any(|w| w == b"%PDF-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_pdf_text(b"not a pdf").unwrap_err();
        assert!(matches!(err, IngestError::PdfParse(_)));
    }

    #[test]
    fn empty_buffer_returns_error() {
        let err = extract_pdf_text(b"").unwrap_err();
        assert!(matches!(err, IngestError::PdfParse(_)));
    }

    #[test]
    fn title_strips_extension() {
        assert_eq!(title_from_file_name("Quarterly Report.pdf"), "Quarterly Report");
        assert_eq!(title_from_file_name("notes.final.PDF"), "notes.final");
        assert_eq!(title_from_file_name("no_extension"), "no_extension");
    }

    #[test]
    fn title_strips_directories() {
        assert_eq!(title_from_file_name("uploads/2024/paper.pdf"), "paper");
    }

    #[test]
    fn empty_title_falls_back() {
        assert_eq!(title_from_file_name(""), UNTITLED_DOCUMENT);
        assert_eq!(title_from_file_name("   "), UNTITLED_DOCUMENT);
        assert_eq!(title_from_file_name("/"), UNTITLED_DOCUMENT);
        assert_eq!(title_from_file_name(".pdf"), UNTITLED_DOCUMENT);
        assert_eq!(title_from_file_name("uploads/ .pdf"), UNTITLED_DOCUMENT);
    }

    #[test]
    fn sniffs_magic_header() {
        assert!(looks_like_pdf(b"%PDF-1.7\n%..."));
        assert!(!looks_like_pdf(b"<!doctype html>"));
        assert!(!looks_like_pdf(b""));
    }
}
