//! Error type for the ingestion and anchoring core.
//!
//! Every failure here is terminal for the single request that produced it.
//! Nothing in the core writes shared state, so an error never leaves a
//! partial result behind. Callers decide whether to retry.

use thiserror::Error;

/// Failures surfaced by extraction, ingestion, and anchor computation.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The URL could not be fetched: network failure, timeout, or a
    /// non-success HTTP status.
    #[error("failed to fetch URL: {0}")]
    Fetch(String),

    /// The page was fetched but no main article body could be identified.
    #[error("could not extract a readable article: {0}")]
    Extraction(String),

    /// The PDF buffer was malformed or unreadable.
    #[error("failed to parse PDF: {0}")]
    PdfParse(String),

    /// A highlight was requested for a zero-length selection.
    #[error("no text selected; select some text to highlight")]
    EmptySelection,

    /// The request itself was malformed (missing or out-of-range fields).
    #[error("invalid request: {0}")]
    Validation(String),
}

impl IngestError {
    /// Short machine-readable code, used in CLI output and logs.
    pub fn code(&self) -> &'static str {
        match self {
            IngestError::Fetch(_) => "fetch_error",
            IngestError::Extraction(_) => "extraction_error",
            IngestError::PdfParse(_) => "pdf_parse_error",
            IngestError::EmptySelection => "empty_selection",
            IngestError::Validation(_) => "validation_error",
        }
    }
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_per_kind() {
        let errs = [
            IngestError::Fetch("x".into()),
            IngestError::Extraction("x".into()),
            IngestError::PdfParse("x".into()),
            IngestError::EmptySelection,
            IngestError::Validation("x".into()),
        ];
        let mut codes: Vec<&str> = errs.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errs.len());
    }

    #[test]
    fn fetch_message_keeps_underlying_cause() {
        let err = IngestError::Fetch("HTTP status 500".into());
        assert!(err.to_string().contains("HTTP status 500"));
    }
}
