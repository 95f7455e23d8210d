//! Ingestion pipeline orchestration.
//!
//! Coordinates the flow: request validation → extractor (HTML, PDF, or plain
//! text) → normalization → metadata (reading time, tags, headings). The
//! result is a value; persisting it is the caller's job.
//!
//! Requests are independent. There is no caching, no URL deduplication, and
//! no retry: every call re-fetches and re-extracts.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::{IngestError, Result};
use crate::fetch;
use crate::headings::extract_headings;
use crate::models::{
    ContentType, DocumentMetadata, ExtractedDocument, IngestionResult, RawSource,
};
use crate::normalize::normalize;
use crate::pdf;
use crate::readability::{ParagraphDensity, ReadabilityStrategy};
use crate::reading_time::estimate_with_rate;
use crate::tagger;

/// Longest title taken from the first line of pasted text.
const MAX_TEXT_TITLE_CHARS: usize = 100;

/// Ingestion request as received from an outer surface.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IngestRequest {
    Url {
        url: String,
    },
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    File {
        file_bytes: Vec<u8>,
        file_name: String,
    },
}

impl IngestRequest {
    /// Validates the request and converts it into a [`RawSource`].
    pub fn into_source(self) -> Result<RawSource> {
        match self {
            IngestRequest::Url { url } => {
                let url = url.trim().to_string();
                if url.is_empty() {
                    return Err(IngestError::Validation("URL is required".into()));
                }
                let parsed = reqwest::Url::parse(&url)
                    .map_err(|e| IngestError::Validation(format!("invalid URL '{}': {}", url, e)))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(IngestError::Validation(format!(
                        "unsupported URL scheme '{}'; use http or https",
                        parsed.scheme()
                    )));
                }
                Ok(RawSource::Url(url))
            }
            IngestRequest::Text { text } => {
                if text.trim().is_empty() {
                    return Err(IngestError::Validation("text is required".into()));
                }
                Ok(RawSource::PlainText(text))
            }
            IngestRequest::File {
                file_bytes,
                file_name,
            } => {
                if file_bytes.is_empty() {
                    return Err(IngestError::Validation("PDF file is required".into()));
                }
                Ok(RawSource::PdfBytes {
                    bytes: file_bytes,
                    file_name,
                })
            }
        }
    }
}

/// Runs ingestion requests. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct Ingestor {
    client: reqwest::Client,
    strategy: Arc<dyn ReadabilityStrategy>,
    min_content_chars: usize,
    words_per_minute: u32,
}

impl Ingestor {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: fetch::build_client(&config.fetch)?,
            strategy: Arc::new(ParagraphDensity),
            min_content_chars: config.extraction.min_content_chars,
            words_per_minute: config.reading.words_per_minute,
        })
    }

    /// Replaces the readability heuristic used for URL sources.
    pub fn with_strategy(mut self, strategy: Arc<dyn ReadabilityStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Validates and ingests a boundary request.
    pub async fn ingest_request(&self, request: IngestRequest) -> Result<IngestionResult> {
        self.ingest(request.into_source()?).await
    }

    /// Extracts, normalizes, and derives metadata for one source.
    #[instrument(skip_all, fields(kind = %source.content_type()))]
    pub async fn ingest(&self, source: RawSource) -> Result<IngestionResult> {
        let content_type = source.content_type();
        let (doc, original_url) = match source {
            RawSource::Url(url) => {
                let doc = fetch::extract_article(
                    &self.client,
                    &url,
                    self.strategy.as_ref(),
                    self.min_content_chars,
                )
                .await?;
                (doc, Some(url))
            }
            RawSource::PlainText(text) => (extract_plain_text(&text), None),
            RawSource::PdfBytes { bytes, file_name } => {
                (extract_pdf(bytes, &file_name).await?, None)
            }
        };

        let metadata = derive_metadata(&doc, content_type, self.words_per_minute);
        info!(
            title = %doc.title,
            reading_time = metadata.reading_time_minutes,
            tags = metadata.tags.len(),
            headings = metadata.headings.len(),
            "ingested document"
        );

        Ok(IngestionResult {
            title: doc.title,
            content: doc.content,
            content_type,
            original_url,
            reading_time_minutes: metadata.reading_time_minutes,
            tags: metadata.tags,
            headings: metadata.headings,
        })
    }
}

/// Normalizes pasted text; the title is its first line, capped at 100 chars.
pub fn extract_plain_text(text: &str) -> ExtractedDocument {
    let cleaned = normalize(text);
    let title: String = cleaned
        .lines()
        .next()
        .map(|line| line.chars().take(MAX_TEXT_TITLE_CHARS).collect())
        .unwrap_or_default();
    let title = if title.trim().is_empty() {
        pdf::UNTITLED_DOCUMENT.to_string()
    } else {
        title
    };

    ExtractedDocument {
        title,
        content: cleaned.clone(),
        plain_text: cleaned,
    }
}

async fn extract_pdf(bytes: Vec<u8>, file_name: &str) -> Result<ExtractedDocument> {
    // A panic inside the PDF parser surfaces as a JoinError.
    let raw = tokio::task::spawn_blocking(move || pdf::extract_pdf_text(&bytes))
        .await
        .map_err(|e| IngestError::PdfParse(format!("parser aborted: {}", e)))??;

    let text = normalize(&raw);
    Ok(ExtractedDocument {
        title: pdf::title_from_file_name(file_name),
        content: text.clone(),
        plain_text: text,
    })
}

/// Derives reading time, tags, and headings from an extracted document.
pub fn derive_metadata(
    doc: &ExtractedDocument,
    content_type: ContentType,
    words_per_minute: u32,
) -> DocumentMetadata {
    let tags: BTreeSet<String> = tagger::tag(&doc.title, &doc.plain_text);
    let headings = if content_type.is_markup() {
        extract_headings(&doc.content)
    } else {
        Vec::new()
    };

    DocumentMetadata {
        reading_time_minutes: estimate_with_rate(&doc.plain_text, words_per_minute),
        tags,
        headings,
    }
}
