//! Core data models used throughout Marginalia.
//!
//! These types represent the sources, extracted documents, derived metadata,
//! and stored records that flow through ingestion and annotation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// External source handed to the ingestion pipeline. Consumed once.
#[derive(Debug, Clone)]
pub enum RawSource {
    Url(String),
    PdfBytes { bytes: Vec<u8>, file_name: String },
    PlainText(String),
}

impl RawSource {
    pub fn content_type(&self) -> ContentType {
        match self {
            RawSource::Url(_) => ContentType::Url,
            RawSource::PdfBytes { .. } => ContentType::Pdf,
            RawSource::PlainText(_) => ContentType::Text,
        }
    }
}

/// How a document entered the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Url,
    Pdf,
    Text,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Url => "url",
            ContentType::Pdf => "pdf",
            ContentType::Text => "text",
        }
    }

    /// Whether stored content carries structural markup.
    pub fn is_markup(&self) -> bool {
        matches!(self, ContentType::Url)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "url" => Ok(ContentType::Url),
            "pdf" => Ok(ContentType::Pdf),
            "text" => Ok(ContentType::Text),
            other => Err(format!("unknown content type: '{}'", other)),
        }
    }
}

/// Output of an extractor, before metadata derivation.
///
/// `content` holds sanitized markup for URL sources and equals `plain_text`
/// for PDF and pasted-text sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub title: String,
    pub content: String,
    pub plain_text: String,
}

/// A table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub id: String,
}

/// Metadata derived from a document's text. Recomputed wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    pub reading_time_minutes: u32,
    pub tags: BTreeSet<String>,
    pub headings: Vec<Heading>,
}

/// Ingestion response handed to the storage layer (or printed by the CLI).
#[derive(Debug, Clone, Serialize)]
pub struct IngestionResult {
    pub title: String,
    pub content: String,
    pub content_type: ContentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
    pub reading_time_minutes: u32,
    pub tags: BTreeSet<String>,
    pub headings: Vec<Heading>,
}

/// Highlight colors offered by the reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    #[default]
    Yellow,
    Red,
    Green,
}

impl HighlightColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Red => "red",
            HighlightColor::Green => "green",
        }
    }
}

impl fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HighlightColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yellow" => Ok(HighlightColor::Yellow),
            "red" => Ok(HighlightColor::Red),
            "green" => Ok(HighlightColor::Green),
            other => Err(format!(
                "unknown highlight color: '{}'. Must be yellow, red, or green.",
                other
            )),
        }
    }
}

/// Document stored in SQLite.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub original_url: Option<String>,
    pub content_type: ContentType,
    pub reading_time: Option<u32>,
    pub is_read: bool,
    pub reading_progress: u8,
    pub created_at: String, // ISO8601
    pub updated_at: String, // ISO8601
}

/// Summary row for library listings.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub content_type: ContentType,
    pub reading_time: Option<u32>,
    pub is_read: bool,
    pub reading_progress: u8,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Highlight {
    pub id: String,
    pub document_id: String,
    pub user_id: String,
    pub text: String,
    pub color: HighlightColor,
    pub start_offset: usize,
    pub end_offset: usize,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Note {
    pub id: String,
    pub document_id: String,
    pub user_id: String,
    pub content: String,
    pub offset: usize,
    pub created_at: String,
    pub updated_at: String,
}
