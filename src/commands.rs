//! CLI command runners.
//!
//! Each runner opens its own pool, does one thing, and prints to stdout.
//! Structured results (ingestion output, created records) are printed as
//! pretty JSON; listings are printed as aligned text.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::anchor::plain_text_projection;
use crate::annotations;
use crate::config::Config;
use crate::db;
use crate::headings::extract_headings;
use crate::ingest::{IngestRequest, Ingestor};
use crate::library::{self, DocumentUpdate};
use crate::models::{HighlightColor, IngestionResult};

/// Source selector for `marginalia ingest`.
#[derive(Debug, Clone)]
pub enum IngestInput {
    Url(String),
    Text(String),
    Pdf(std::path::PathBuf),
}

#[derive(Serialize)]
struct SavedIngestion<'a> {
    id: &'a str,
    #[serde(flatten)]
    result: &'a IngestionResult,
}

/// Ingests one source and prints the result as JSON. With a user id the
/// result is also stored in that user's library.
pub async fn run_ingest(config: &Config, input: IngestInput, user: Option<&str>) -> Result<()> {
    let request = match input {
        IngestInput::Url(url) => IngestRequest::Url { url },
        IngestInput::Text(text) => IngestRequest::Text { text },
        IngestInput::Pdf(path) => IngestRequest::File {
            file_bytes: std::fs::read(&path)
                .with_context(|| format!("Failed to read PDF: {}", path.display()))?,
            file_name: file_name_of(&path),
        },
    };

    let ingestor = Ingestor::new(config)?;
    let result = ingestor.ingest_request(request).await?;

    match user {
        Some(user_id) => {
            let pool = db::connect(config).await?;
            let id = library::create_document(&pool, user_id, &result).await?;
            pool.close().await;
            let saved = SavedIngestion { id: &id, result: &result };
            println!("{}", serde_json::to_string_pretty(&saved)?);
        }
        None => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub async fn run_list(config: &Config, user_id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let docs = library::list_documents(&pool, user_id).await?;
    pool.close().await;

    if docs.is_empty() {
        println!("No documents.");
        return Ok(());
    }
    for doc in &docs {
        let minutes = doc
            .reading_time
            .map(|m| format!("{} min", m))
            .unwrap_or_else(|| "-".to_string());
        let read = if doc.is_read { "read" } else { "unread" };
        println!(
            "{}  {:<4}  {:>7}  {:>3}%  {:<6}  {}",
            doc.id, doc.content_type, minutes, doc.reading_progress, read, doc.title
        );
    }
    Ok(())
}

/// Prints a stored document with its table of contents and annotations.
pub async fn run_show(config: &Config, user_id: &str, id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let doc = library::get_document_with_tags(&pool, user_id, id).await?;
    let highlights = annotations::list_highlights(&pool, user_id, id).await?;
    let notes = annotations::list_notes(&pool, user_id, id).await?;
    pool.close().await;

    let d = &doc.document;
    println!("--- Document ---");
    println!("id:           {}", d.id);
    println!("title:        {}", d.title);
    println!("content_type: {}", d.content_type);
    if let Some(ref url) = d.original_url {
        println!("original_url: {}", url);
    }
    if let Some(minutes) = d.reading_time {
        println!("reading_time: {} min", minutes);
    }
    println!("progress:     {}%{}", d.reading_progress, if d.is_read { " (read)" } else { "" });
    println!("tags:         {}", doc.tags.join(", "));
    println!("created_at:   {}", d.created_at);
    println!("updated_at:   {}", d.updated_at);
    println!();

    if d.content_type.is_markup() {
        let headings = extract_headings(&d.content);
        println!("--- Contents ({}) ---", headings.len());
        for h in &headings {
            let indent = "  ".repeat(usize::from(h.level.saturating_sub(1)));
            println!("{}{} (#{})", indent, h.text.trim(), h.id);
        }
        println!();
    }

    println!("--- Text ---");
    println!("{}", plain_text_projection(&d.content, d.content_type));
    println!();

    println!("--- Highlights ({}) ---", highlights.len());
    for h in &highlights {
        println!("[{}..{}] {} {:?} ({})", h.start_offset, h.end_offset, h.color, h.text, h.id);
    }
    println!();

    println!("--- Notes ({}) ---", notes.len());
    for n in &notes {
        println!("[@{}] {} ({})", n.offset, n.content, n.id);
    }
    Ok(())
}

pub async fn run_progress(
    config: &Config,
    user_id: &str,
    id: &str,
    percent: u8,
    mark_read: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let update = DocumentUpdate {
        title: None,
        reading_progress: Some(percent),
        is_read: mark_read.then_some(true),
    };
    library::update_document(&pool, user_id, id, &update).await?;
    pool.close().await;
    println!("Progress for {} set to {}%.", id, percent);
    Ok(())
}

pub async fn run_delete(config: &Config, user_id: &str, id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    library::delete_document(&pool, user_id, id).await?;
    pool.close().await;
    println!("Deleted {}.", id);
    Ok(())
}

pub async fn run_highlight(
    config: &Config,
    user_id: &str,
    document_id: &str,
    start: usize,
    end: usize,
    color: HighlightColor,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let highlight =
        annotations::highlight_selection(&pool, user_id, document_id, start, end, color).await?;
    pool.close().await;
    println!("{}", serde_json::to_string_pretty(&highlight)?);
    Ok(())
}

pub async fn run_note(
    config: &Config,
    user_id: &str,
    document_id: &str,
    content: &str,
    offset: Option<usize>,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let note = annotations::create_note(&pool, user_id, document_id, content, offset).await?;
    pool.close().await;
    println!("{}", serde_json::to_string_pretty(&note)?);
    Ok(())
}

pub async fn run_tags(config: &Config, user_id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let tags = library::list_tags(&pool, user_id).await?;
    pool.close().await;
    for tag in &tags {
        println!("{}  {}", tag.color, tag.name);
    }
    Ok(())
}
