//! Highlight and note storage.
//!
//! Anchors are validated against the plain-text projection of the stored
//! document before they are written, so every stored range points at text
//! that actually exists in the document.

use anyhow::{bail, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::anchor::{self, AnchorRange};
use crate::library::format_ts_iso;
use crate::models::{ContentType, Highlight, HighlightColor, Note};

/// Loads the projection that offsets for `document_id` are measured against.
pub async fn document_projection(
    pool: &SqlitePool,
    user_id: &str,
    document_id: &str,
) -> Result<String> {
    let row = sqlx::query("SELECT content, content_type FROM documents WHERE id = ? AND user_id = ?")
        .bind(document_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        bail!("document not found: {}", document_id);
    };
    let content: String = row.get("content");
    let content_type = row
        .get::<String, _>("content_type")
        .parse::<ContentType>()
        .map_err(anyhow::Error::msg)?;
    Ok(anchor::plain_text_projection(&content, content_type))
}

// ============ Highlights ============

/// Stores a highlight whose text and offsets were supplied by the client.
pub async fn create_highlight(
    pool: &SqlitePool,
    user_id: &str,
    document_id: &str,
    text: &str,
    range: AnchorRange,
    color: HighlightColor,
) -> Result<Highlight> {
    let rendered = document_projection(pool, user_id, document_id).await?;
    anchor::validate_highlight(&rendered, text, range)?;
    insert_highlight(pool, user_id, document_id, text, range, color).await
}

/// Stores a highlight for the selection `[selection_start, selection_end)`.
///
/// The highlighted text is read back from the document.
pub async fn highlight_selection(
    pool: &SqlitePool,
    user_id: &str,
    document_id: &str,
    selection_start: usize,
    selection_end: usize,
    color: HighlightColor,
) -> Result<Highlight> {
    let rendered = document_projection(pool, user_id, document_id).await?;
    let range = anchor::compute_offsets(&rendered, selection_start, selection_end)?;
    let text = anchor::slice_chars(&rendered, range);
    insert_highlight(pool, user_id, document_id, &text, range, color).await
}

async fn insert_highlight(
    pool: &SqlitePool,
    user_id: &str,
    document_id: &str,
    text: &str,
    range: AnchorRange,
    color: HighlightColor,
) -> Result<Highlight> {
    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        "INSERT INTO highlights (id, document_id, user_id, text, color, start_offset, end_offset, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(document_id)
    .bind(user_id)
    .bind(text)
    .bind(color.as_str())
    .bind(range.start_offset as i64)
    .bind(range.end_offset as i64)
    .bind(now)
    .execute(pool)
    .await?;

    debug!(highlight_id = %id, document_id, start = range.start_offset, end = range.end_offset, "stored highlight");
    Ok(Highlight {
        id,
        document_id: document_id.to_string(),
        user_id: user_id.to_string(),
        text: text.to_string(),
        color,
        start_offset: range.start_offset,
        end_offset: range.end_offset,
        created_at: format_ts_iso(now),
    })
}

/// Highlights on a document, in reading order.
pub async fn list_highlights(
    pool: &SqlitePool,
    user_id: &str,
    document_id: &str,
) -> Result<Vec<Highlight>> {
    let rows = sqlx::query(
        "SELECT id, document_id, user_id, text, color, start_offset, end_offset, created_at FROM highlights WHERE document_id = ? AND user_id = ? ORDER BY start_offset ASC, created_at ASC",
    )
    .bind(document_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(highlight_from_row).collect()
}

pub async fn delete_highlight(pool: &SqlitePool, user_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM highlights WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        bail!("highlight not found: {}", id);
    }
    Ok(())
}

fn highlight_from_row(row: &SqliteRow) -> Result<Highlight> {
    let color = row
        .get::<String, _>("color")
        .parse::<HighlightColor>()
        .map_err(anyhow::Error::msg)?;
    Ok(Highlight {
        id: row.get("id"),
        document_id: row.get("document_id"),
        user_id: row.get("user_id"),
        text: row.get("text"),
        color,
        start_offset: row.get::<i64, _>("start_offset").max(0) as usize,
        end_offset: row.get::<i64, _>("end_offset").max(0) as usize,
        created_at: format_ts_iso(row.get("created_at")),
    })
}

// ============ Notes ============

/// Stores a note. Without an offset the note is pinned to the start.
pub async fn create_note(
    pool: &SqlitePool,
    user_id: &str,
    document_id: &str,
    content: &str,
    offset: Option<usize>,
) -> Result<Note> {
    let content = content.trim();
    if content.is_empty() {
        bail!("invalid note: content must not be empty");
    }
    let rendered = document_projection(pool, user_id, document_id).await?;
    let offset = anchor::note_offset(offset, rendered.chars().count())?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        r#"INSERT INTO notes (id, document_id, user_id, content, "offset", created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(document_id)
    .bind(user_id)
    .bind(content)
    .bind(offset as i64)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Note {
        id,
        document_id: document_id.to_string(),
        user_id: user_id.to_string(),
        content: content.to_string(),
        offset,
        created_at: format_ts_iso(now),
        updated_at: format_ts_iso(now),
    })
}

pub async fn list_notes(pool: &SqlitePool, user_id: &str, document_id: &str) -> Result<Vec<Note>> {
    let rows = sqlx::query(
        r#"SELECT id, document_id, user_id, content, "offset", created_at, updated_at FROM notes WHERE document_id = ? AND user_id = ? ORDER BY "offset" ASC, created_at ASC"#,
    )
    .bind(document_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(note_from_row).collect())
}

/// Replaces a note's text. The position is fixed once created.
pub async fn update_note(pool: &SqlitePool, user_id: &str, id: &str, content: &str) -> Result<()> {
    let content = content.trim();
    if content.is_empty() {
        bail!("invalid note: content must not be empty");
    }
    let result = sqlx::query("UPDATE notes SET content = ?, updated_at = ? WHERE id = ? AND user_id = ?")
        .bind(content)
        .bind(chrono::Utc::now().timestamp())
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        bail!("note not found: {}", id);
    }
    Ok(())
}

pub async fn delete_note(pool: &SqlitePool, user_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM notes WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        bail!("note not found: {}", id);
    }
    Ok(())
}

fn note_from_row(row: &SqliteRow) -> Note {
    Note {
        id: row.get("id"),
        document_id: row.get("document_id"),
        user_id: row.get("user_id"),
        content: row.get("content"),
        offset: row.get::<i64, _>("offset").max(0) as usize,
        created_at: format_ts_iso(row.get("created_at")),
        updated_at: format_ts_iso(row.get("updated_at")),
    }
}
