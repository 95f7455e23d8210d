//! Document and tag storage.
//!
//! Keyed CRUD over SQLite, every operation scoped by the owning user id.
//! Rows belonging to another user behave exactly like missing rows, so the
//! error for both is "not found".

use anyhow::{bail, Context, Result};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::models::{ContentType, Document, DocumentSummary, IngestionResult, Tag};

/// Color given to tags created without one.
pub const DEFAULT_TAG_COLOR: &str = "#3b82f6";

/// Partial update of the mutable document fields.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    pub reading_progress: Option<u8>,
    pub is_read: Option<bool>,
}

/// A document with its tag names, as shown by the reader.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentWithTags {
    #[serde(flatten)]
    pub document: Document,
    pub tags: Vec<String>,
}

/// Stores an ingested document for `user_id` and links its auto-tags.
///
/// Document row and tag links are written in one transaction.
pub async fn create_document(
    pool: &SqlitePool,
    user_id: &str,
    ingested: &IngestionResult,
) -> Result<String> {
    require_user(user_id)?;
    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    let mut tx = pool.begin().await?;
    sqlx::query(
        r#"
        INSERT INTO documents (id, user_id, title, content, original_url, content_type, reading_time, is_read, reading_progress, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 0, 0, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&ingested.title)
    .bind(&ingested.content)
    .bind(&ingested.original_url)
    .bind(ingested.content_type.as_str())
    .bind(i64::from(ingested.reading_time_minutes))
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to insert document")?;

    for name in &ingested.tags {
        let tag_id = ensure_tag(&mut tx, user_id, name, DEFAULT_TAG_COLOR).await?;
        link_tag(&mut tx, &id, &tag_id).await?;
    }
    tx.commit().await?;

    debug!(document_id = %id, user_id, tags = ingested.tags.len(), "stored document");
    Ok(id)
}

pub async fn list_documents(pool: &SqlitePool, user_id: &str) -> Result<Vec<DocumentSummary>> {
    let rows = sqlx::query(
        "SELECT id, title, content_type, reading_time, is_read, reading_progress, updated_at FROM documents WHERE user_id = ? ORDER BY updated_at DESC, created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(DocumentSummary {
                id: row.get("id"),
                title: row.get("title"),
                content_type: parse_content_type(row)?,
                reading_time: reading_time(row),
                is_read: row.get::<i64, _>("is_read") != 0,
                reading_progress: progress(row),
                updated_at: format_ts_iso(row.get("updated_at")),
            })
        })
        .collect()
}

pub async fn get_document(pool: &SqlitePool, user_id: &str, id: &str) -> Result<Document> {
    let row = sqlx::query(
        "SELECT id, user_id, title, content, original_url, content_type, reading_time, is_read, reading_progress, created_at, updated_at FROM documents WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        bail!("document not found: {}", id);
    };

    Ok(Document {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        content: row.get("content"),
        original_url: row.get("original_url"),
        content_type: parse_content_type(&row)?,
        reading_time: reading_time(&row),
        is_read: row.get::<i64, _>("is_read") != 0,
        reading_progress: progress(&row),
        created_at: format_ts_iso(row.get("created_at")),
        updated_at: format_ts_iso(row.get("updated_at")),
    })
}

/// Document plus its tag names.
pub async fn get_document_with_tags(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<DocumentWithTags> {
    let document = get_document(pool, user_id, id).await?;
    let tags = document_tags(pool, user_id, id).await?;
    Ok(DocumentWithTags { document, tags })
}

/// Updates title and read-progress fields. Content is never updated.
pub async fn update_document(
    pool: &SqlitePool,
    user_id: &str,
    id: &str,
    update: &DocumentUpdate,
) -> Result<()> {
    if let Some(p) = update.reading_progress {
        if p > 100 {
            bail!("invalid reading progress {}: must be between 0 and 100", p);
        }
    }
    if let Some(ref t) = update.title {
        if t.trim().is_empty() {
            bail!("invalid title: must not be empty");
        }
    }

    let result = sqlx::query(
        r#"
        UPDATE documents SET
            title = COALESCE(?, title),
            reading_progress = COALESCE(?, reading_progress),
            is_read = COALESCE(?, is_read),
            updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(update.title.as_deref().map(str::trim))
    .bind(update.reading_progress.map(i64::from))
    .bind(update.is_read.map(i64::from))
    .bind(chrono::Utc::now().timestamp())
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        bail!("document not found: {}", id);
    }
    Ok(())
}

/// Deletes a document together with its highlights, notes, and tag links.
pub async fn delete_document(pool: &SqlitePool, user_id: &str, id: &str) -> Result<()> {
    let mut tx = pool.begin().await?;

    let owned: Option<String> =
        sqlx::query_scalar("SELECT id FROM documents WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
    if owned.is_none() {
        bail!("document not found: {}", id);
    }

    for table in ["highlights", "notes", "document_tags"] {
        sqlx::query(&format!("DELETE FROM {} WHERE document_id = ?", table))
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    debug!(document_id = %id, user_id, "deleted document");
    Ok(())
}

// ============ Tags ============

/// Creates a tag, or returns the existing one with the same name.
pub async fn create_tag(
    pool: &SqlitePool,
    user_id: &str,
    name: &str,
    color: Option<&str>,
) -> Result<Tag> {
    require_user(user_id)?;
    let name = name.trim();
    if name.is_empty() {
        bail!("invalid tag name: must not be empty");
    }
    let color = color.unwrap_or(DEFAULT_TAG_COLOR);
    if !is_hex_color(color) {
        bail!("invalid tag color '{}': expected #rrggbb", color);
    }

    let mut conn = pool.acquire().await?;
    let id = ensure_tag(&mut conn, user_id, name, color).await?;
    let row = sqlx::query("SELECT id, user_id, name, color FROM tags WHERE id = ?")
        .bind(&id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(tag_from_row(&row))
}

pub async fn list_tags(pool: &SqlitePool, user_id: &str) -> Result<Vec<Tag>> {
    let rows = sqlx::query("SELECT id, user_id, name, color FROM tags WHERE user_id = ? ORDER BY name ASC")
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(tag_from_row).collect())
}

/// Deletes a tag and unlinks it from every document.
pub async fn delete_tag(pool: &SqlitePool, user_id: &str, id: &str) -> Result<()> {
    let mut tx = pool.begin().await?;
    let owned: Option<String> = sqlx::query_scalar("SELECT id FROM tags WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
    if owned.is_none() {
        bail!("tag not found: {}", id);
    }
    sqlx::query("DELETE FROM document_tags WHERE tag_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}

/// Links tags (by name, created on demand) to a document the user owns.
pub async fn attach_tags(
    pool: &SqlitePool,
    user_id: &str,
    document_id: &str,
    names: &[String],
) -> Result<()> {
    let mut tx = pool.begin().await?;
    let owned: Option<String> =
        sqlx::query_scalar("SELECT id FROM documents WHERE id = ? AND user_id = ?")
            .bind(document_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
    if owned.is_none() {
        bail!("document not found: {}", document_id);
    }
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        let tag_id = ensure_tag(&mut tx, user_id, name, DEFAULT_TAG_COLOR).await?;
        link_tag(&mut tx, document_id, &tag_id).await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Tag names linked to a document, alphabetically.
pub async fn document_tags(pool: &SqlitePool, user_id: &str, document_id: &str) -> Result<Vec<String>> {
    let names = sqlx::query_scalar(
        r#"
        SELECT t.name FROM tags t
        JOIN document_tags dt ON dt.tag_id = t.id
        JOIN documents d ON d.id = dt.document_id
        WHERE dt.document_id = ? AND d.user_id = ?
        ORDER BY t.name ASC
        "#,
    )
    .bind(document_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(names)
}

async fn ensure_tag(
    conn: &mut SqliteConnection,
    user_id: &str,
    name: &str,
    color: &str,
) -> Result<String> {
    sqlx::query(
        "INSERT INTO tags (id, user_id, name, color, created_at) VALUES (?, ?, ?, ?, ?) ON CONFLICT(user_id, name) DO NOTHING",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(name)
    .bind(color)
    .bind(chrono::Utc::now().timestamp())
    .execute(&mut *conn)
    .await?;

    let id: String = sqlx::query_scalar("SELECT id FROM tags WHERE user_id = ? AND name = ?")
        .bind(user_id)
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;
    Ok(id)
}

async fn link_tag(conn: &mut SqliteConnection, document_id: &str, tag_id: &str) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO document_tags (document_id, tag_id) VALUES (?, ?)")
        .bind(document_id)
        .bind(tag_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

fn require_user(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        bail!("invalid user id: must not be empty");
    }
    Ok(())
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn tag_from_row(row: &SqliteRow) -> Tag {
    Tag {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        color: row.get("color"),
    }
}

fn parse_content_type(row: &SqliteRow) -> Result<ContentType> {
    let raw: String = row.get("content_type");
    raw.parse::<ContentType>().map_err(anyhow::Error::msg)
}

fn reading_time(row: &SqliteRow) -> Option<u32> {
    row.get::<Option<i64>, _>("reading_time")
        .and_then(|m| u32::try_from(m).ok())
}

fn progress(row: &SqliteRow) -> u8 {
    let p: i64 = row.get("reading_progress");
    p.clamp(0, 100) as u8
}

pub(crate) fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert!(is_hex_color("#3b82f6"));
        assert!(is_hex_color("#FFFFFF"));
        assert!(!is_hex_color("3b82f6"));
        assert!(!is_hex_color("#3b82f"));
        assert!(!is_hex_color("#zzzzzz"));
    }

    #[test]
    fn timestamps_render_as_iso8601() {
        assert_eq!(format_ts_iso(0), "1970-01-01T00:00:00Z");
    }
}
