//! URL fetching for article extraction.
//!
//! One GET per request, bounded by the configured timeout. Every transport
//! failure, timeout, or non-2xx status is an [`IngestError::Fetch`]; there is
//! no retry here.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::error::{IngestError, Result};
use crate::models::ExtractedDocument;
use crate::readability::{extract_from_html, ReadabilityStrategy};

/// Builds the shared HTTP client with the configured timeout and User-Agent.
pub fn build_client(config: &FetchConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(|e| IngestError::Fetch(format!("could not build HTTP client: {}", e)))
}

/// Largest page body read before giving up.
pub const MAX_HTML_BYTES: usize = 8 * 1024 * 1024;

/// Fetches `url` and returns the response body as text.
pub async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String> {
    fetch_html_limited(client, url, MAX_HTML_BYTES).await
}

/// Like [`fetch_html`], failing once the body grows past `max_bytes`.
pub async fn fetch_html_limited(
    client: &reqwest::Client,
    url: &str,
    max_bytes: usize,
) -> Result<String> {
    let mut response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
        .send()
        .await
        .map_err(|e| describe_transport_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        warn!(url, status = status.as_u16(), "fetch returned non-success status");
        return Err(IngestError::Fetch(format!("HTTP status {} for {}", status, url)));
    }

    if let Some(len) = response.content_length() {
        if len > max_bytes as u64 {
            return Err(too_large(url, max_bytes));
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| describe_transport_error(url, e))?
    {
        if body.len() + chunk.len() > max_bytes {
            return Err(too_large(url, max_bytes));
        }
        body.extend_from_slice(&chunk);
    }
    debug!(url, bytes = body.len(), "fetched page");
    Ok(String::from_utf8_lossy(&body).into_owned())
}

fn too_large(url: &str, max_bytes: usize) -> IngestError {
    warn!(url, max_bytes, "page body too large");
    IngestError::Fetch(format!("response from {} exceeds {} bytes", url, max_bytes))
}

fn describe_transport_error(url: &str, err: reqwest::Error) -> IngestError {
    if err.is_timeout() {
        warn!(url, "fetch timed out");
        IngestError::Fetch(format!("request to {} timed out", url))
    } else {
        warn!(url, error = %err, "fetch failed");
        IngestError::Fetch(format!("request to {} failed: {}", url, err))
    }
}

/// Fetches `url` and isolates its main article with `strategy`.
pub async fn extract_article(
    client: &reqwest::Client,
    url: &str,
    strategy: &dyn ReadabilityStrategy,
    min_content_chars: usize,
) -> Result<ExtractedDocument> {
    let html = fetch_html(client, url).await?;
    extract_from_html(&html, strategy, min_content_chars)
}
