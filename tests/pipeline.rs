use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;

use marginalia::anchor::{anchor_selection, plain_text_projection, slice_chars};
use marginalia::config::Config;
use marginalia::error::IngestError;
use marginalia::fetch;
use marginalia::ingest::{IngestRequest, Ingestor};
use marginalia::models::{ContentType, RawSource};

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

const ARTICLE_PAGE: &str = r##"<!doctype html>
<html>
<head>
  <title>Site Name | Ignored</title>
  <meta property="og:title" content="Understanding Ownership">
  <script>window.tracking = true;</script>
</head>
<body>
  <nav class="menu"><a href="/">Home</a> <a href="/about">About</a> <a href="/blog">Blog</a></nav>
  <article class="post-content">
    <h1>Understanding Ownership</h1>
    <p>Ownership is the set of rules that governs how a program manages memory. Every value has a single owner, and the value is dropped when the owner goes out of scope.</p>
    <h2 id="borrowing">Borrowing</h2>
    <p>References let code use a value without taking ownership of it. The compiler checks that references never outlive the data they point to, so software written this way avoids dangling pointers.</p>
    <h2>Lifetimes</h2>
    <p>Lifetimes name the scopes that references are valid for. Most of the time they are inferred, and the programming model stays simple for everyday code.</p>
    <script>alert("x")</script>
    <a href="javascript:alert(1)" onclick="steal()">click</a>
  </article>
  <aside class="sidebar"><a href="/x">Related</a></aside>
  <footer>Copyright</footer>
</body>
</html>"##;

const SPARSE_PAGE: &str = r#"<html><head><title>Nothing here</title></head>
<body><nav><a href="/">Home</a></nav><div>Hi.</div></body></html>"#;

fn config_with_timeout(secs: u64) -> Config {
    let mut cfg = Config::minimal();
    cfg.fetch.timeout_secs = secs;
    cfg
}

#[tokio::test]
async fn url_ingestion_extracts_article() {
    let app = Router::new().route("/post", get(|| async { Html(ARTICLE_PAGE) }));
    let addr = serve(app).await;

    let ingestor = Ingestor::new(&Config::minimal()).unwrap();
    let url = format!("http://{}/post", addr);
    let out = ingestor.ingest(RawSource::Url(url.clone())).await.unwrap();

    assert_eq!(out.title, "Understanding Ownership");
    assert_eq!(out.content_type, ContentType::Url);
    assert_eq!(out.original_url.as_deref(), Some(url.as_str()));
    assert!(out.content.contains("Ownership is the set of rules"));
    assert!(!out.content.contains("<script"));
    assert!(!out.content.contains("javascript:"));
    assert!(!out.content.contains("onclick"));
    assert!(!out.content.contains("Copyright"));
    assert!(out.tags.contains("Technology"));
    assert!(out.reading_time_minutes >= 1);

    let ids: Vec<&str> = out.headings.iter().map(|h| h.id.as_str()).collect();
    assert!(ids.contains(&"borrowing"));
    let lifetimes = out
        .headings
        .iter()
        .find(|h| h.text.contains("Lifetimes"))
        .unwrap();
    assert_eq!(lifetimes.level, 2);
    assert!(lifetimes.id.starts_with("heading-"));
}

#[tokio::test]
async fn highlight_anchors_into_extracted_article() {
    let app = Router::new().route("/post", get(|| async { Html(ARTICLE_PAGE) }));
    let addr = serve(app).await;

    let ingestor = Ingestor::new(&Config::minimal()).unwrap();
    let out = ingestor
        .ingest(RawSource::Url(format!("http://{}/post", addr)))
        .await
        .unwrap();

    let rendered = plain_text_projection(&out.content, out.content_type);
    let phrase = "single owner";
    let byte_end = rendered.find(phrase).unwrap() + phrase.len();
    let char_end = rendered[..byte_end].chars().count();
    let range = anchor_selection(&rendered, phrase, char_end).unwrap();
    assert_eq!(slice_chars(&rendered, range), phrase);
}

#[tokio::test]
async fn server_error_is_fetch_error() {
    let app = Router::new().route(
        "/broken",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = serve(app).await;

    let ingestor = Ingestor::new(&Config::minimal()).unwrap();
    let err = ingestor
        .ingest(RawSource::Url(format!("http://{}/broken", addr)))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Fetch(_)), "{:?}", err);
    assert_eq!(err.code(), "fetch_error");
}

#[tokio::test]
async fn slow_server_times_out() {
    let app = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Html(ARTICLE_PAGE)
        }),
    );
    let addr = serve(app).await;

    let ingestor = Ingestor::new(&config_with_timeout(1)).unwrap();
    let err = ingestor
        .ingest(RawSource::Url(format!("http://{}/slow", addr)))
        .await
        .unwrap_err();
    match err {
        IngestError::Fetch(msg) => assert!(msg.contains("timed out"), "{}", msg),
        other => panic!("expected fetch error, got {:?}", other),
    }
}

#[tokio::test]
async fn oversized_body_is_fetch_error() {
    let app = Router::new().route("/big", get(|| async { Html("x".repeat(64 * 1024)) }));
    let addr = serve(app).await;

    let client = fetch::build_client(&Config::minimal().fetch).unwrap();
    let url = format!("http://{}/big", addr);
    let err = fetch::fetch_html_limited(&client, &url, 1024).await.unwrap_err();
    match err {
        IngestError::Fetch(msg) => assert!(msg.contains("exceeds 1024 bytes"), "{}", msg),
        other => panic!("expected fetch error, got {:?}", other),
    }

    let body = fetch::fetch_html_limited(&client, &url, 64 * 1024).await.unwrap();
    assert_eq!(body.len(), 64 * 1024);
}

#[tokio::test]
async fn unreachable_host_is_fetch_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let ingestor = Ingestor::new(&Config::minimal()).unwrap();
    let err = ingestor
        .ingest(RawSource::Url(format!("http://{}/", addr)))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Fetch(_)));
}

#[tokio::test]
async fn sparse_page_is_extraction_error() {
    let app = Router::new().route("/empty", get(|| async { Html(SPARSE_PAGE) }));
    let addr = serve(app).await;

    let ingestor = Ingestor::new(&Config::minimal()).unwrap();
    let err = ingestor
        .ingest(RawSource::Url(format!("http://{}/empty", addr)))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Extraction(_)), "{:?}", err);
}

#[tokio::test]
async fn invalid_request_never_fetches() {
    let ingestor = Ingestor::new(&Config::minimal()).unwrap();
    let err = ingestor
        .ingest_request(IngestRequest::Url {
            url: "mailto:someone@example.com".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "validation_error");
}

/// Minimal valid PDF containing one line of text.
/// Builds body then xref with correct byte offsets so pdf-extract can parse it.
fn minimal_pdf_with_phrase(phrase: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", phrase);
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!(
            "4 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
            stream.len(),
            stream
        )
        .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

#[tokio::test]
async fn pdf_ingestion_extracts_text() {
    let ingestor = Ingestor::new(&Config::minimal()).unwrap();
    let out = ingestor
        .ingest(RawSource::PdfBytes {
            bytes: minimal_pdf_with_phrase("software release notes"),
            file_name: "quarterly-report.pdf".into(),
        })
        .await
        .unwrap();

    assert_eq!(out.title, "quarterly-report");
    assert_eq!(out.content_type, ContentType::Pdf);
    assert!(out.content.contains("software release notes"), "{:?}", out.content);
    assert!(out.headings.is_empty());
    assert_eq!(out.reading_time_minutes, 1);
    assert!(out.tags.contains("Technology"));
}

#[tokio::test]
async fn truncated_pdf_is_parse_error() {
    let mut bytes = minimal_pdf_with_phrase("cut short");
    bytes.truncate(40);

    let ingestor = Ingestor::new(&Config::minimal()).unwrap();
    let err = ingestor
        .ingest(RawSource::PdfBytes {
            bytes,
            file_name: "broken.pdf".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::PdfParse(_)), "{:?}", err);
}
