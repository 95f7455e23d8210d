//! Readability heuristic for isolating the main article of an HTML page.
//!
//! The heuristic is pluggable through [`ReadabilityStrategy`];
//! [`ParagraphDensity`] is the default.
//!
//! # Scoring
//!
//! Paragraph-like nodes (`p`, `pre`, `td`, `blockquote`) with enough text add
//! `1 + commas + min(chars / 100, 3)` to their parent and half of that to
//! their grandparent. Each scored container starts from a tag bonus plus a
//! class/id weight (`article`, `content`, `post`… reward; `nav`, `sidebar`,
//! `comment`, `ad`… penalize), and its total is scaled by `1 - link density`.
//! Pages with no qualifying paragraphs fall back to a block text-density scan.
//!
//! Parsed documents are `!Send`; everything here is synchronous and must not
//! be held across an `.await`.

use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;

use crate::error::{IngestError, Result};
use crate::models::ExtractedDocument;
use crate::normalize::normalize;

/// Title used when a page offers none.
pub const UNTITLED: &str = "Untitled";

/// Default minimum number of characters the chosen region must contain.
pub const DEFAULT_MIN_CONTENT_CHARS: usize = 140;

/// Paragraphs shorter than this do not contribute to scoring.
const MIN_PARAGRAPH_CHARS: usize = 25;

/// Elements removed from the extracted region and never scored. `form` is
/// not listed: some frameworks wrap the whole page in one.
const DROP_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "button", "input", "select", "textarea", "svg",
    "canvas", "template", "object", "embed", "nav", "aside", "footer",
];

const VOID_TAGS: &[&str] = &["br", "hr", "img", "wbr"];

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure", "h1",
    "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "ol", "p", "pre", "section",
    "table", "tr", "ul",
];

const KEPT_ATTRS: &[&str] = &["id", "href", "src", "alt", "title", "colspan", "rowspan"];

const POSITIVE_PATTERNS: &[&str] = &[
    "article", "body", "content", "entry", "hentry", "main", "page", "post", "text", "blog",
    "story",
];

const NEGATIVE_PATTERNS: &[&str] = &[
    "nav",
    "menu",
    "sidebar",
    "footer",
    "banner",
    "cookie",
    "consent",
    "advert",
    "promo",
    "subscribe",
    "newsletter",
    "comment",
    "share",
    "social",
    "related",
    "sponsor",
    "popup",
    "modal",
    "breadcrumb",
    "masthead",
    "widget",
];

/// Short negative markers only matched as whole class/id tokens.
const NEGATIVE_TOKENS: &[&str] = &["ad", "ads"];

/// The region a strategy picked as the article body.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub title: Option<String>,
    pub content: ElementRef<'a>,
    pub score: f64,
}

/// Picks the main content region and best-guess title of a parsed page.
pub trait ReadabilityStrategy: Send + Sync {
    fn score_and_extract<'a>(&self, doc: &'a Html) -> Option<Candidate<'a>>;
}

/// Default strategy: paragraph scoring propagated to containers, weighted by
/// class/id hints and link density.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParagraphDensity;

impl ReadabilityStrategy for ParagraphDensity {
    fn score_and_extract<'a>(&self, doc: &'a Html) -> Option<Candidate<'a>> {
        let title = best_title(doc);
        let (content, score) = score_paragraphs(doc).or_else(|| densest_block(doc))?;
        Some(Candidate {
            title,
            content,
            score,
        })
    }
}

/// Parse `html`, run `strategy`, and turn the chosen region into an
/// [`ExtractedDocument`].
///
/// Fails with [`IngestError::Extraction`] when no region is found or the
/// region holds fewer than `min_content_chars` characters of text.
pub fn extract_from_html(
    html: &str,
    strategy: &dyn ReadabilityStrategy,
    min_content_chars: usize,
) -> Result<ExtractedDocument> {
    let doc = Html::parse_document(html);
    let candidate = strategy
        .score_and_extract(&doc)
        .ok_or_else(|| IngestError::Extraction("no main content region found".to_string()))?;

    let plain_text = readable_text(candidate.content);
    let chars = plain_text.chars().count();
    if chars < min_content_chars {
        return Err(IngestError::Extraction(format!(
            "main content too short ({} chars, need at least {})",
            chars, min_content_chars
        )));
    }

    let mut content = String::new();
    write_clean(candidate.content, true, &mut content);

    let title = candidate
        .title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    Ok(ExtractedDocument {
        title,
        content,
        plain_text,
    })
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn best_title(doc: &Html) -> Option<String> {
    let og = selector(r#"meta[property="og:title"]"#).and_then(|sel| {
        doc.select(&sel)
            .filter_map(|m| m.value().attr("content"))
            .map(collapse_ws)
            .find(|t| !t.is_empty())
    });
    if og.is_some() {
        return og;
    }

    ["article h1", "title", "h1"].iter().find_map(|css| {
        let sel = selector(css)?;
        doc.select(&sel)
            .map(|el| collapse_ws(&el.text().collect::<String>()))
            .find(|t| !t.is_empty())
    })
}

fn class_and_id(el: &ElementRef) -> String {
    let v = el.value();
    let mut out = String::new();
    if let Some(c) = v.attr("class") {
        out.push_str(c);
        out.push(' ');
    }
    if let Some(i) = v.attr("id") {
        out.push_str(i);
    }
    out.to_ascii_lowercase()
}

fn has_negative_hint(hints: &str) -> bool {
    NEGATIVE_PATTERNS.iter().any(|p| hints.contains(p))
        || hints
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|tok| NEGATIVE_TOKENS.contains(&tok))
}

fn has_positive_hint(hints: &str) -> bool {
    POSITIVE_PATTERNS.iter().any(|p| hints.contains(p))
}

fn class_weight(el: &ElementRef) -> f64 {
    let hints = class_and_id(el);
    if hints.is_empty() {
        return 0.0;
    }
    let mut weight = 0.0;
    if has_negative_hint(&hints) {
        weight -= 25.0;
    }
    if has_positive_hint(&hints) {
        weight += 25.0;
    }
    weight
}

/// Boilerplate by class/id, unless the same element also looks like content.
fn is_boilerplate(el: &ElementRef) -> bool {
    let hints = class_and_id(el);
    !hints.is_empty() && has_negative_hint(&hints) && !has_positive_hint(&hints)
}

fn is_dropped(el: &ElementRef) -> bool {
    let name = el.value().name();
    // Page-level wrappers carry site-wide classes and never veto their content.
    if matches!(name, "html" | "body") {
        return false;
    }
    DROP_TAGS.contains(&name) || is_boilerplate(el)
}

fn inside_dropped(el: &ElementRef) -> bool {
    if is_dropped(el) {
        return true;
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| is_dropped(&a))
}

fn tag_bonus(tag: &str) -> f64 {
    match tag {
        "article" => 10.0,
        "main" | "div" => 5.0,
        "section" | "pre" | "td" | "blockquote" => 3.0,
        "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    }
}

fn text_chars(el: &ElementRef) -> usize {
    el.text().map(|t| t.chars().count()).sum()
}

fn link_text_chars(el: &ElementRef) -> usize {
    let Some(sel) = selector("a") else { return 0 };
    el.select(&sel).map(|a| text_chars(&a)).sum()
}

fn link_density(el: &ElementRef) -> f64 {
    let total = text_chars(el);
    if total == 0 {
        return 0.0;
    }
    (link_text_chars(el) as f64 / total as f64).min(1.0)
}

fn score_paragraphs<'a>(doc: &'a Html) -> Option<(ElementRef<'a>, f64)> {
    let para_sel = selector("p, pre, td, blockquote")?;

    // Insertion order is kept so ties resolve to the earliest container.
    let mut index = HashMap::new();
    let mut scored: Vec<(ElementRef<'a>, f64)> = Vec::new();
    let mut add = |el: ElementRef<'a>, amount: f64| {
        let slot = *index.entry(el.id()).or_insert_with(|| {
            scored.push((el, tag_bonus(el.value().name()) + class_weight(&el)));
            scored.len() - 1
        });
        scored[slot].1 += amount;
    };

    for p in doc.select(&para_sel) {
        if inside_dropped(&p) {
            continue;
        }
        let text = collapse_ws(&p.text().collect::<String>());
        let len = text.chars().count();
        if len < MIN_PARAGRAPH_CHARS {
            continue;
        }
        let commas = text.matches(',').count() as f64;
        let score = 1.0 + commas + (len as f64 / 100.0).floor().min(3.0);

        let Some(parent) = p.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        if parent.value().name() == "html" {
            continue;
        }
        add(parent, score);
        if let Some(grand) = parent.parent().and_then(ElementRef::wrap) {
            if grand.value().name() != "html" {
                add(grand, score / 2.0);
            }
        }
    }

    let mut best: Option<(ElementRef<'_>, f64)> = None;
    for (el, raw) in scored {
        let score = raw * (1.0 - link_density(&el));
        if best.as_ref().map_or(true, |(_, s)| score > *s) {
            best = Some((el, score));
        }
    }
    best.filter(|(_, s)| *s > 0.0)
}

/// Fallback for pages whose text is not wrapped in paragraphs.
fn densest_block<'a>(doc: &'a Html) -> Option<(ElementRef<'a>, f64)> {
    let sel = selector("article, main, section, div")?;
    let mut best: Option<(ElementRef<'a>, f64)> = None;

    for el in doc.select(&sel) {
        if inside_dropped(&el) {
            continue;
        }
        let txt = text_chars(&el) as f64;
        let links = link_text_chars(&el) as f64;
        let mut score = txt - 2.0 * links;
        match el.value().name() {
            "article" => score += 500.0,
            "main" => score += 300.0,
            _ => {}
        }
        if links > txt / 2.0 {
            score -= 500.0;
        }
        if score > best.as_ref().map_or(0.0, |(_, s)| *s) {
            best = Some((el, score));
        }
    }
    best
}

/// Block-aware, normalized text of a region, used for metadata derivation.
pub fn readable_text(root: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_text(root, true, &mut out);
    normalize(&out)
}

fn push_text(el: ElementRef<'_>, is_root: bool, out: &mut String) {
    if !is_root && is_dropped(&el) {
        return;
    }
    let name = el.value().name();
    if name == "br" {
        out.push('\n');
        return;
    }
    let block = BLOCK_TAGS.contains(&name);
    if block {
        out.push('\n');
    }
    for child in el.children() {
        match child.value() {
            Node::Text(t) => {
                let starts_ws = t.starts_with(char::is_whitespace);
                let ends_ws = t.ends_with(char::is_whitespace);
                let words = collapse_ws(t);
                if starts_ws {
                    out.push(' ');
                }
                out.push_str(&words);
                if ends_ws && !words.is_empty() {
                    out.push(' ');
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    push_text(child_el, false, out);
                }
            }
            _ => {}
        }
    }
    if block {
        out.push('\n');
    }
}

/// Serialize `el` with boilerplate removed and only safe attributes kept.
fn write_clean(el: ElementRef<'_>, is_root: bool, out: &mut String) {
    if !is_root && is_dropped(&el) {
        return;
    }
    let name = el.value().name();
    out.push('<');
    out.push_str(name);
    for (key, value) in el.value().attrs() {
        if !KEPT_ATTRS.contains(&key) {
            continue;
        }
        if (key == "href" || key == "src")
            && value.trim_start().to_ascii_lowercase().starts_with("javascript:")
        {
            continue;
        }
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        escape_into(value, true, out);
        out.push('"');
    }
    out.push('>');
    if VOID_TAGS.contains(&name) {
        return;
    }
    for child in el.children() {
        match child.value() {
            Node::Text(t) => escape_into(t, false, out),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    write_clean(child_el, false, out);
                }
            }
            _ => {}
        }
    }
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn escape_into(s: &str, attr: bool, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}
