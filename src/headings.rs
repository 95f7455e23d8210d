//! Table-of-contents extraction from document markup.

use scraper::{Html, Selector};

use crate::models::Heading;

const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";

/// Collect `h1`..`h6` elements of `markup` in document order.
///
/// Headings without an `id` attribute get a synthetic `heading-<n>` id, where
/// `n` counts only the headings that lacked one.
pub fn extract_headings(markup: &str) -> Vec<Heading> {
    if markup.trim().is_empty() {
        return Vec::new();
    }
    let Ok(selector) = Selector::parse(HEADING_SELECTOR) else {
        return Vec::new();
    };

    let fragment = Html::parse_fragment(markup);
    let mut missing_ids = 0usize;
    let mut headings = Vec::new();

    for el in fragment.select(&selector) {
        let Some(level) = heading_level(el.value().name()) else {
            continue;
        };
        let text: String = el.text().collect();
        let id = match el.value().attr("id").filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => {
                let id = format!("heading-{}", missing_ids);
                missing_ids += 1;
                id
            }
        };
        headings.push(Heading { level, text, id });
    }

    headings
}

fn heading_level(tag: &str) -> Option<u8> {
    let rank = tag.strip_prefix('h')?.parse::<u8>().ok()?;
    (1..=6).contains(&rank).then_some(rank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_no_headings() {
        assert!(extract_headings("").is_empty());
        assert!(extract_headings("just text, no markup").is_empty());
    }

    #[test]
    fn keeps_document_order_and_levels() {
        let html = "<h1>Top</h1><p>x</p><h3>Deep</h3><h2>Mid</h2>";
        let hs = extract_headings(html);
        let levels: Vec<u8> = hs.iter().map(|h| h.level).collect();
        assert_eq!(levels, vec![1, 3, 2]);
        assert_eq!(hs[1].text, "Deep");
    }

    #[test]
    fn synthetic_ids_only_count_missing_ones() {
        let html = r#"<h2>A</h2><h2 id="intro">B</h2><h2>C</h2>"#;
        let ids: Vec<String> = extract_headings(html).into_iter().map(|h| h.id).collect();
        assert_eq!(ids, vec!["heading-0", "intro", "heading-1"]);
    }

    #[test]
    fn text_is_flattened() {
        let html = "<h2>Hello <em>nested</em> world</h2>";
        assert_eq!(extract_headings(html)[0].text, "Hello nested world");
    }

    #[test]
    fn empty_id_is_treated_as_missing() {
        let html = r#"<h4 id="">X</h4>"#;
        assert_eq!(extract_headings(html)[0].id, "heading-0");
    }
}
