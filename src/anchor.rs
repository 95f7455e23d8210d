//! Character-offset anchors for highlights and notes.
//!
//! Offsets index the *plain-text projection* of a document's content: the
//! text a reader sees, with markup stripped, counted in Unicode scalar values.
//! For markup documents the projection is the concatenation of every text
//! node in document order, which matches what a browser selection range
//! reports when measured from the content root. For PDF and pasted text the
//! content is already plain and is its own projection.
//!
//! Anchors are only stable while content is unchanged. Stored documents are
//! never re-rendered with different content, so offsets computed here stay
//! valid for the lifetime of the document.

use scraper::Html;
use serde::Serialize;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::models::ContentType;

/// A validated `[start_offset, end_offset)` range in the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnchorRange {
    pub start_offset: usize,
    pub end_offset: usize,
}

impl AnchorRange {
    /// Zero for a reversed range.
    pub fn len(&self) -> usize {
        self.end_offset.saturating_sub(self.start_offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The rendered text that offsets are measured against.
pub fn plain_text_projection(content: &str, content_type: ContentType) -> String {
    if !content_type.is_markup() {
        return content.to_string();
    }
    Html::parse_fragment(content).root_element().text().collect()
}

/// Anchor a selection given as `[selection_start, selection_end)` char
/// indices into `rendered`.
///
/// Backward selections (end before start) are normalized. A zero-length
/// selection is [`IngestError::EmptySelection`]; indices past the end of the
/// text are a validation error.
pub fn compute_offsets(
    rendered: &str,
    selection_start: usize,
    selection_end: usize,
) -> Result<AnchorRange> {
    let (start, end) = if selection_start <= selection_end {
        (selection_start, selection_end)
    } else {
        (selection_end, selection_start)
    };
    if start == end {
        return Err(IngestError::EmptySelection);
    }

    let len = rendered.chars().count();
    if end > len {
        return Err(IngestError::Validation(format!(
            "selection end {} is beyond the document text ({} chars)",
            end, len
        )));
    }

    let selected_len = end - start;
    Ok(AnchorRange {
        start_offset: start,
        end_offset: start + selected_len,
    })
}

/// Anchor `selected_text` that ends at `selection_end` (a char index into
/// `rendered`).
///
/// Measures all text preceding the selection end and steps back by the
/// length of the selected text, then checks that the projection really holds
/// that text at the computed range.
pub fn anchor_selection(
    rendered: &str,
    selected_text: &str,
    selection_end: usize,
) -> Result<AnchorRange> {
    let selected_len = selected_text.chars().count();
    if selected_len == 0 {
        return Err(IngestError::EmptySelection);
    }

    let preceding_len = rendered.chars().take(selection_end).count();
    if preceding_len < selection_end {
        return Err(IngestError::Validation(format!(
            "selection end {} is beyond the document text ({} chars)",
            selection_end, preceding_len
        )));
    }
    let start = preceding_len.checked_sub(selected_len).ok_or_else(|| {
        IngestError::Validation("selected text is longer than the text before the selection end".into())
    })?;

    let range = compute_offsets(rendered, start, selection_end)?;
    if slice_chars(rendered, range) != selected_text {
        return Err(IngestError::Validation(
            "selected text does not match the document at the selection".into(),
        ));
    }
    Ok(range)
}

/// Verify that a caller-supplied range and text agree with `rendered`.
pub fn validate_highlight(rendered: &str, text: &str, range: AnchorRange) -> Result<()> {
    let checked = compute_offsets(rendered, range.start_offset, range.end_offset)?;
    if checked != range {
        return Err(IngestError::Validation(format!(
            "start offset {} must not exceed end offset {}",
            range.start_offset, range.end_offset
        )));
    }
    if slice_chars(rendered, range) != text {
        return Err(IngestError::Validation(
            "highlight text does not match the document at the given offsets".into(),
        ));
    }
    Ok(())
}

/// Position for a note.
///
/// Notes created without positional context are pinned to offset 0.
pub fn note_offset(offset: Option<usize>, rendered_len: usize) -> Result<usize> {
    match offset {
        Some(o) if o > rendered_len => Err(IngestError::Validation(format!(
            "note offset {} is beyond the document text ({} chars)",
            o, rendered_len
        ))),
        Some(o) => Ok(o),
        None => {
            debug!("note has no position; defaulting offset to 0");
            Ok(0)
        }
    }
}

/// The text covered by `range`.
pub fn slice_chars(rendered: &str, range: AnchorRange) -> String {
    rendered
        .chars()
        .skip(range.start_offset)
        .take(range.len())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "The quick brown fox jumps over the lazy dog.";

    #[test]
    fn offsets_cover_selection() {
        let r = compute_offsets(TEXT, 4, 9).unwrap();
        assert_eq!(r, AnchorRange { start_offset: 4, end_offset: 9 });
        assert_eq!(slice_chars(TEXT, r), "quick");
    }

    #[test]
    fn empty_selection_is_rejected() {
        let err = compute_offsets(TEXT, 7, 7).unwrap_err();
        assert!(matches!(err, IngestError::EmptySelection));
    }

    #[test]
    fn backward_selection_is_normalized() {
        assert_eq!(
            compute_offsets(TEXT, 9, 4).unwrap(),
            compute_offsets(TEXT, 4, 9).unwrap()
        );
    }

    #[test]
    fn selection_past_end_is_rejected() {
        let len = TEXT.chars().count();
        assert!(compute_offsets(TEXT, 0, len).is_ok());
        let err = compute_offsets(TEXT, 0, len + 1).unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));
    }

    #[test]
    fn offsets_stay_within_bounds_for_every_selection() {
        let len = TEXT.chars().count();
        for start in 0..len {
            for end in (start + 1)..=len {
                let r = compute_offsets(TEXT, start, end).unwrap();
                assert!(r.start_offset <= r.end_offset);
                assert!(r.end_offset <= len);
            }
        }
    }

    #[test]
    fn offsets_count_chars_not_bytes() {
        let text = "café au lait";
        let r = anchor_selection(text, "au", 7).unwrap();
        assert_eq!(r, AnchorRange { start_offset: 5, end_offset: 7 });
    }

    #[test]
    fn pre_caret_anchoring() {
        let end = "The quick brown".chars().count();
        let r = anchor_selection(TEXT, "brown", end).unwrap();
        assert_eq!(r.start_offset, 10);
        assert_eq!(r.end_offset, 15);
    }

    #[test]
    fn pre_caret_rejects_empty_and_mismatched_text() {
        assert!(matches!(
            anchor_selection(TEXT, "", 5).unwrap_err(),
            IngestError::EmptySelection
        ));
        assert!(matches!(
            anchor_selection(TEXT, "slow", 9).unwrap_err(),
            IngestError::Validation(_)
        ));
        assert!(matches!(
            anchor_selection(TEXT, "The quick", 3).unwrap_err(),
            IngestError::Validation(_)
        ));
    }

    #[test]
    fn projection_strips_markup() {
        let html = "<article><h1>Title</h1><p>Hello <em>there</em> reader.</p></article>";
        let text = plain_text_projection(html, ContentType::Url);
        assert_eq!(text, "TitleHello there reader.");
        let r = anchor_selection(&text, "there", "TitleHello there".chars().count()).unwrap();
        assert_eq!(slice_chars(&text, r), "there");
    }

    #[test]
    fn projection_of_plain_content_is_identity() {
        let text = "a <b> is not markup here";
        assert_eq!(plain_text_projection(text, ContentType::Text), text);
        assert_eq!(plain_text_projection(text, ContentType::Pdf), text);
    }

    #[test]
    fn highlight_validation() {
        let range = AnchorRange { start_offset: 4, end_offset: 9 };
        assert!(validate_highlight(TEXT, "quick", range).is_ok());
        assert!(validate_highlight(TEXT, "quack", range).is_err());
        let reversed = AnchorRange { start_offset: 9, end_offset: 4 };
        assert!(validate_highlight(TEXT, "quick", reversed).is_err());
    }

    #[test]
    fn reversed_range_slices_to_nothing() {
        let reversed = AnchorRange { start_offset: 9, end_offset: 4 };
        assert_eq!(reversed.len(), 0);
        assert!(reversed.is_empty());
        assert_eq!(slice_chars(TEXT, reversed), "");
    }

    #[test]
    fn note_offset_defaults_to_zero() {
        assert_eq!(note_offset(None, 10).unwrap(), 0);
        assert_eq!(note_offset(Some(10), 10).unwrap(), 10);
        assert!(note_offset(Some(11), 10).is_err());
    }
}
