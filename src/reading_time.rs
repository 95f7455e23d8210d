//! Word-count based reading time estimate.

/// Average adult reading speed used when no rate is configured.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 225;

/// Estimated minutes to read `text` at [`DEFAULT_WORDS_PER_MINUTE`]. Never less than 1.
pub fn estimate(text: &str) -> u32 {
    estimate_with_rate(text, DEFAULT_WORDS_PER_MINUTE)
}

/// Estimated minutes to read `text` at `words_per_minute`, rounded up, floored at 1.
///
/// A zero rate is treated as the default rate.
pub fn estimate_with_rate(text: &str, words_per_minute: u32) -> u32 {
    let rate = if words_per_minute == 0 {
        DEFAULT_WORDS_PER_MINUTE
    } else {
        words_per_minute
    };
    let words = word_count(text);
    let minutes = words.div_ceil(rate as usize);
    u32::try_from(minutes).unwrap_or(u32::MAX).max(1)
}

/// Number of whitespace-separated tokens in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_reads_in_one_minute() {
        assert_eq!(estimate(""), 1);
        assert_eq!(estimate("   \n\t "), 1);
    }

    #[test]
    fn short_text_reads_in_one_minute() {
        assert_eq!(estimate("short"), 1);
    }

    #[test]
    fn exactly_one_minute_of_words() {
        let text = "word ".repeat(225);
        assert_eq!(estimate(&text), 1);
    }

    #[test]
    fn rounds_up_partial_minutes() {
        let text = "word ".repeat(226);
        assert_eq!(estimate(&text), 2);
    }

    #[test]
    fn longer_texts_scale() {
        let text = "word ".repeat(1000);
        assert!(estimate(&text) >= 4);
        assert_eq!(estimate(&text), 5);
    }

    #[test]
    fn custom_rate() {
        let text = "word ".repeat(300);
        assert_eq!(estimate_with_rate(&text, 100), 3);
        assert_eq!(estimate_with_rate(&text, 0), estimate(&text));
    }
}
