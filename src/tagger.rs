//! Keyword-based topic tagging.
//!
//! A document receives every category whose keyword list has at least one
//! entry occurring as a substring of its lower-cased title and body. Matching
//! is substring-based, so short keywords such as `ai` also match
//! inside longer words. Documents with no match are tagged [`GENERAL`].

use std::collections::BTreeSet;

/// Fallback tag for documents that match no category.
pub const GENERAL: &str = "General";

/// Category → keyword table. Keywords are lower-case.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Technology",
        &[
            "tech",
            "software",
            "ai",
            "machine learning",
            "code",
            "programming",
            "app",
            "digital",
            "cyber",
            "algorithm",
        ],
    ),
    (
        "Science",
        &[
            "science",
            "research",
            "study",
            "experiment",
            "physics",
            "chemistry",
            "biology",
            "discovery",
            "scientist",
        ],
    ),
    (
        "Business",
        &[
            "business",
            "company",
            "market",
            "economy",
            "finance",
            "startup",
            "investment",
            "corporate",
            "enterprise",
        ],
    ),
    (
        "Health",
        &[
            "health",
            "medical",
            "doctor",
            "disease",
            "treatment",
            "wellness",
            "fitness",
            "nutrition",
            "mental health",
        ],
    ),
    (
        "Politics",
        &[
            "politics",
            "government",
            "election",
            "congress",
            "senate",
            "president",
            "law",
            "policy",
            "political",
        ],
    ),
    (
        "Entertainment",
        &[
            "movie",
            "music",
            "entertainment",
            "film",
            "actor",
            "celebrity",
            "show",
            "series",
            "game",
        ],
    ),
    (
        "Sports",
        &[
            "sports",
            "game",
            "team",
            "player",
            "championship",
            "league",
            "athletic",
            "competition",
        ],
    ),
    (
        "Travel",
        &[
            "travel",
            "destination",
            "journey",
            "trip",
            "tourism",
            "explore",
            "adventure",
            "vacation",
        ],
    ),
];

/// Tag a document by its title and body. The result is never empty.
pub fn tag(title: &str, content: &str) -> BTreeSet<String> {
    let haystack = format!("{} {}", title, content).to_lowercase();

    let mut tags: BTreeSet<String> = CATEGORY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| haystack.contains(kw)))
        .map(|(category, _)| category.to_string())
        .collect();

    if tags.is_empty() {
        tags.insert(GENERAL.to_string());
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn technology_content() {
        let tags = tag("AI Article", "This is about machine learning and algorithms");
        assert!(tags.contains("Technology"));
    }

    #[test]
    fn science_content() {
        let tags = tag("Research Paper", "A study on physics and chemistry experiments");
        assert!(tags.contains("Science"));
    }

    #[test]
    fn business_content() {
        let tags = tag("Market Report", "The startup raised funding for their new venture");
        assert!(tags.contains("Business"));
    }

    #[test]
    fn health_content() {
        let tags = tag("Health Tips", "Medical advice for wellness and fitness");
        assert!(tags.contains("Health"));
    }

    #[test]
    fn entertainment_content() {
        let tags = tag("Movie Review", "A great film with amazing actors");
        assert!(tags.contains("Entertainment"));
    }

    #[test]
    fn unknown_content_is_general_only() {
        let tags = tag("Random Title", "xyz abc 123");
        assert_eq!(tags, BTreeSet::from([GENERAL.to_string()]));
    }

    #[test]
    fn multiple_categories() {
        let tags = tag("Tech Health", "AI in medical research and healthcare technology");
        assert!(tags.len() >= 2);
        assert!(tags.contains("Technology"));
        assert!(tags.contains("Health"));
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(tag("TECH", "SOFTWARE AND AI"), tag("tech", "software and ai"));
    }

    #[test]
    fn shared_keyword_tags_both_categories() {
        let tags = tag("", "game");
        assert!(tags.contains("Entertainment"));
        assert!(tags.contains("Sports"));
    }

    #[test]
    fn general_never_mixed_with_categories() {
        let tags = tag("travel", "");
        assert!(!tags.contains(GENERAL));
    }
}
