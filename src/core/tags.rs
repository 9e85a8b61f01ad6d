//! Hashtag extraction and tag-derived display helpers.

use super::idea::Idea;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\w+)").expect("tag pattern is valid"));

/// Derives the tag tokens of `text`: lowercase, unique, first-occurrence order.
#[must_use]
pub fn extract_tags(text: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for captures in TAG_PATTERN.captures_iter(text) {
        let tag = captures[1].to_lowercase();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Sorted union of every idea's tags, used to populate filter options.
#[must_use]
pub fn all_tags(ideas: &[Idea]) -> Vec<String> {
    ideas
        .iter()
        .flat_map(|idea| idea.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Text with inline `#tag` tokens removed, for display.
#[must_use]
pub fn strip_tags(text: &str) -> String {
    TAG_PATTERN.replace_all(text, "").trim().to_string()
}

/// Short display form of `text`: tags stripped, cut to `max_chars` characters.
#[must_use]
pub fn preview(text: &str, max_chars: usize) -> String {
    let clean = strip_tags(text);
    if clean.chars().count() <= max_chars {
        return clean;
    }
    let mut cut: String = clean.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}
