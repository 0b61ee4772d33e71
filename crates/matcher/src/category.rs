//! Spoken category resolution

use call_router_core::Category;
use once_cell::sync::Lazy;

use crate::normalize::{apply_corrections, contains_word, normalize_transcript};

/// Spoken variants mapped to canonical categories. Scanned longest-first so
/// multi-word synonyms win over single words they contain.
const SYNONYMS: &[(&str, Category)] = &[
    ("curated combination", Category::CuratedCombination),
    ("curated combinations", Category::CuratedCombination),
    ("curated combo", Category::CuratedCombination),
    ("men jewellery", Category::MenJewellery),
    ("mens jewellery", Category::MenJewellery),
    ("men jewelry", Category::MenJewellery),
    ("mens jewelry", Category::MenJewellery),
    ("gents jewellery", Category::MenJewellery),
    ("gents jewelry", Category::MenJewellery),
    ("vintage diamonds", Category::VintageDiamonds),
    ("vintage diamond", Category::VintageDiamonds),
    ("necklace", Category::Necklace),
    ("necklaces", Category::Necklace),
    ("bangle", Category::Bangles),
    ("bangles", Category::Bangles),
    ("bracelet", Category::Bracelets),
    ("bracelets", Category::Bracelets),
    ("earring", Category::Earrings),
    ("earrings", Category::Earrings),
    ("ring", Category::Rings),
    ("rings", Category::Rings),
    ("accessory", Category::Accessories),
    ("accessories", Category::Accessories),
    ("diamond", Category::VintageDiamonds),
    ("diamonds", Category::VintageDiamonds),
];

static SYNONYMS_BY_LENGTH: Lazy<Vec<(&'static str, Category)>> = Lazy::new(|| {
    let mut sorted = SYNONYMS.to_vec();
    sorted.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    sorted
});

/// Resolve a spoken category into one of the allowed canonical categories.
///
/// The transcript is normalized and run through the misheard-word table
/// before matching. Returns `None` on anything ambiguous or unknown.
pub fn resolve_category(speech: Option<&str>, corrections: &[(String, String)]) -> Option<Category> {
    let transcript = normalize_transcript(speech.unwrap_or(""));
    if transcript.is_empty() {
        return None;
    }

    let corrected = normalize_transcript(&apply_corrections(&transcript, corrections));

    for (variant, category) in SYNONYMS_BY_LENGTH.iter() {
        if contains_word(&corrected, variant) {
            return Some(*category);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_corrections() -> Vec<(String, String)> {
        Vec::new()
    }

    fn corrections() -> Vec<(String, String)> {
        vec![
            ("neklace".to_string(), "necklace".to_string()),
            ("jhumka".to_string(), "earrings".to_string()),
        ]
    }

    #[test]
    fn test_synonyms_resolve_to_same_canonical() {
        for speech in ["bangle", "bangles", "I would like BANGLES please"] {
            assert_eq!(
                resolve_category(Some(speech), &no_corrections()),
                Some(Category::Bangles)
            );
        }
    }

    #[test]
    fn test_multiword_synonym_wins_over_contained_word() {
        // "combination" alone is not a synonym; the full phrase is.
        assert_eq!(
            resolve_category(Some("a curated combination for the wedding"), &no_corrections()),
            Some(Category::CuratedCombination)
        );
        assert_eq!(
            resolve_category(Some("vintage diamonds"), &no_corrections()),
            Some(Category::VintageDiamonds)
        );
    }

    #[test]
    fn test_misheard_correction_applies_before_matching() {
        assert_eq!(
            resolve_category(Some("I want to know about neklace pricing"), &corrections()),
            Some(Category::Necklace)
        );
        assert_eq!(
            resolve_category(Some("do you have jhumka"), &corrections()),
            Some(Category::Earrings)
        );
    }

    #[test]
    fn test_unknown_speech_is_no_match() {
        assert_eq!(resolve_category(Some("watches"), &no_corrections()), None);
        assert_eq!(resolve_category(Some(""), &no_corrections()), None);
        assert_eq!(resolve_category(None, &no_corrections()), None);
    }

    #[test]
    fn test_word_boundary_prevents_false_positive() {
        assert_eq!(resolve_category(Some("bring me something"), &no_corrections()), None);
    }
}
