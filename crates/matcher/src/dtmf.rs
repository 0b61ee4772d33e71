//! DTMF + speech category resolution for the six-option menu
//!
//! Alternate entry flow: a keypad digit selects a category directly; when
//! no digit is present, spoken number words (including the recognizer's
//! usual phonetic confusions) are tried before falling back to keyword
//! matching.

use call_router_core::Category;

use crate::category::resolve_category;
use crate::normalize::normalize_transcript;

/// Menu position -> category for digits 1 through 6.
const DIGIT_MENU: [Category; 6] = [
    Category::Necklace,
    Category::Bangles,
    Category::Bracelets,
    Category::Earrings,
    Category::CuratedCombination,
    Category::Accessories,
];

/// Spoken forms of each menu number, phonetic variants included.
const NUMBER_WORDS: &[(&str, usize)] = &[
    ("1", 1),
    ("one", 1),
    ("won", 1),
    ("first", 1),
    ("2", 2),
    ("two", 2),
    ("to", 2),
    ("too", 2),
    ("second", 2),
    ("3", 3),
    ("three", 3),
    ("tree", 3),
    ("third", 3),
    ("4", 4),
    ("four", 4),
    ("for", 4),
    ("fore", 4),
    ("fourth", 4),
    ("5", 5),
    ("five", 5),
    ("fifth", 5),
    ("6", 6),
    ("six", 6),
    ("sixth", 6),
];

fn category_for_position(position: usize) -> Option<Category> {
    DIGIT_MENU.get(position.checked_sub(1)?).copied()
}

/// Resolve a category from the DTMF/speech menu.
///
/// A digit always wins over simultaneous speech.
pub fn resolve_category_dtmf(
    digits: Option<&str>,
    speech: Option<&str>,
    corrections: &[(String, String)],
) -> Option<Category> {
    if let Some(digit) = digits.and_then(|d| d.trim().chars().next()) {
        if let Some(position) = digit.to_digit(10) {
            return category_for_position(position as usize);
        }
    }

    let transcript = normalize_transcript(speech.unwrap_or(""));
    if transcript.is_empty() {
        return None;
    }

    for word in transcript.split_whitespace() {
        if let Some((_, position)) = NUMBER_WORDS.iter().find(|(w, _)| *w == word) {
            return category_for_position(*position);
        }
    }

    resolve_category(speech, corrections)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_corrections() -> Vec<(String, String)> {
        Vec::new()
    }

    #[test]
    fn test_digit_selects_category() {
        assert_eq!(
            resolve_category_dtmf(Some("1"), None, &no_corrections()),
            Some(Category::Necklace)
        );
        assert_eq!(
            resolve_category_dtmf(Some("6"), None, &no_corrections()),
            Some(Category::Accessories)
        );
    }

    #[test]
    fn test_digit_wins_over_speech() {
        assert_eq!(
            resolve_category_dtmf(Some("2"), Some("earrings please"), &no_corrections()),
            Some(Category::Bangles)
        );
    }

    #[test]
    fn test_out_of_range_digit_is_no_match() {
        assert_eq!(resolve_category_dtmf(Some("7"), None, &no_corrections()), None);
        assert_eq!(resolve_category_dtmf(Some("0"), None, &no_corrections()), None);
    }

    #[test]
    fn test_spoken_number_words() {
        assert_eq!(
            resolve_category_dtmf(None, Some("option two"), &no_corrections()),
            Some(Category::Bangles)
        );
        // Phonetic misrecognition of "one"
        assert_eq!(
            resolve_category_dtmf(None, Some("won"), &no_corrections()),
            Some(Category::Necklace)
        );
    }

    #[test]
    fn test_speech_falls_back_to_keywords() {
        assert_eq!(
            resolve_category_dtmf(None, Some("the bracelets"), &no_corrections()),
            Some(Category::Bracelets)
        );
    }

    #[test]
    fn test_nothing_matches() {
        assert_eq!(resolve_category_dtmf(None, Some("hello"), &no_corrections()), None);
        assert_eq!(resolve_category_dtmf(None, None, &no_corrections()), None);
    }
}
