//! Transcript normalization and misheard-word correction

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalize a speech transcript for matching: lowercase, strip anything
/// that is not alphanumeric, collapse whitespace.
pub fn normalize_transcript(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    WHITESPACE.replace_all(cleaned.trim(), " ").to_string()
}

/// Apply the operator-editable misheard-word table to a normalized
/// transcript.
///
/// Replacement is whole-word and idempotent: occurrences of a wrong word
/// that already sit inside its correct phrase are left alone, so running
/// the table over an already-correct transcript changes nothing.
pub fn apply_corrections(text: &str, corrections: &[(String, String)]) -> String {
    let mut result = text.to_string();
    for (wrong, correct) in corrections {
        let wrong = wrong.trim().to_lowercase();
        let correct = correct.trim().to_lowercase();
        if wrong.is_empty() || wrong == correct {
            continue;
        }
        result = replace_whole_word(&result, &wrong, &correct);
    }
    result
}

fn replace_whole_word(text: &str, wrong: &str, correct: &str) -> String {
    // Occurrences of the correct phrase are protected ranges.
    let protected = find_word_occurrences(text, correct);
    let occurrences = find_word_occurrences(text, wrong);

    let mut out = text.to_string();
    for (start, end) in occurrences.into_iter().rev() {
        let shielded = protected
            .iter()
            .any(|&(ps, pe)| start >= ps && end <= pe);
        if !shielded {
            out.replace_range(start..end, correct);
        }
    }
    out
}

/// Byte ranges where `phrase` appears bounded by spaces or string edges.
pub(crate) fn find_word_occurrences(text: &str, phrase: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    if phrase.is_empty() {
        return ranges;
    }

    let mut from = 0;
    while let Some(pos) = text[from..].find(phrase) {
        let start = from + pos;
        let end = start + phrase.len();
        let left_ok = start == 0 || text.as_bytes()[start - 1] == b' ';
        let right_ok = end == text.len() || text.as_bytes()[end] == b' ';
        if left_ok && right_ok {
            ranges.push((start, end));
        }

        from = start + 1;
        while from < text.len() && !text.is_char_boundary(from) {
            from += 1;
        }
        if from >= text.len() {
            break;
        }
    }
    ranges
}

/// Whether `phrase` appears in `text` as a whole word or phrase.
pub(crate) fn contains_word(text: &str, phrase: &str) -> bool {
    !find_word_occurrences(text, phrase).is_empty()
}
