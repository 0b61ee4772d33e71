//! Intent and assist-type resolution

use call_router_core::{AssistType, Intent};

use crate::normalize::{contains_word, normalize_transcript};

const PRICE_KEYWORDS: &[&str] = &["price", "pricing", "cost", "rate", "price request"];

const STORE_KEYWORDS: &[&str] = &[
    "store",
    "near",
    "nearby",
    "near you",
    "try near you",
    "try near",
    "location",
];

const GENERAL_KEYWORDS: &[&str] = &[
    "general",
    "inquiry",
    "enquiry",
    "help",
    "assist",
    "assistance",
    "general inquiry",
];

const PRODUCT_KEYWORDS: &[&str] = &["product", "id", "item", "sku", "specific"];

const CATEGORY_KEYWORDS: &[&str] = &["category", "categories", "type", "kind"];

fn any_keyword(transcript: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| contains_word(transcript, k))
}

/// Resolve the initial menu intent from speech.
///
/// Keyword families are checked in fixed priority order: price, then
/// store/try-near-you, then general inquiry.
pub fn resolve_intent(speech: Option<&str>) -> Option<Intent> {
    let transcript = normalize_transcript(speech.unwrap_or(""));
    if transcript.is_empty() {
        return None;
    }

    if any_keyword(&transcript, PRICE_KEYWORDS) {
        return Some(Intent::PriceRequest);
    }
    if any_keyword(&transcript, STORE_KEYWORDS) {
        return Some(Intent::Store);
    }
    if any_keyword(&transcript, GENERAL_KEYWORDS) {
        return Some(Intent::GeneralInquiry);
    }

    None
}

/// Resolve whether the caller wants product-level or category-level help.
///
/// When both keyword families are present ("product category"), category
/// wins.
pub fn resolve_assist_type(speech: Option<&str>) -> Option<AssistType> {
    let transcript = normalize_transcript(speech.unwrap_or(""));
    if transcript.is_empty() {
        return None;
    }

    let has_product = any_keyword(&transcript, PRODUCT_KEYWORDS);
    let has_category = any_keyword(&transcript, CATEGORY_KEYWORDS);

    if has_category {
        return Some(AssistType::Category);
    }
    if has_product {
        return Some(AssistType::Product);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_keywords() {
        assert_eq!(resolve_intent(Some("price request")), Some(Intent::PriceRequest));
        assert_eq!(
            resolve_intent(Some("what is the pricing for this")),
            Some(Intent::PriceRequest)
        );
    }

    #[test]
    fn test_store_keywords() {
        assert_eq!(resolve_intent(Some("try near you")), Some(Intent::Store));
        assert_eq!(resolve_intent(Some("is there a store nearby")), Some(Intent::Store));
    }

    #[test]
    fn test_general_keywords() {
        assert_eq!(
            resolve_intent(Some("general inquiry")),
            Some(Intent::GeneralInquiry)
        );
        assert_eq!(resolve_intent(Some("i need help")), Some(Intent::GeneralInquiry));
    }

    #[test]
    fn test_price_beats_store_and_general() {
        // "price" and "store" both present - price wins by priority
        assert_eq!(
            resolve_intent(Some("store price question")),
            Some(Intent::PriceRequest)
        );
    }

    #[test]
    fn test_unresolvable_intent_is_no_match() {
        assert_eq!(resolve_intent(Some("banana")), None);
        assert_eq!(resolve_intent(Some("")), None);
        assert_eq!(resolve_intent(None), None);
    }

    #[test]
    fn test_assist_type_product() {
        assert_eq!(
            resolve_assist_type(Some("a specific product")),
            Some(AssistType::Product)
        );
        assert_eq!(resolve_assist_type(Some("an item")), Some(AssistType::Product));
    }

    #[test]
    fn test_assist_type_category() {
        assert_eq!(
            resolve_assist_type(Some("a category")),
            Some(AssistType::Category)
        );
    }

    #[test]
    fn test_assist_type_tie_break_prefers_category() {
        assert_eq!(
            resolve_assist_type(Some("product category")),
            Some(AssistType::Category)
        );
    }

    #[test]
    fn test_assist_type_no_match() {
        assert_eq!(resolve_assist_type(Some("whatever")), None);
        assert_eq!(resolve_assist_type(None), None);
    }
}
