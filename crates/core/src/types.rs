//! Canonical domain vocabulary
//!
//! The IVR only ever stores and routes on these closed sets. Free-form
//! speech is resolved into them by the matcher crate; anything that does
//! not resolve stays `None` and drives the invalid-input branch.

use serde::{Deserialize, Serialize};

/// Seconds the provider rings each candidate before advancing to the next.
pub const DIAL_TIMEOUT_SECS: u32 = 20;

/// Canonical jewelry categories accepted by the IVR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Necklace,
    Bangles,
    Bracelets,
    Earrings,
    Rings,
    Accessories,
    CuratedCombination,
    MenJewellery,
    VintageDiamonds,
}

/// All categories, in menu order.
pub const ALL_CATEGORIES: [Category; 9] = [
    Category::Necklace,
    Category::Bangles,
    Category::Bracelets,
    Category::Earrings,
    Category::Rings,
    Category::Accessories,
    Category::CuratedCombination,
    Category::MenJewellery,
    Category::VintageDiamonds,
];

impl Category {
    /// Canonical label as stored in the database and sent to the CRM.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Necklace => "necklace",
            Category::Bangles => "bangles",
            Category::Bracelets => "bracelets",
            Category::Earrings => "earrings",
            Category::Rings => "rings",
            Category::Accessories => "accessories",
            Category::CuratedCombination => "curated combination",
            Category::MenJewellery => "men jewellery",
            Category::VintageDiamonds => "vintage diamonds",
        }
    }

    /// Parse a stored canonical label. Trims and lowercases, accepts the
    /// common singular/plural variants that older rows may carry.
    pub fn parse(label: &str) -> Option<Category> {
        let normalized = label.trim().to_lowercase();
        let category = match normalized.as_str() {
            "necklace" | "necklaces" => Category::Necklace,
            "bangle" | "bangles" => Category::Bangles,
            "bracelet" | "bracelets" => Category::Bracelets,
            "earring" | "earrings" => Category::Earrings,
            "ring" | "rings" => Category::Rings,
            "accessory" | "accessories" => Category::Accessories,
            "curated combination" | "curated combinations" => Category::CuratedCombination,
            "men jewellery" | "men jewelry" | "mens jewellery" | "mens jewelry" => {
                Category::MenJewellery
            }
            "vintage diamond" | "vintage diamonds" => Category::VintageDiamonds,
            _ => return None,
        };
        Some(category)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller intent captured at the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    PriceRequest,
    Store,
    GeneralInquiry,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::PriceRequest => "price_request",
            Intent::Store => "store",
            Intent::GeneralInquiry => "general_inquiry",
        }
    }

    pub fn parse(label: &str) -> Option<Intent> {
        match label.trim() {
            "price_request" => Some(Intent::PriceRequest),
            "store" => Some(Intent::Store),
            "general_inquiry" => Some(Intent::GeneralInquiry),
            _ => None,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the caller wants help with a specific product or a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistType {
    Product,
    Category,
}

impl AssistType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistType::Product => "product",
            AssistType::Category => "category",
        }
    }

    pub fn parse(label: &str) -> Option<AssistType> {
        match label.trim() {
            "product" => Some(AssistType::Product),
            "category" => Some(AssistType::Category),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssistType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing partition an agent belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    Us,
    In,
    Global,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Us => "US",
            Region::In => "IN",
            Region::Global => "GLOBAL",
        }
    }

    pub fn parse(label: &str) -> Option<Region> {
        match label.trim().to_uppercase().as_str() {
            "US" => Some(Region::Us),
            "IN" => Some(Region::In),
            "GLOBAL" => Some(Region::Global),
            _ => None,
        }
    }

    /// Derive the routing region from the lead currency. INR callers route
    /// to the India pool, everyone else to the US pool.
    pub fn from_currency(currency: Option<&str>) -> Region {
        match currency.map(|c| c.trim().to_uppercase()) {
            Some(c) if c == "INR" => Region::In,
            _ => Region::Us,
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preferred IVR language for a currency.
pub fn language_for_currency(currency: Option<&str>) -> &'static str {
    match currency.map(|c| c.trim().to_uppercase()) {
        Some(c) if c == "INR" => "hi-IN",
        _ => "en-IN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        for category in ALL_CATEGORIES {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
    }

    #[test]
    fn test_category_parse_variants() {
        assert_eq!(Category::parse("Necklaces"), Some(Category::Necklace));
        assert_eq!(Category::parse(" bangle "), Some(Category::Bangles));
        assert_eq!(Category::parse("men jewelry"), Some(Category::MenJewellery));
        assert_eq!(Category::parse("polki"), None);
    }

    #[test]
    fn test_region_from_currency() {
        assert_eq!(Region::from_currency(Some("INR")), Region::In);
        assert_eq!(Region::from_currency(Some("inr")), Region::In);
        assert_eq!(Region::from_currency(Some("USD")), Region::Us);
        assert_eq!(Region::from_currency(None), Region::Us);
    }

    #[test]
    fn test_language_for_currency() {
        assert_eq!(language_for_currency(Some("INR")), "hi-IN");
        assert_eq!(language_for_currency(Some("EUR")), "en-IN");
        assert_eq!(language_for_currency(None), "en-IN");
    }
}
