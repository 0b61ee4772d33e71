//! Dialogue steps and their question parameters
//!
//! The flow is linear with retry loops:
//! greeting -> intent -> name -> (assist type | price product) ->
//! (product name | category) -> description -> connect.
//!
//! Category collection is one step with a configurable continuation; the
//! two historical webhook entries differ only in where a match goes next.

/// Webhook paths, also used as gather action URLs.
pub mod actions {
    pub const ENTRY: &str = "/voice";
    pub const INTENT: &str = "/voice/intent";
    pub const NAME: &str = "/voice/name";
    pub const NAME_FALLBACK: &str = "/voice/name-fallback";
    pub const ASSIST_TYPE: &str = "/voice/assist-type";
    pub const PRODUCT_ID: &str = "/voice/product-id";
    pub const PRODUCT_CATEGORY: &str = "/voice/product-category";
    pub const PRICE_PRODUCT: &str = "/voice/price-product";
    pub const CATEGORY_NAME: &str = "/voice/category-name";
    pub const DESCRIPTION: &str = "/voice/description";
    pub const DIAL_COMPLETE: &str = "/voice/dial-complete";
}

const INTENT_HINTS: &str =
    "general inquiry, try near you, price request, general, inquiry, store, price, pricing";

const ASSIST_HINTS: &str = "product, category, specific product, product category, item, type";

const CATEGORY_HINTS: &str = "necklace, necklaces, bangles, bracelets, earrings, rings, \
     accessories, curated combination, men jewellery, vintage diamonds";

/// Which entry point collected the product name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductPath {
    /// Via general inquiry / try near you and the product assist type.
    General,
    /// Directly after a price request.
    Price,
}

impl ProductPath {
    pub fn captured_event(&self) -> &'static str {
        match self {
            ProductPath::General => "PRODUCT_NAME_CAPTURED",
            ProductPath::Price => "PRICE_PRODUCT_NAME_CAPTURED",
        }
    }

    pub fn missing_event(&self) -> &'static str {
        match self {
            ProductPath::General => "PRODUCT_NAME_NOT_PROVIDED",
            ProductPath::Price => "PRICE_PRODUCT_NAME_NOT_PROVIDED",
        }
    }
}

/// Where category collection continues once a category is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryNext {
    /// Connect to an agent right away.
    Connect,
    /// Ask for the product name first.
    ProductName,
}

impl CategoryNext {
    pub fn captured_event(&self) -> &'static str {
        match self {
            CategoryNext::Connect => "CATEGORY_NAME_CAPTURED",
            CategoryNext::ProductName => "PRODUCT_CATEGORY_CAPTURED",
        }
    }

    pub fn unrecognized_event(&self) -> &'static str {
        match self {
            CategoryNext::Connect => "CATEGORY_NAME_NOT_RECOGNIZED",
            CategoryNext::ProductName => "PRODUCT_CATEGORY_NOT_RECOGNIZED",
        }
    }

    pub fn missing_event(&self) -> &'static str {
        match self {
            CategoryNext::Connect => "CATEGORY_NAME_NOT_PROVIDED",
            CategoryNext::ProductName => "PRODUCT_CATEGORY_NOT_PROVIDED",
        }
    }
}

/// One question-bearing step of the dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueStep {
    Intent,
    Name,
    AssistType,
    ProductName(ProductPath),
    CategoryCollect(CategoryNext),
    Description,
}

impl DialogueStep {
    /// Webhook the gather posts its result to.
    pub fn action(&self) -> &'static str {
        match self {
            DialogueStep::Intent => actions::INTENT,
            DialogueStep::Name => actions::NAME,
            DialogueStep::AssistType => actions::ASSIST_TYPE,
            DialogueStep::ProductName(ProductPath::General) => actions::PRODUCT_ID,
            DialogueStep::ProductName(ProductPath::Price) => actions::PRICE_PRODUCT,
            DialogueStep::CategoryCollect(CategoryNext::Connect) => actions::CATEGORY_NAME,
            DialogueStep::CategoryCollect(CategoryNext::ProductName) => actions::PRODUCT_CATEGORY,
            DialogueStep::Description => actions::DESCRIPTION,
        }
    }

    /// Prompt catalog key for the question text.
    pub fn prompt_key(&self) -> &'static str {
        match self {
            DialogueStep::Intent => "menu",
            DialogueStep::Name => "name_prompt",
            DialogueStep::AssistType => "assist_type_prompt",
            DialogueStep::ProductName(ProductPath::General) => "product_id_prompt",
            DialogueStep::ProductName(ProductPath::Price) => "price_product_prompt",
            DialogueStep::CategoryCollect(CategoryNext::Connect) => "category_prompt",
            DialogueStep::CategoryCollect(CategoryNext::ProductName) => {
                "product_category_followup_prompt"
            }
            DialogueStep::Description => "confirmation",
        }
    }

    /// Hint vocabulary for the recognizer.
    pub fn hints(&self) -> Option<&'static str> {
        match self {
            DialogueStep::Intent => Some(INTENT_HINTS),
            DialogueStep::AssistType => Some(ASSIST_HINTS),
            DialogueStep::CategoryCollect(_) => Some(CATEGORY_HINTS),
            _ => None,
        }
    }

    /// Gather timeout: free-text answers get a little longer.
    pub fn timeout(&self) -> u32 {
        match self {
            DialogueStep::ProductName(_) | DialogueStep::Description => 10,
            _ => 8,
        }
    }
}
