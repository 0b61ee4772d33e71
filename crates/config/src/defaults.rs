//! Built-in IVR copy
//!
//! Greetings, prompt text, and misheard-word corrections used whenever the
//! operator has not stored an override row. Keys mirror the voice_prompts
//! table; the admin console can override any of them at runtime.

/// Default greeting per language code.
pub const DEFAULT_GREETINGS: &[(&str, &str)] = &[
    ("hi-IN", "Namaste, welcome to Jadau."),
    ("en-IN", "Namaste, welcome to Jadau."),
];

/// Default IVR prompt copy by key.
pub const DEFAULT_PROMPTS: &[(&str, &str)] = &[
    // Main menu - intent selection
    (
        "menu",
        "Please choose one of the following options: General Inquiry, Try Near You, or Price Request.",
    ),
    (
        "reprompt",
        "I did not catch your response. Please say General Inquiry, Try Near You, or Price Request.",
    ),
    ("invalid", "Sorry, I didn't understand that. Please try again."),
    // Name collection - asked after intent selection
    (
        "name_prompt",
        "May I have your name please, so that we can provide you with more specific assistance?",
    ),
    (
        "name_profanity_failed_prompt",
        "Sorry, I could not use that name. Could you please repeat your name?",
    ),
    // After General Inquiry or Try Near You - product or category
    (
        "assist_type_prompt",
        "Would you like assistance with a specific product or a product category?",
    ),
    // Product name collection
    (
        "product_id_prompt",
        "Please provide the Product ID for the item you're referring to.",
    ),
    // Category name collection
    (
        "category_prompt",
        "Kindly mention the category name you're looking for.",
    ),
    (
        "product_category_followup_prompt",
        "Which category does that product belong to?",
    ),
    // Price request - ask for product name
    (
        "price_product_prompt",
        "Please provide the Product ID so I can check the pricing details for you.",
    ),
    // Confirmation before connecting to agent
    (
        "confirmation",
        "Thank you. While I connect you to our agent for further assistance, please briefly describe your query.",
    ),
    ("connecting", "Please wait while we connect you to our expert."),
    (
        "no_agent",
        "Sorry, we cannot connect your call right now. Please try again later.",
    ),
];

/// Default misheard-word corrections: what the recognizer tends to hear
/// mapped to the word it should have heard.
pub const DEFAULT_CORRECTIONS: &[(&str, &str)] = &[
    // Necklaces
    ("neck lace", "necklace"),
    ("neckless", "necklace"),
    ("nekless", "necklace"),
    ("neklace", "necklace"),
    ("neckelace", "necklace"),
    ("haar", "necklace"),
    // Bangles
    ("kada", "bangles"),
    ("kadan", "bangles"),
    // Bracelets
    ("braclet", "bracelets"),
    ("braclets", "bracelets"),
    // Earrings
    ("jhumka", "earrings"),
    ("jhumkas", "earrings"),
    ("chandbali", "earrings"),
    // Curated combinations (sets / combos)
    ("curated combo", "curated combination"),
    ("curation combination", "curated combination"),
    ("combo", "curated combination"),
    ("combination", "curated combination"),
    ("set", "curated combination"),
    // Accessories
    ("maang tikka", "accessories"),
    ("maangtikka", "accessories"),
    ("mang tikka", "accessories"),
    ("kamarband", "accessories"),
    ("waistband", "accessories"),
];

/// Look up a default prompt by key.
pub fn default_prompt(key: &str) -> Option<&'static str> {
    DEFAULT_PROMPTS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, text)| *text)
}

/// Look up a default greeting, falling back to the en-IN copy.
pub fn default_greeting(language: &str) -> &'static str {
    DEFAULT_GREETINGS
        .iter()
        .find(|(lang, _)| *lang == language)
        .map(|(_, text)| *text)
        .unwrap_or(DEFAULT_GREETINGS[1].1)
}
