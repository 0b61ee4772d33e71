//! Caller-input safety check
//!
//! Caller-provided names are screened before they reach the CRM. The
//! remote moderation model is asked first; on any failure or when no API
//! key is configured the check degrades to a local keyword blacklist. The
//! contract is a plain boolean: this check can never fail a webhook.

use std::sync::Arc;

use async_trait::async_trait;

use crate::gemini::GeminiClient;

/// Pass/fail safety contract.
#[async_trait]
pub trait SafetyCheck: Send + Sync {
    async fn is_profane(&self, text: &str) -> bool;
}

/// Local keyword blacklist, the always-available floor of the check.
pub struct KeywordBlacklist {
    words: Vec<&'static str>,
}

impl Default for KeywordBlacklist {
    fn default() -> Self {
        Self {
            words: vec![
                "fuck", "shit", "bitch", "asshole", "bastard", "cunt", "dick", "prick",
                "chutiya", "madarchod", "bhenchod", "behenchod", "gandu", "harami",
            ],
        }
    }
}

impl KeywordBlacklist {
    pub fn matches(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| self.words.contains(&word))
    }
}

#[async_trait]
impl SafetyCheck for KeywordBlacklist {
    async fn is_profane(&self, text: &str) -> bool {
        self.matches(text)
    }
}

/// Remote moderation with blacklist fallback.
pub struct ModeratedSafetyCheck {
    gemini: Option<Arc<GeminiClient>>,
    blacklist: KeywordBlacklist,
}

impl ModeratedSafetyCheck {
    pub fn new(gemini: Option<Arc<GeminiClient>>) -> Self {
        Self {
            gemini,
            blacklist: KeywordBlacklist::default(),
        }
    }
}

#[async_trait]
impl SafetyCheck for ModeratedSafetyCheck {
    async fn is_profane(&self, text: &str) -> bool {
        if let Some(gemini) = &self.gemini {
            let prompt = format!(
                "A telephone caller gave this as their name: \"{}\". \
                 Answer with exactly one word, yes or no: is it profane, \
                 abusive, or clearly not a name given in good faith?",
                text.replace('"', "")
            );
            match gemini.generate(&prompt).await {
                Ok(answer) => return answer.trim().to_lowercase().starts_with("yes"),
                Err(e) => {
                    tracing::warn!(error = %e, "Moderation call failed, using blacklist");
                }
            }
        }

        self.blacklist.matches(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blacklist_flags_profanity() {
        let check = KeywordBlacklist::default();
        assert!(check.is_profane("you fuck").await);
        assert!(check.is_profane("CHUTIYA here").await);
    }

    #[tokio::test]
    async fn test_blacklist_passes_ordinary_names() {
        let check = KeywordBlacklist::default();
        assert!(!check.is_profane("Priya Sharma").await);
        assert!(!check.is_profane("Jonathan").await);
    }

    #[test]
    fn test_blacklist_is_word_scoped() {
        // Substrings inside legitimate words must not trigger.
        let check = KeywordBlacklist::default();
        assert!(!check.matches("Dickens"));
    }

    #[tokio::test]
    async fn test_unconfigured_moderation_uses_blacklist() {
        let check = ModeratedSafetyCheck::new(None);
        assert!(check.is_profane("bastard").await);
        assert!(!check.is_profane("Asha").await);
    }
}
