//! Category inference from free-text product names
//!
//! Second line after the deterministic matcher: when a caller names a
//! product the synonym table cannot place, the classifier is asked to pick
//! from the allowed category list. Any failure means "no category", never
//! an error.

use std::sync::Arc;

use async_trait::async_trait;

use call_router_core::Category;

use crate::gemini::GeminiClient;

#[async_trait]
pub trait CategoryInference: Send + Sync {
    async fn infer_category(&self, product_name: &str, allowed: &[Category]) -> Option<Category>;
}

/// Classifier that never infers anything. Used when no model is configured
/// and as a test stand-in.
pub struct NoopInference;

#[async_trait]
impl CategoryInference for NoopInference {
    async fn infer_category(&self, _product_name: &str, _allowed: &[Category]) -> Option<Category> {
        None
    }
}

/// Model-backed classifier.
pub struct GeminiCategoryInference {
    gemini: Arc<GeminiClient>,
}

impl GeminiCategoryInference {
    pub fn new(gemini: Arc<GeminiClient>) -> Self {
        Self { gemini }
    }

    fn parse_answer(answer: &str, allowed: &[Category]) -> Option<Category> {
        let normalized = answer.trim().trim_matches(|c: char| c == '.' || c == '"');
        let category = Category::parse(normalized)?;
        allowed.contains(&category).then_some(category)
    }
}

#[async_trait]
impl CategoryInference for GeminiCategoryInference {
    async fn infer_category(&self, product_name: &str, allowed: &[Category]) -> Option<Category> {
        let labels: Vec<&str> = allowed.iter().map(|c| c.as_str()).collect();
        let prompt = format!(
            "A jewelry shopper asked about a product called \"{}\". \
             Pick the single best matching category from this list: {}. \
             Reply with the category name exactly as written, or the word \
             none if nothing fits.",
            product_name.replace('"', ""),
            labels.join(", ")
        );

        match self.gemini.generate(&prompt).await {
            Ok(answer) => {
                let category = Self::parse_answer(&answer, allowed);
                if category.is_none() {
                    tracing::debug!(answer = %answer, "Classifier returned no usable category");
                }
                category
            }
            Err(e) => {
                tracing::warn!(error = %e, "Category inference failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use call_router_core::ALL_CATEGORIES;

    #[test]
    fn test_parse_answer_accepts_exact_label() {
        assert_eq!(
            GeminiCategoryInference::parse_answer("earrings", &ALL_CATEGORIES),
            Some(Category::Earrings)
        );
        assert_eq!(
            GeminiCategoryInference::parse_answer("\"curated combination\".", &ALL_CATEGORIES),
            Some(Category::CuratedCombination)
        );
    }

    #[test]
    fn test_parse_answer_rejects_junk_and_none() {
        assert_eq!(GeminiCategoryInference::parse_answer("none", &ALL_CATEGORIES), None);
        assert_eq!(
            GeminiCategoryInference::parse_answer("probably a watch", &ALL_CATEGORIES),
            None
        );
    }

    #[test]
    fn test_parse_answer_respects_allowed_subset() {
        let allowed = [Category::Necklace, Category::Bangles];
        assert_eq!(
            GeminiCategoryInference::parse_answer("earrings", &allowed),
            None
        );
    }

    #[tokio::test]
    async fn test_noop_inference() {
        assert_eq!(
            NoopInference.infer_category("jhumka", &ALL_CATEGORIES).await,
            None
        );
    }
}
