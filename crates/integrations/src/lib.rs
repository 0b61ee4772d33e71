//! External collaborators
//!
//! Narrow interfaces over the third-party services the dialogue consults:
//! a speech safety check, free-text category inference, and CRM lead sync.
//! Every collaborator has a bounded timeout and an explicit fallback value;
//! none of them can fail a webhook.

pub mod crm;
pub mod gemini;
pub mod inference;
pub mod safety;

pub use crm::{CrmClient, NewCrmLead, SalesforceCrmClient};
pub use gemini::GeminiClient;
pub use inference::{CategoryInference, GeminiCategoryInference, NoopInference};
pub use safety::{KeywordBlacklist, ModeratedSafetyCheck, SafetyCheck};

use thiserror::Error;

/// Integration errors
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Service not configured")]
    NotConfigured,

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}
