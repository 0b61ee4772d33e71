//! Telephony provider plumbing
//!
//! Everything that speaks the provider's language: webhook form payloads,
//! the voice markup (TwiML-shaped XML) returned by every webhook, account
//! REST lookups with bounded timeouts, the verified outbound number cache,
//! and caller-ID selection.

pub mod caller_id;
pub mod forms;
pub mod rest;
pub mod twiml;
pub mod verified;

pub use caller_id::select_caller_id;
pub use forms::VoiceWebhookForm;
pub use rest::{ProviderAccount, TwilioRestClient};
pub use twiml::{DialSpec, GatherSpec, VoiceResponse, LANGUAGE_CODE, VOICE_NAME};
pub use verified::VerifiedNumbers;

use thiserror::Error;

/// Telephony errors
#[derive(Error, Debug)]
pub enum TelephonyError {
    #[error("Provider request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("Provider credentials not configured")]
    NotConfigured,
}
