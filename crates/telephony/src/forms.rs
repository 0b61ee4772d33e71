//! Inbound webhook payloads
//!
//! The provider posts form-encoded fields; every endpoint receives a
//! superset of the same shape, so one struct covers entry, continuation,
//! and dial-completion webhooks.

use serde::Deserialize;

/// Form body of a voice webhook.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoiceWebhookForm {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,

    #[serde(rename = "From")]
    pub from: Option<String>,

    #[serde(rename = "To")]
    pub to: Option<String>,

    #[serde(rename = "CallerCountry")]
    pub caller_country: Option<String>,

    #[serde(rename = "CallerState")]
    pub caller_state: Option<String>,

    #[serde(rename = "CallerCity")]
    pub caller_city: Option<String>,

    #[serde(rename = "CallStatus")]
    pub call_status: Option<String>,

    #[serde(rename = "SpeechResult")]
    pub speech_result: Option<String>,

    #[serde(rename = "Digits")]
    pub digits: Option<String>,

    #[serde(rename = "DialCallSid")]
    pub dial_call_sid: Option<String>,

    #[serde(rename = "DialCallStatus")]
    pub dial_call_status: Option<String>,

    #[serde(rename = "DialCallDuration")]
    pub dial_call_duration: Option<String>,
}

impl VoiceWebhookForm {
    /// Call sid, empty string when the provider omitted it.
    pub fn sid(&self) -> &str {
        self.call_sid.as_deref().unwrap_or("")
    }

    /// Trimmed speech transcript, `None` when absent or blank.
    pub fn speech(&self) -> Option<&str> {
        self.speech_result
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
