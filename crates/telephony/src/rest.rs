//! Provider account REST lookups
//!
//! Two read-only resources are consumed: the account's owned/verified
//! outbound numbers, and a finished dial leg's resolved destination. Both
//! calls carry a short timeout so a slow provider can never stall a
//! webhook response.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::TelephonyError;

const API_BASE: &str = "https://api.twilio.com/2010-04-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Read-only provider account access.
#[async_trait]
pub trait ProviderAccount: Send + Sync {
    /// Numbers the account may use as outbound caller ID.
    async fn verified_numbers(&self) -> Result<Vec<String>, TelephonyError>;

    /// The destination number of a (child) call, once known.
    async fn call_to_number(&self, call_sid: &str) -> Result<Option<String>, TelephonyError>;
}

/// REST client for the provider account API.
pub struct TwilioRestClient {
    http: reqwest::Client,
    account_sid: String,
    auth_token: String,
    base_url: String,
}

#[derive(Deserialize)]
struct PhoneNumberRecord {
    phone_number: String,
}

#[derive(Deserialize)]
struct IncomingPhoneNumbersPage {
    #[serde(default)]
    incoming_phone_numbers: Vec<PhoneNumberRecord>,
}

#[derive(Deserialize)]
struct OutgoingCallerIdsPage {
    #[serde(default)]
    outgoing_caller_ids: Vec<PhoneNumberRecord>,
}

#[derive(Deserialize)]
struct CallResource {
    to: Option<String>,
}

impl TwilioRestClient {
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self::with_base_url(account_sid, auth_token, API_BASE)
    }

    pub fn with_base_url(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            base_url: base_url.into(),
        }
    }

    fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty()
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
    ) -> Result<T, TelephonyError> {
        if !self.is_configured() {
            return Err(TelephonyError::NotConfigured);
        }

        let url = format!("{}/Accounts/{}/{}", self.base_url, self.account_sid, path);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelephonyError::Provider {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ProviderAccount for TwilioRestClient {
    async fn verified_numbers(&self) -> Result<Vec<String>, TelephonyError> {
        let owned: IncomingPhoneNumbersPage = self.get_json("IncomingPhoneNumbers.json").await?;

        let mut numbers: Vec<String> = owned
            .incoming_phone_numbers
            .into_iter()
            .map(|r| r.phone_number)
            .collect();

        // Verified caller IDs may be absent or forbidden on some accounts;
        // missing them is not fatal.
        match self
            .get_json::<OutgoingCallerIdsPage>("OutgoingCallerIds.json")
            .await
        {
            Ok(page) => {
                numbers.extend(page.outgoing_caller_ids.into_iter().map(|r| r.phone_number));
            }
            Err(e) => {
                tracing::debug!(error = %e, "Outgoing caller ID listing unavailable");
            }
        }

        numbers.sort();
        numbers.dedup();
        Ok(numbers)
    }

    async fn call_to_number(&self, call_sid: &str) -> Result<Option<String>, TelephonyError> {
        let call: CallResource = self.get_json(&format!("Calls/{call_sid}.json")).await?;
        Ok(call.to)
    }
}
