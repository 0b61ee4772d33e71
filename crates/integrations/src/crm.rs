//! CRM lead sync
//!
//! Converts the collected IVR answers into a CRM Lead record. OAuth token
//! acquisition uses client credentials, or the password grant when a
//! username/password pair is configured. The category and product name are
//! nested into the notes field together with the caller's description; the
//! structured product-interest field is intentionally not sent.
//!
//! At-most-once semantics are owned by the dialogue orchestrator, not by
//! this client.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use call_router_config::CrmConfig;
use call_router_core::{Category, Intent};

use crate::IntegrationError;

/// Everything the IVR collected for one lead.
#[derive(Debug, Clone, Default)]
pub struct NewCrmLead {
    pub call_sid: String,
    pub caller_name: Option<String>,
    pub mobile_phone: Option<String>,
    pub intent: Option<Intent>,
    pub product_name: Option<String>,
    pub category: Option<Category>,
    pub description: Option<String>,
}

/// CRM lead creation contract. Returns the created lead id, or `None` on
/// any failure - the dialogue continues either way.
#[async_trait]
pub trait CrmClient: Send + Sync {
    async fn create_lead(&self, lead: &NewCrmLead) -> Option<String>;
}

/// Salesforce-style REST implementation.
pub struct SalesforceCrmClient {
    http: reqwest::Client,
    config: CrmConfig,
    token: Mutex<Option<String>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct CreateLeadResponse {
    id: Option<String>,
}

impl SalesforceCrmClient {
    pub fn new(config: CrmConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_default(),
            config,
            token: Mutex::new(None),
        }
    }

    async fn fetch_token(&self) -> Result<String, IntegrationError> {
        let mut params = vec![
            ("grant_type", "client_credentials".to_string()),
            ("client_id", self.config.client_id.clone()),
            ("client_secret", self.config.client_secret.clone()),
        ];
        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            params[0].1 = "password".to_string();
            params.push(("username", username.clone()));
            params.push(("password", password.clone()));
        }

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntegrationError::Service {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let token: TokenResponse = response.json().await?;
        token
            .access_token
            .ok_or_else(|| IntegrationError::UnexpectedResponse("missing access_token".to_string()))
    }

    async fn token(&self) -> Result<String, IntegrationError> {
        if let Some(token) = self.token.lock().clone() {
            return Ok(token);
        }
        let token = self.fetch_token().await?;
        *self.token.lock() = Some(token.clone());
        Ok(token)
    }

    async fn post_lead(&self, token: &str, body: &Value) -> Result<reqwest::Response, IntegrationError> {
        let url = format!("{}/services/data/v62.0/sobjects/Lead", self.config.base_url);
        Ok(self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }
}

/// Map the captured intent to the CRM lead title.
fn title_for_intent(intent: Option<Intent>) -> &'static str {
    match intent {
        Some(Intent::GeneralInquiry) => "Enquiry",
        Some(Intent::Store) => "Try Near You",
        Some(Intent::PriceRequest) => "Price Request",
        None => "Price Request / Enquiry",
    }
}

/// Build the CRM lead payload. Category, product name, and description are
/// folded into the notes field; fields without a value are omitted rather
/// than sent as null.
pub fn build_lead_body(lead: &NewCrmLead) -> Value {
    let mut notes_pieces: Vec<String> = Vec::new();
    if let Some(category) = lead.category {
        notes_pieces.push(format!("Category: {}", category.as_str()));
    }
    if let Some(product) = lead.product_name.as_deref().filter(|p| !p.is_empty()) {
        notes_pieces.push(format!("Product: {product}"));
    }
    if let Some(description) = lead.description.as_deref().filter(|d| !d.is_empty()) {
        notes_pieces.push(description.to_string());
    }

    let mut body = json!({
        "LastName": lead.caller_name.as_deref().unwrap_or("Web Lead"),
        "Company": "Individual",
        "Title": title_for_intent(lead.intent),
    });

    let map = body.as_object_mut().expect("object literal");
    if let Some(phone) = lead.mobile_phone.as_deref().filter(|p| !p.is_empty()) {
        map.insert("MobilePhone".to_string(), json!(phone));
    }
    if !notes_pieces.is_empty() {
        map.insert("Notes__c".to_string(), json!(notes_pieces.join("\n\n")));
    }
    if lead.intent.is_some() {
        map.insert("Rating".to_string(), json!("Hot"));
        map.insert("Lead_Temperature__c".to_string(), json!("Hot"));
    }

    body
}

#[async_trait]
impl CrmClient for SalesforceCrmClient {
    async fn create_lead(&self, lead: &NewCrmLead) -> Option<String> {
        if !self.config.is_configured() {
            tracing::debug!(call_sid = %lead.call_sid, "CRM not configured, lead skipped");
            return None;
        }

        let body = build_lead_body(lead);
        tracing::info!(call_sid = %lead.call_sid, "Creating CRM lead");

        let mut token = match self.token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(call_sid = %lead.call_sid, error = %e, "CRM token fetch failed");
                return None;
            }
        };

        for attempt in 0..2 {
            let response = match self.post_lead(&token, &body).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(call_sid = %lead.call_sid, error = %e, "CRM lead request failed");
                    return None;
                }
            };

            let status = response.status();
            if status.is_success() {
                let created: CreateLeadResponse = match response.json().await {
                    Ok(created) => created,
                    Err(e) => {
                        tracing::warn!(call_sid = %lead.call_sid, error = %e, "Bad CRM response");
                        return None;
                    }
                };
                tracing::info!(call_sid = %lead.call_sid, lead_id = ?created.id, "CRM lead created");
                return created.id;
            }

            if status.as_u16() == 401 && attempt == 0 {
                // Stale cached token: refresh and retry once.
                self.token.lock().take();
                token = match self.token().await {
                    Ok(token) => token,
                    Err(e) => {
                        tracing::warn!(call_sid = %lead.call_sid, error = %e, "CRM token refresh failed");
                        return None;
                    }
                };
                continue;
            }

            let body_text = response.text().await.unwrap_or_default();
            tracing::warn!(
                call_sid = %lead.call_sid,
                status = status.as_u16(),
                body = %body_text.chars().take(500).collect::<String>(),
                "CRM lead rejected"
            );
            return None;
        }

        None
    }
}
