//! Application State
//!
//! Shared state across all handlers, wired once at startup.

use std::sync::Arc;
use std::time::Duration;

use call_router_config::Settings;
use call_router_dialogue::{CrmSync, DialogueMachine};
use call_router_integrations::{
    CategoryInference, CrmClient, GeminiCategoryInference, GeminiClient, ModeratedSafetyCheck,
    NoopInference, SafetyCheck, SalesforceCrmClient,
};
use call_router_persistence::{EventLog, LeadStore, PersistenceLayer, PromptCatalog};
use call_router_routing::{AgentSelector, HandoffPlanner};
use call_router_telephony::{TwilioRestClient, VerifiedNumbers};

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<Settings>,
    /// The dialogue state machine driving every voice webhook
    pub machine: Arc<DialogueMachine>,
    /// Lead store for the call-context endpoint
    pub leads: Arc<dyn LeadStore>,
    /// Audit trail for the status/error logging endpoints
    pub events: Arc<dyn EventLog>,
    /// Prompt catalog (exposed for synchronous admin refresh)
    pub catalog: Arc<PromptCatalog>,
}

impl AppState {
    /// Wire all components from settings and the persistence layer.
    pub fn build(config: Settings, persistence: PersistenceLayer) -> Self {
        let config = Arc::new(config);

        let provider = Arc::new(TwilioRestClient::new(
            config.twilio.account_sid.clone(),
            config.twilio.auth_token.clone(),
        ));
        let verified = Arc::new(VerifiedNumbers::new(
            config.twilio.verified_outbound_numbers.clone(),
            provider.clone(),
            Duration::from_secs(config.twilio.verified_cache_ttl_secs),
        ));

        let gemini = if config.safety.gemini_api_key.is_empty() {
            None
        } else {
            Some(Arc::new(GeminiClient::new(
                config.safety.gemini_api_key.clone(),
                Duration::from_secs(config.safety.timeout_secs),
            )))
        };
        let safety: Arc<dyn SafetyCheck> = Arc::new(ModeratedSafetyCheck::new(gemini.clone()));
        let inference: Arc<dyn CategoryInference> = match gemini {
            Some(gemini) => Arc::new(GeminiCategoryInference::new(gemini)),
            None => Arc::new(NoopInference),
        };

        let crm: Arc<dyn CrmClient> = Arc::new(SalesforceCrmClient::new(config.crm.clone()));

        let events: Arc<dyn EventLog> = persistence.events.clone();
        let leads: Arc<dyn LeadStore> = persistence.leads.clone();

        let selector = AgentSelector::new(persistence.agents.clone(), events.clone());
        let handoff = HandoffPlanner::new(
            selector,
            verified,
            events.clone(),
            persistence.agents.clone(),
            persistence.calls.clone(),
            provider,
            config.twilio.caller_id.clone(),
        );

        let machine = Arc::new(DialogueMachine::new(
            persistence.calls.clone(),
            leads.clone(),
            events.clone(),
            persistence.catalog.clone(),
            safety,
            inference,
            CrmSync::new(crm, events.clone(), leads.clone()),
            handoff,
        ));

        Self {
            config,
            machine,
            leads,
            events,
            catalog: persistence.catalog,
        }
    }
}
