//! Webhook-driven dialogue transitions
//!
//! One method per inbound webhook. Every method re-reads the persisted
//! lead, applies the transition, and returns a complete voice reply;
//! collaborator or persistence failures degrade to a spoken fallback, so a
//! handler always has something valid to say.
//!
//! Input handling distinguishes two retry shapes: unrecognized speech gets
//! the "invalid" message plus the same question, while silence replays the
//! question with no extra message (the no-input redirect target would
//! otherwise double-speak the retry prompt).

use std::sync::Arc;

use serde_json::json;

use call_router_core::{Category, Intent, ALL_CATEGORIES};
use call_router_integrations::{CategoryInference, SafetyCheck};
use call_router_matcher::{resolve_assist_type, resolve_category, resolve_intent};
use call_router_persistence::{
    CallLead, CallStore, EventLog, InboundCallInfo, LeadStore, PromptCatalog,
};
use call_router_routing::{DialOutcome, HandoffPlanner};
use call_router_telephony::{GatherSpec, VoiceResponse, VoiceWebhookForm, LANGUAGE_CODE};

use crate::step::{actions, CategoryNext, DialogueStep, ProductPath};
use crate::sync::CrmSync;

pub struct DialogueMachine {
    calls: Arc<dyn CallStore>,
    leads: Arc<dyn LeadStore>,
    events: Arc<dyn EventLog>,
    catalog: Arc<PromptCatalog>,
    safety: Arc<dyn SafetyCheck>,
    inference: Arc<dyn CategoryInference>,
    crm_sync: CrmSync,
    handoff: HandoffPlanner,
}

impl DialogueMachine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        calls: Arc<dyn CallStore>,
        leads: Arc<dyn LeadStore>,
        events: Arc<dyn EventLog>,
        catalog: Arc<PromptCatalog>,
        safety: Arc<dyn SafetyCheck>,
        inference: Arc<dyn CategoryInference>,
        crm_sync: CrmSync,
        handoff: HandoffPlanner,
    ) -> Self {
        Self {
            calls,
            leads,
            events,
            catalog,
            safety,
            inference,
            crm_sync,
            handoff,
        }
    }

    // ==================== entry ====================

    /// Entry webhook: greeting plus the main menu.
    pub async fn entry(&self, form: &VoiceWebhookForm) -> VoiceResponse {
        let call_sid = form.sid();

        match self.calls.ensure_call(&inbound_info(form)).await {
            Ok(call) => {
                if let Err(e) = self.leads.link_call(call_sid, call.id).await {
                    tracing::warn!(call_sid, error = %e, "Failed to link lead to call");
                }
            }
            Err(e) => {
                tracing::warn!(call_sid, error = %e, "Failed to ensure call record");
            }
        }

        self.events
            .audit(
                Some(call_sid),
                "CALL_RECEIVED",
                json!({ "from": form.from, "caller_country": form.caller_country }),
            )
            .await;

        let language = self
            .lead(call_sid)
            .await
            .and_then(|l| l.preferred_language)
            .unwrap_or_else(|| LANGUAGE_CODE.to_string());
        let greeting = self.catalog.greeting(&language).await;

        let mut response = VoiceResponse::new();
        response.say(&greeting);
        self.question(&mut response, call_sid, DialogueStep::Intent, actions::ENTRY, true)
            .await;
        response
    }

    // ==================== intent ====================

    /// Main menu choice: general inquiry / try near you / price request.
    pub async fn intent(&self, form: &VoiceWebhookForm) -> VoiceResponse {
        let call_sid = form.sid();
        self.events
            .audit(
                Some(call_sid),
                "INTENT_SPEECH_RECEIVED",
                json!({ "speech": form.speech_result }),
            )
            .await;

        let Some(intent) = resolve_intent(form.speech()) else {
            self.events
                .audit(
                    Some(call_sid),
                    "INTENT_NOT_RECOGNIZED",
                    json!({ "speech": form.speech_result }),
                )
                .await;

            let mut response = VoiceResponse::new();
            self.say_prompt(&mut response, call_sid, "invalid").await;
            self.question(&mut response, call_sid, DialogueStep::Intent, actions::ENTRY, true)
                .await;
            return response;
        };

        if let Err(e) = self.leads.set_intent(call_sid, intent).await {
            tracing::warn!(call_sid, error = %e, "Failed to persist intent");
        }
        self.events
            .audit(
                Some(call_sid),
                "INTENT_SELECTED",
                json!({ "intent": intent.as_str(), "speech": form.speech_result }),
            )
            .await;

        // Ask for the caller's name; silence continues the flow anyway.
        let mut response = VoiceResponse::new();
        self.ask(&mut response, call_sid, DialogueStep::Name, None).await;
        response.redirect(actions::NAME_FALLBACK);
        response
    }

    // ==================== name ====================

    /// Collect the caller's name, screen it, then continue by intent.
    pub async fn name(&self, form: &VoiceWebhookForm) -> VoiceResponse {
        let call_sid = form.sid();

        if let Some(caller_name) = form.speech() {
            if self.safety.is_profane(caller_name).await {
                self.events
                    .audit(
                        Some(call_sid),
                        "CALLER_NAME_PROFANITY_REJECTED",
                        json!({ "name": caller_name }),
                    )
                    .await;

                let mut response = VoiceResponse::new();
                self.ask(
                    &mut response,
                    call_sid,
                    DialogueStep::Name,
                    Some("name_profanity_failed_prompt"),
                )
                .await;
                response.redirect(actions::NAME_FALLBACK);
                return response;
            }

            if let Err(e) = self.leads.set_caller_name(call_sid, caller_name).await {
                tracing::warn!(call_sid, error = %e, "Failed to persist caller name");
            }
            self.events
                .audit(
                    Some(call_sid),
                    "CALLER_NAME_CAPTURED",
                    json!({ "name": caller_name }),
                )
                .await;
        } else {
            self.events
                .audit(Some(call_sid), "CALLER_NAME_NOT_PROVIDED", json!({}))
                .await;
        }

        self.continue_after_name(call_sid, form.from.as_deref()).await
    }

    /// No-input fallback: continue without a name.
    pub async fn name_fallback(&self, form: &VoiceWebhookForm) -> VoiceResponse {
        let call_sid = form.sid();
        self.events
            .audit(Some(call_sid), "CALLER_NAME_SKIPPED", json!({}))
            .await;
        self.continue_after_name(call_sid, form.from.as_deref()).await
    }

    async fn continue_after_name(&self, call_sid: &str, from: Option<&str>) -> VoiceResponse {
        let lead = self.lead(call_sid).await;
        let intent = lead.as_ref().and_then(|l| l.intent);

        self.events
            .audit(
                Some(call_sid),
                "INTENT_LOOKUP_AFTER_NAME",
                json!({
                    "intent": intent.map(|i| i.as_str()),
                    "has_lead": lead.is_some(),
                }),
            )
            .await;

        let mut response = VoiceResponse::new();
        match intent {
            Some(Intent::GeneralInquiry) | Some(Intent::Store) => {
                self.question(
                    &mut response,
                    call_sid,
                    DialogueStep::AssistType,
                    actions::NAME_FALLBACK,
                    true,
                )
                .await;
                response
            }
            Some(Intent::PriceRequest) => {
                self.question(
                    &mut response,
                    call_sid,
                    DialogueStep::ProductName(ProductPath::Price),
                    actions::NAME_FALLBACK,
                    true,
                )
                .await;
                response
            }
            // No usable intent: hand the call to a default agent.
            None => self.connect_default(call_sid, from).await,
        }
    }

    // ==================== assist type ====================

    /// Product-level or category-level help.
    pub async fn assist_type(&self, form: &VoiceWebhookForm) -> VoiceResponse {
        let call_sid = form.sid();
        self.events
            .audit(
                Some(call_sid),
                "ASSIST_TYPE_SPEECH_RECEIVED",
                json!({ "speech": form.speech_result }),
            )
            .await;

        let Some(choice) = resolve_assist_type(form.speech()) else {
            self.events
                .audit(
                    Some(call_sid),
                    "ASSIST_TYPE_NOT_RECOGNIZED",
                    json!({ "speech": form.speech_result }),
                )
                .await;

            let mut response = VoiceResponse::new();
            self.say_prompt(&mut response, call_sid, "invalid").await;
            self.question(
                &mut response,
                call_sid,
                DialogueStep::AssistType,
                actions::NAME_FALLBACK,
                true,
            )
            .await;
            return response;
        };

        if let Err(e) = self.leads.set_assist_type(call_sid, choice).await {
            tracing::warn!(call_sid, error = %e, "Failed to persist assist type");
        }
        self.events
            .audit(
                Some(call_sid),
                "ASSIST_TYPE_SELECTED",
                json!({ "assist_type": choice.as_str() }),
            )
            .await;

        let next = match choice {
            call_router_core::AssistType::Product => DialogueStep::ProductName(ProductPath::General),
            call_router_core::AssistType::Category => {
                DialogueStep::CategoryCollect(CategoryNext::Connect)
            }
        };

        let mut response = VoiceResponse::new();
        self.question(&mut response, call_sid, next, actions::NAME_FALLBACK, true)
            .await;
        response
    }

    // ==================== product name ====================

    /// Collect the product name and connect. Used by both the general
    /// product path and the direct price-request path.
    pub async fn product_name(&self, form: &VoiceWebhookForm, path: ProductPath) -> VoiceResponse {
        let call_sid = form.sid();
        let step = DialogueStep::ProductName(path);

        let Some(product_name) = form.speech() else {
            self.events
                .audit(Some(call_sid), path.missing_event(), json!({}))
                .await;

            // Silence: replay the question with no extra message.
            let mut response = VoiceResponse::new();
            self.question(&mut response, call_sid, step, step.action(), true)
                .await;
            return response;
        };

        if let Err(e) = self.leads.set_product_name(call_sid, product_name).await {
            tracing::warn!(call_sid, error = %e, "Failed to persist product name");
        }
        self.infer_category_if_unset(call_sid, product_name).await;
        self.events
            .audit(
                Some(call_sid),
                path.captured_event(),
                json!({ "product_name": product_name }),
            )
            .await;

        // This path skips the description step: sync and connect directly.
        self.crm_sync
            .sync_once(call_sid, form.from.as_deref(), None)
            .await;

        let lead = self.lead(call_sid).await;
        let mut response = VoiceResponse::new();
        self.connect(
            &mut response,
            call_sid,
            lead.as_ref().and_then(|l| l.selected_category),
            lead.as_ref().and_then(|l| l.currency.clone()),
            form.from.as_deref(),
        )
        .await;
        response
    }

    /// Infer and store a category from a spoken product name when none is
    /// set yet: the deterministic matcher first, then the classifier.
    async fn infer_category_if_unset(&self, call_sid: &str, product_name: &str) {
        let existing = self.lead(call_sid).await.and_then(|l| l.selected_category);
        if existing.is_some() {
            return;
        }

        let corrections = self.catalog.corrections().await;
        let mut resolved = resolve_category(Some(product_name), &corrections);
        if resolved.is_none() {
            resolved = self
                .inference
                .infer_category(product_name, &ALL_CATEGORIES)
                .await;
        }

        if let Some(category) = resolved {
            if let Err(e) = self.leads.set_category(call_sid, category).await {
                tracing::warn!(call_sid, error = %e, "Failed to persist inferred category");
                return;
            }
            self.events
                .audit(
                    Some(call_sid),
                    "CATEGORY_INFERRED_FROM_PRODUCT_NAME",
                    json!({
                        "category": category.as_str(),
                        "raw_product_name": product_name,
                    }),
                )
                .await;
        }
    }

    // ==================== category ====================

    /// Collect a category. The continuation decides what a match leads to:
    /// connect directly, or ask for the product name first.
    pub async fn category(&self, form: &VoiceWebhookForm, next: CategoryNext) -> VoiceResponse {
        let call_sid = form.sid();
        let step = DialogueStep::CategoryCollect(next);
        let corrections = self.catalog.corrections().await;
        let resolved = resolve_category(form.speech(), &corrections);

        match (resolved, form.speech()) {
            (Some(category), raw) => {
                if let Err(e) = self.leads.set_category(call_sid, category).await {
                    tracing::warn!(call_sid, error = %e, "Failed to persist category");
                }
                self.events
                    .audit(
                        Some(call_sid),
                        next.captured_event(),
                        json!({ "category": category.as_str(), "raw": raw }),
                    )
                    .await;

                match next {
                    CategoryNext::Connect => {
                        self.crm_sync
                            .sync_once(call_sid, form.from.as_deref(), None)
                            .await;

                        let lead = self.lead(call_sid).await;
                        let mut response = VoiceResponse::new();
                        self.connect(
                            &mut response,
                            call_sid,
                            Some(category),
                            lead.as_ref().and_then(|l| l.currency.clone()),
                            form.from.as_deref(),
                        )
                        .await;
                        response
                    }
                    CategoryNext::ProductName => {
                        let product_step = DialogueStep::ProductName(ProductPath::General);
                        let mut response = VoiceResponse::new();
                        self.question(
                            &mut response,
                            call_sid,
                            product_step,
                            product_step.action(),
                            true,
                        )
                        .await;
                        response
                    }
                }
            }
            (None, Some(raw)) => {
                // Spoken input present but not an allowed category.
                self.events
                    .audit(
                        Some(call_sid),
                        next.unrecognized_event(),
                        json!({ "speech": raw }),
                    )
                    .await;

                let mut response = VoiceResponse::new();
                self.say_prompt(&mut response, call_sid, "invalid").await;
                self.question(&mut response, call_sid, step, step.action(), true)
                    .await;
                response
            }
            (None, None) => {
                self.events
                    .audit(Some(call_sid), next.missing_event(), json!({}))
                    .await;

                let mut response = VoiceResponse::new();
                self.question(&mut response, call_sid, step, step.action(), true)
                    .await;
                response
            }
        }
    }

    // ==================== description ====================

    /// Optional free-text description; always proceeds to connect.
    pub async fn description(&self, form: &VoiceWebhookForm) -> VoiceResponse {
        let call_sid = form.sid();

        let description = form.speech();
        if let Some(text) = description {
            if let Err(e) = self.leads.set_description(call_sid, text).await {
                tracing::warn!(call_sid, error = %e, "Failed to persist description");
            }
            self.events
                .audit(
                    Some(call_sid),
                    "CALLER_DESCRIPTION_CAPTURED",
                    json!({ "description": text }),
                )
                .await;
        }

        self.crm_sync
            .sync_once(call_sid, form.from.as_deref(), description)
            .await;

        let lead = self.lead(call_sid).await;
        let mut response = VoiceResponse::new();
        self.connect(
            &mut response,
            call_sid,
            lead.as_ref().and_then(|l| l.selected_category),
            lead.as_ref().and_then(|l| l.currency.clone()),
            form.from.as_deref(),
        )
        .await;
        response
    }

    // ==================== dial completion ====================

    /// Provider callback after the dial finished. Records the outcome;
    /// no further dialogue action.
    pub async fn dial_complete(&self, form: &VoiceWebhookForm) -> VoiceResponse {
        self.handoff.complete(form).await;
        VoiceResponse::new()
    }

    // ==================== helpers ====================

    async fn connect_default(&self, call_sid: &str, from: Option<&str>) -> VoiceResponse {
        self.events
            .audit(Some(call_sid), "CONNECTING_TO_DEFAULT_AGENT", json!({}))
            .await;

        // This degenerate path persists nothing new and creates no CRM lead.
        let mut response = VoiceResponse::new();
        self.connect(&mut response, call_sid, None, None, from).await;
        response
    }

    /// Plan the handoff and append either the dial or the apology.
    async fn connect(
        &self,
        response: &mut VoiceResponse,
        call_sid: &str,
        category: Option<Category>,
        currency: Option<String>,
        from: Option<&str>,
    ) {
        match self
            .handoff
            .plan(call_sid, category, currency.as_deref(), from)
            .await
        {
            DialOutcome::NoAgent => {
                self.say_prompt(response, call_sid, "no_agent").await;
            }
            DialOutcome::Dial(spec) => {
                self.say_prompt(response, call_sid, "connecting").await;
                response.dial(spec);
            }
        }
    }

    /// Speak a prompt from the catalog and audit what was said.
    async fn say_prompt(&self, response: &mut VoiceResponse, call_sid: &str, key: &str) {
        let text = self.catalog.prompt(key).await;
        self.events
            .audit(
                Some(call_sid),
                "IVR_SAY",
                json!({ "prompt": key, "message": text }),
            )
            .await;
        response.say(&text);
    }

    /// Append a gather for one dialogue step.
    async fn ask(
        &self,
        response: &mut VoiceResponse,
        call_sid: &str,
        step: DialogueStep,
        prompt_override: Option<&str>,
    ) {
        let key = prompt_override.unwrap_or_else(|| step.prompt_key());
        let text = self.catalog.prompt(key).await;
        self.events
            .audit(
                Some(call_sid),
                "IVR_SAY",
                json!({ "prompt": key, "message": text }),
            )
            .await;

        let mut spec = GatherSpec::new(step.action(), step.timeout(), text);
        if let Some(hints) = step.hints() {
            spec = spec.with_hints(hints);
        }
        response.gather(spec);
    }

    /// A full question: gather, then the no-input tail (optional retry
    /// prompt plus redirect).
    async fn question(
        &self,
        response: &mut VoiceResponse,
        call_sid: &str,
        step: DialogueStep,
        no_input_redirect: &str,
        speak_reprompt: bool,
    ) {
        self.ask(response, call_sid, step, None).await;
        if speak_reprompt {
            self.say_prompt(response, call_sid, "reprompt").await;
        }
        response.redirect(no_input_redirect);
    }

    async fn lead(&self, call_sid: &str) -> Option<CallLead> {
        match self.leads.get(call_sid).await {
            Ok(lead) => lead,
            Err(e) => {
                tracing::warn!(call_sid, error = %e, "Lead lookup failed");
                None
            }
        }
    }
}

fn inbound_info(form: &VoiceWebhookForm) -> InboundCallInfo {
    InboundCallInfo {
        call_sid: form.sid().to_string(),
        from_number: form.from.clone(),
        to_number: form.to.clone(),
        caller_country: form.caller_country.clone(),
        caller_state: form.caller_state.clone(),
        caller_city: form.caller_city.clone(),
        call_status: form.call_status.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use call_router_core::{AssistType, Region};
    use call_router_integrations::{CrmClient, NewCrmLead};
    use call_router_persistence::{
        AgentRow, CallRecord, ConfigRepo, ConfigSnapshot, LeadContext, PersistenceError,
    };
    use call_router_routing::AgentSelector;
    use call_router_telephony::{ProviderAccount, TelephonyError, VerifiedNumbers};
    use chrono::Utc;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::time::Duration;
    use uuid::Uuid;

    // ---------- fakes ----------

    #[derive(Default)]
    struct InMemoryCalls {
        calls: Mutex<HashMap<String, CallRecord>>,
    }

    #[async_trait]
    impl CallStore for InMemoryCalls {
        async fn ensure_call(
            &self,
            info: &InboundCallInfo,
        ) -> Result<CallRecord, PersistenceError> {
            let mut calls = self.calls.lock();
            let record = calls
                .entry(info.call_sid.clone())
                .or_insert_with(|| CallRecord {
                    id: Uuid::new_v4(),
                    call_sid: info.call_sid.clone(),
                    from_number: info.from_number.clone(),
                    to_number: info.to_number.clone(),
                    caller_country: info.caller_country.clone(),
                    caller_state: info.caller_state.clone(),
                    caller_city: info.caller_city.clone(),
                    call_start: Utc::now(),
                    call_end: None,
                    final_handler: None,
                    call_status: info.call_status.clone(),
                });
            Ok(record.clone())
        }

        async fn find_by_sid(
            &self,
            call_sid: &str,
        ) -> Result<Option<CallRecord>, PersistenceError> {
            Ok(self.calls.lock().get(call_sid).cloned())
        }

        async fn mark_completed(
            &self,
            _call_sid: &str,
            _status: &str,
            _handler: &str,
        ) -> Result<(), PersistenceError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct InMemoryLeads {
        leads: Mutex<HashMap<String, CallLead>>,
    }

    impl InMemoryLeads {
        fn blank(call_sid: &str) -> CallLead {
            CallLead {
                id: Uuid::new_v4(),
                call_id: None,
                call_sid: call_sid.to_string(),
                page_context: "home".to_string(),
                selected_category: None,
                currency: None,
                preferred_language: None,
                user_type: None,
                customer_id: None,
                product_id: None,
                intent: None,
                assist_type: None,
                caller_name: None,
                caller_description: None,
                extra_metadata: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }
        }

        fn with<F: FnOnce(&mut CallLead)>(&self, call_sid: &str, f: F) {
            let mut leads = self.leads.lock();
            let lead = leads
                .entry(call_sid.to_string())
                .or_insert_with(|| Self::blank(call_sid));
            f(lead);
        }
    }

    #[async_trait]
    impl LeadStore for InMemoryLeads {
        async fn upsert_context(&self, ctx: &LeadContext) -> Result<CallLead, PersistenceError> {
            self.with(&ctx.call_sid, |lead| {
                if let Some(currency) = &ctx.currency {
                    lead.currency = Some(currency.to_uppercase());
                }
            });
            Ok(self.leads.lock().get(&ctx.call_sid).cloned().unwrap())
        }

        async fn get(&self, call_sid: &str) -> Result<Option<CallLead>, PersistenceError> {
            Ok(self.leads.lock().get(call_sid).cloned())
        }

        async fn link_call(&self, call_sid: &str, call_id: Uuid) -> Result<(), PersistenceError> {
            self.with(call_sid, |lead| {
                if lead.call_id.is_none() {
                    lead.call_id = Some(call_id);
                }
            });
            Ok(())
        }

        async fn set_intent(&self, call_sid: &str, intent: Intent) -> Result<(), PersistenceError> {
            self.with(call_sid, |lead| lead.intent = Some(intent));
            Ok(())
        }

        async fn set_assist_type(
            &self,
            call_sid: &str,
            assist_type: AssistType,
        ) -> Result<(), PersistenceError> {
            self.with(call_sid, |lead| lead.assist_type = Some(assist_type));
            Ok(())
        }

        async fn set_caller_name(
            &self,
            call_sid: &str,
            name: &str,
        ) -> Result<(), PersistenceError> {
            self.with(call_sid, |lead| lead.caller_name = Some(name.to_string()));
            Ok(())
        }

        async fn set_product_name(
            &self,
            call_sid: &str,
            name: &str,
        ) -> Result<(), PersistenceError> {
            self.with(call_sid, |lead| lead.product_id = Some(name.to_string()));
            Ok(())
        }

        async fn set_description(
            &self,
            call_sid: &str,
            text: &str,
        ) -> Result<(), PersistenceError> {
            self.with(call_sid, |lead| {
                lead.caller_description = Some(text.to_string())
            });
            Ok(())
        }

        async fn set_category(
            &self,
            call_sid: &str,
            category: Category,
        ) -> Result<(), PersistenceError> {
            self.with(call_sid, |lead| lead.selected_category = Some(category));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingEvents {
        events: Mutex<Vec<(Option<String>, String)>>,
    }

    impl RecordingEvents {
        fn names(&self) -> Vec<String> {
            self.events.lock().iter().map(|(_, t)| t.clone()).collect()
        }
    }

    #[async_trait]
    impl EventLog for RecordingEvents {
        async fn record(
            &self,
            call_sid: Option<&str>,
            event_type: &str,
            _payload: serde_json::Value,
        ) -> Result<(), PersistenceError> {
            self.events
                .lock()
                .push((call_sid.map(|s| s.to_string()), event_type.to_string()));
            Ok(())
        }

        async fn has_any(
            &self,
            call_sid: &str,
            event_types: &[&str],
        ) -> Result<bool, PersistenceError> {
            Ok(self.events.lock().iter().any(|(sid, t)| {
                sid.as_deref() == Some(call_sid) && event_types.contains(&t.as_str())
            }))
        }

        async fn record_routing_decision(
            &self,
            _call_sid: Option<&str>,
            _caller_country: Option<&str>,
            _routing_rule: &str,
            _routed_to: &str,
        ) -> Result<(), PersistenceError> {
            Ok(())
        }

        async fn record_agent_assignment(
            &self,
            _call_sid: &str,
            _agent_id: i64,
            _agent_region: &str,
        ) -> Result<(), PersistenceError> {
            Ok(())
        }
    }

    struct EmptyRepo;

    #[async_trait]
    impl ConfigRepo for EmptyRepo {
        async fn load(&self) -> Result<ConfigSnapshot, PersistenceError> {
            Ok(ConfigSnapshot::default())
        }
    }

    struct FixedSafety {
        profane: bool,
    }

    #[async_trait]
    impl SafetyCheck for FixedSafety {
        async fn is_profane(&self, _text: &str) -> bool {
            self.profane
        }
    }

    struct FixedInference {
        result: Option<Category>,
    }

    #[async_trait]
    impl CategoryInference for FixedInference {
        async fn infer_category(
            &self,
            _product_name: &str,
            _allowed: &[Category],
        ) -> Option<Category> {
            self.result
        }
    }

    #[derive(Default)]
    struct CountingCrm {
        count: Mutex<usize>,
    }

    #[async_trait]
    impl CrmClient for CountingCrm {
        async fn create_lead(&self, _lead: &NewCrmLead) -> Option<String> {
            *self.count.lock() += 1;
            Some("00Q-test".to_string())
        }
    }

    struct FixedAgents {
        rows: Vec<AgentRow>,
    }

    #[async_trait]
    impl call_router_persistence::AgentStore for FixedAgents {
        async fn specialists(
            &self,
            _category: &str,
            _regions: &[Region],
            limit: i64,
        ) -> Result<Vec<AgentRow>, PersistenceError> {
            Ok(self.rows.iter().take(limit as usize).cloned().collect())
        }

        async fn specialists_excluding(
            &self,
            _exclude: Option<&str>,
            _regions: &[Region],
            limit: i64,
        ) -> Result<Vec<AgentRow>, PersistenceError> {
            Ok(self.rows.iter().take(limit as usize).cloned().collect())
        }

        async fn regional_defaults(
            &self,
            _regions: &[Region],
        ) -> Result<Vec<AgentRow>, PersistenceError> {
            Ok(self.rows.clone())
        }

        async fn find_by_phone(&self, phone: &str) -> Result<Vec<AgentRow>, PersistenceError> {
            Ok(self
                .rows
                .iter()
                .filter(|a| a.phone_number == phone)
                .cloned()
                .collect())
        }
    }

    struct NoProvider;

    #[async_trait]
    impl ProviderAccount for NoProvider {
        async fn verified_numbers(&self) -> Result<Vec<String>, TelephonyError> {
            Ok(Vec::new())
        }

        async fn call_to_number(&self, _call_sid: &str) -> Result<Option<String>, TelephonyError> {
            Ok(None)
        }
    }

    // ---------- harness ----------

    struct Harness {
        machine: DialogueMachine,
        leads: Arc<InMemoryLeads>,
        events: Arc<RecordingEvents>,
        crm: Arc<CountingCrm>,
    }

    struct HarnessConfig {
        profane: bool,
        inferred: Option<Category>,
        agent_phones: Vec<&'static str>,
    }

    impl Default for HarnessConfig {
        fn default() -> Self {
            Self {
                profane: false,
                inferred: None,
                agent_phones: vec!["+14155550100"],
            }
        }
    }

    fn harness(config: HarnessConfig) -> Harness {
        let calls: Arc<InMemoryCalls> = Arc::new(InMemoryCalls::default());
        let leads = Arc::new(InMemoryLeads::default());
        let events = Arc::new(RecordingEvents::default());
        let crm = Arc::new(CountingCrm::default());
        let catalog = Arc::new(PromptCatalog::new(
            Arc::new(EmptyRepo),
            Duration::from_secs(300),
        ));

        let agents = Arc::new(FixedAgents {
            rows: config
                .agent_phones
                .iter()
                .enumerate()
                .map(|(i, phone)| AgentRow {
                    id: i as i64 + 1,
                    name: format!("agent-{i}"),
                    phone_number: phone.to_string(),
                    region: Region::Us,
                    is_active: true,
                    is_default: true,
                })
                .collect(),
        });
        let provider = Arc::new(NoProvider);
        let verified = Arc::new(VerifiedNumbers::new(
            Vec::new(),
            provider.clone(),
            Duration::from_secs(300),
        ));
        let selector = AgentSelector::new(agents.clone(), events.clone());
        let handoff = HandoffPlanner::new(
            selector,
            verified,
            events.clone(),
            agents,
            calls.clone(),
            provider,
            None,
        );

        let machine = DialogueMachine::new(
            calls,
            leads.clone(),
            events.clone(),
            catalog,
            Arc::new(FixedSafety {
                profane: config.profane,
            }),
            Arc::new(FixedInference {
                result: config.inferred,
            }),
            CrmSync::new(crm.clone(), events.clone(), leads.clone()),
            handoff,
        );

        Harness {
            machine,
            leads,
            events,
            crm,
        }
    }

    fn form(call_sid: &str, speech: Option<&str>) -> VoiceWebhookForm {
        VoiceWebhookForm {
            call_sid: Some(call_sid.to_string()),
            from: Some("+14155551234".to_string()),
            speech_result: speech.map(|s| s.to_string()),
            ..Default::default()
        }
    }

    fn count_occurrences(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    // ---------- tests ----------

    #[tokio::test]
    async fn test_entry_greets_and_asks_intent() {
        let h = harness(HarnessConfig::default());
        let xml = h.machine.entry(&form("CA1", None)).await.render();

        assert!(xml.contains("Namaste"));
        assert!(xml.contains("action=\"/voice/intent\""));
        assert!(xml.contains("<Redirect method=\"POST\">/voice</Redirect>"));
        assert!(h.events.names().contains(&"CALL_RECEIVED".to_string()));
    }

    #[tokio::test]
    async fn test_unmatched_intent_plays_invalid_once_and_reasks() {
        let h = harness(HarnessConfig::default());
        let xml = h
            .machine
            .intent(&form("CA1", Some("purple monkey")))
            .await
            .render();

        assert_eq!(count_occurrences(&xml, "understand that"), 1);
        assert!(xml.contains("action=\"/voice/intent\""));
        assert!(h
            .events
            .names()
            .contains(&"INTENT_NOT_RECOGNIZED".to_string()));
    }

    #[tokio::test]
    async fn test_matched_intent_persists_and_asks_name() {
        let h = harness(HarnessConfig::default());
        let xml = h
            .machine
            .intent(&form("CA1", Some("I want a price request")))
            .await
            .render();

        let lead = h.leads.get("CA1").await.unwrap().unwrap();
        assert_eq!(lead.intent, Some(Intent::PriceRequest));
        assert!(xml.contains("action=\"/voice/name\""));
        assert!(xml.contains("/voice/name-fallback</Redirect>"));
        // No retry prompt on the name question - silence just continues.
        assert!(!xml.contains("did not catch"));
    }

    #[tokio::test]
    async fn test_profane_name_is_rejected_and_reasked() {
        let h = harness(HarnessConfig {
            profane: true,
            ..Default::default()
        });
        let xml = h.machine.name(&form("CA1", Some("badword"))).await.render();

        assert!(xml.contains("action=\"/voice/name\""));
        assert!(h
            .events
            .names()
            .contains(&"CALLER_NAME_PROFANITY_REJECTED".to_string()));
        let lead = h.leads.get("CA1").await.unwrap();
        assert!(lead.map_or(true, |l| l.caller_name.is_none()));
    }

    #[tokio::test]
    async fn test_empty_name_continues_to_assist_type() {
        let h = harness(HarnessConfig::default());
        h.leads
            .set_intent("CA1", Intent::GeneralInquiry)
            .await
            .unwrap();

        let xml = h.machine.name(&form("CA1", None)).await.render();
        assert!(xml.contains("action=\"/voice/assist-type\""));
        assert!(h
            .events
            .names()
            .contains(&"CALLER_NAME_NOT_PROVIDED".to_string()));
    }

    #[tokio::test]
    async fn test_price_intent_goes_straight_to_product_name() {
        let h = harness(HarnessConfig::default());
        h.leads.set_intent("CA1", Intent::PriceRequest).await.unwrap();

        let xml = h.machine.name(&form("CA1", Some("Priya"))).await.render();
        assert!(xml.contains("action=\"/voice/price-product\""));
        let lead = h.leads.get("CA1").await.unwrap().unwrap();
        assert_eq!(lead.caller_name.as_deref(), Some("Priya"));
    }

    #[tokio::test]
    async fn test_missing_intent_connects_to_default_agent() {
        let h = harness(HarnessConfig::default());
        let xml = h.machine.name_fallback(&form("CA1", None)).await.render();

        assert!(xml.contains("<Dial"));
        assert!(xml.contains("+14155550100"));
        assert!(h
            .events
            .names()
            .contains(&"CONNECTING_TO_DEFAULT_AGENT".to_string()));
        // The degenerate path creates no CRM lead.
        assert_eq!(*h.crm.count.lock(), 0);
    }

    #[tokio::test]
    async fn test_assist_type_product_asks_product_name() {
        let h = harness(HarnessConfig::default());
        let xml = h
            .machine
            .assist_type(&form("CA1", Some("a specific product")))
            .await
            .render();

        assert!(xml.contains("action=\"/voice/product-id\""));
        let lead = h.leads.get("CA1").await.unwrap().unwrap();
        assert_eq!(lead.assist_type, Some(AssistType::Product));
    }

    #[tokio::test]
    async fn test_assist_type_tie_break_asks_category() {
        let h = harness(HarnessConfig::default());
        let xml = h
            .machine
            .assist_type(&form("CA1", Some("product category")))
            .await
            .render();

        assert!(xml.contains("action=\"/voice/category-name\""));
    }

    #[tokio::test]
    async fn test_empty_product_name_retries_without_invalid() {
        let h = harness(HarnessConfig::default());
        let xml = h
            .machine
            .product_name(&form("CA1", None), ProductPath::General)
            .await
            .render();

        assert!(xml.contains("action=\"/voice/product-id\""));
        assert!(xml.contains("/voice/product-id</Redirect>"));
        assert!(!xml.contains("understand that"));
        assert!(!xml.contains("<Dial"));
    }

    #[tokio::test]
    async fn test_product_name_infers_category_and_connects() {
        let h = harness(HarnessConfig::default());
        let xml = h
            .machine
            .product_name(&form("CA1", Some("a gold necklace")), ProductPath::Price)
            .await
            .render();

        let lead = h.leads.get("CA1").await.unwrap().unwrap();
        assert_eq!(lead.selected_category, Some(Category::Necklace));
        assert_eq!(lead.product_id.as_deref(), Some("a gold necklace"));
        assert!(xml.contains("<Dial"));
        assert_eq!(*h.crm.count.lock(), 1);
    }

    #[tokio::test]
    async fn test_classifier_fallback_when_matcher_cannot_place_product() {
        let h = harness(HarnessConfig {
            inferred: Some(Category::Earrings),
            ..Default::default()
        });
        h.machine
            .product_name(&form("CA1", Some("sparkly danglers")), ProductPath::General)
            .await;

        let lead = h.leads.get("CA1").await.unwrap().unwrap();
        assert_eq!(lead.selected_category, Some(Category::Earrings));
    }

    #[tokio::test]
    async fn test_existing_category_is_not_overwritten_by_inference() {
        let h = harness(HarnessConfig {
            inferred: Some(Category::Earrings),
            ..Default::default()
        });
        h.leads.set_category("CA1", Category::Bangles).await.unwrap();

        h.machine
            .product_name(&form("CA1", Some("something shiny")), ProductPath::General)
            .await;

        let lead = h.leads.get("CA1").await.unwrap().unwrap();
        assert_eq!(lead.selected_category, Some(Category::Bangles));
    }

    #[tokio::test]
    async fn test_unrecognized_category_plays_invalid_and_reasks() {
        let h = harness(HarnessConfig::default());
        let xml = h
            .machine
            .category(&form("CA1", Some("wrist watches")), CategoryNext::Connect)
            .await
            .render();

        assert_eq!(count_occurrences(&xml, "understand that"), 1);
        assert!(xml.contains("action=\"/voice/category-name\""));
        assert!(!xml.contains("<Dial"));
    }

    #[tokio::test]
    async fn test_silent_category_reasks_without_invalid() {
        let h = harness(HarnessConfig::default());
        let xml = h
            .machine
            .category(&form("CA1", None), CategoryNext::Connect)
            .await
            .render();

        assert!(!xml.contains("understand that"));
        assert!(xml.contains("action=\"/voice/category-name\""));
        assert!(xml.contains("/voice/category-name</Redirect>"));
    }

    #[tokio::test]
    async fn test_category_match_with_connect_continuation_dials() {
        let h = harness(HarnessConfig::default());
        let xml = h
            .machine
            .category(&form("CA1", Some("earrings please")), CategoryNext::Connect)
            .await
            .render();

        let lead = h.leads.get("CA1").await.unwrap().unwrap();
        assert_eq!(lead.selected_category, Some(Category::Earrings));
        assert!(xml.contains("connect you to our expert"));
        assert!(xml.contains("<Dial"));
        assert_eq!(*h.crm.count.lock(), 1);
    }

    #[tokio::test]
    async fn test_category_match_with_product_continuation_asks_product() {
        let h = harness(HarnessConfig::default());
        let xml = h
            .machine
            .category(&form("CA1", Some("bangles")), CategoryNext::ProductName)
            .await
            .render();

        assert!(xml.contains("action=\"/voice/product-id\""));
        assert!(!xml.contains("<Dial"));
        // Product-first continuation syncs the CRM later, at connect.
        assert_eq!(*h.crm.count.lock(), 0);
    }

    #[tokio::test]
    async fn test_description_always_connects() {
        let h = harness(HarnessConfig::default());
        let xml = h.machine.description(&form("CA1", None)).await.render();
        assert!(xml.contains("<Dial"));

        let xml = h
            .machine
            .description(&form("CA2", Some("looking for a wedding set")))
            .await
            .render();
        assert!(xml.contains("<Dial"));
        let lead = h.leads.get("CA2").await.unwrap().unwrap();
        assert_eq!(
            lead.caller_description.as_deref(),
            Some("looking for a wedding set")
        );
    }

    #[tokio::test]
    async fn test_crm_sync_fires_at_most_once_across_paths() {
        let h = harness(HarnessConfig::default());

        // First connect via the price-product path.
        h.machine
            .product_name(&form("CA1", Some("gold necklace")), ProductPath::Price)
            .await;
        assert_eq!(*h.crm.count.lock(), 1);

        // A second connect via the description path must not sync again.
        h.machine.description(&form("CA1", Some("more detail"))).await;
        assert_eq!(*h.crm.count.lock(), 1);

        // A different call gets its own sync.
        h.machine
            .product_name(&form("CA2", Some("gold necklace")), ProductPath::Price)
            .await;
        assert_eq!(*h.crm.count.lock(), 2);
    }

    #[tokio::test]
    async fn test_no_agent_configured_plays_apology_without_dial() {
        let h = harness(HarnessConfig {
            agent_phones: vec![],
            ..Default::default()
        });
        let xml = h
            .machine
            .category(&form("CA1", Some("earrings")), CategoryNext::Connect)
            .await
            .render();

        assert!(xml.contains("cannot connect your call"));
        assert!(!xml.contains("<Dial"));
    }

    #[tokio::test]
    async fn test_dial_complete_is_terminal_and_silent() {
        let h = harness(HarnessConfig::default());
        let xml = h.machine.dial_complete(&form("CA1", None)).await.render();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response></Response>"
        );
    }
}
