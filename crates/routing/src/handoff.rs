//! Call handoff
//!
//! Turns an ordered candidate list into one connect instruction: intersect
//! with verified outbound numbers, pick a caller ID, and dial with a fixed
//! per-leg timeout so the provider advances through the list on its own.
//! The completion callback resolves who answered and records the outcome;
//! it performs no further dialogue action.

use std::sync::Arc;

use serde_json::json;

use call_router_core::{Category, DIAL_TIMEOUT_SECS};
use call_router_persistence::{AgentStore, CallStore, EventLog};
use call_router_telephony::{
    select_caller_id, DialSpec, ProviderAccount, VerifiedNumbers, VoiceWebhookForm,
};

use crate::selector::AgentSelector;
use crate::CANDIDATE_LIMIT;

/// Completion callback webhook for every dial instruction.
pub const DIAL_COMPLETE_ACTION: &str = "/voice/dial-complete";

/// Result of planning a handoff.
#[derive(Debug, Clone)]
pub enum DialOutcome {
    /// Nothing left to dial after selection and filtering.
    NoAgent,
    Dial(DialSpec),
}

pub struct HandoffPlanner {
    selector: AgentSelector,
    verified: Arc<VerifiedNumbers>,
    events: Arc<dyn EventLog>,
    agents: Arc<dyn AgentStore>,
    calls: Arc<dyn CallStore>,
    provider: Arc<dyn ProviderAccount>,
    preferred_caller_id: Option<String>,
}

impl HandoffPlanner {
    pub fn new(
        selector: AgentSelector,
        verified: Arc<VerifiedNumbers>,
        events: Arc<dyn EventLog>,
        agents: Arc<dyn AgentStore>,
        calls: Arc<dyn CallStore>,
        provider: Arc<dyn ProviderAccount>,
        preferred_caller_id: Option<String>,
    ) -> Self {
        Self {
            selector,
            verified,
            events,
            agents,
            calls,
            provider,
            preferred_caller_id,
        }
    }

    /// Build the dial plan for a call, or decide no agent is reachable.
    pub async fn plan(
        &self,
        call_sid: &str,
        category: Option<Category>,
        currency: Option<&str>,
        incoming_number: Option<&str>,
    ) -> DialOutcome {
        let candidates = self
            .selector
            .candidates(category, currency, CANDIDATE_LIMIT)
            .await;

        self.events
            .audit(
                Some(call_sid),
                "ROUTING_CANDIDATES",
                json!({
                    "category": category.map(|c| c.as_str()),
                    "currency": currency,
                    "candidates": candidates,
                }),
            )
            .await;

        if candidates.is_empty() {
            self.record_decision(call_sid, "NO_AGENT", "").await;
            return DialOutcome::NoAgent;
        }

        let verified = self.verified.list().await;
        let candidates = if verified.is_empty() {
            candidates
        } else {
            let filtered: Vec<String> = candidates
                .iter()
                .filter(|c| verified.contains(c))
                .cloned()
                .collect();
            self.events
                .audit(
                    Some(call_sid),
                    "FILTERED_ROUTING_CANDIDATES",
                    json!({ "before": candidates, "after": filtered }),
                )
                .await;
            filtered
        };

        if candidates.is_empty() {
            self.record_decision(call_sid, "NO_VERIFIED_AGENT", "").await;
            return DialOutcome::NoAgent;
        }

        let caller_id = select_caller_id(
            &verified,
            &candidates,
            incoming_number,
            self.preferred_caller_id.as_deref(),
        );

        self.events
            .audit(
                Some(call_sid),
                "DIAL_ATTEMPT",
                json!({
                    "candidates": candidates,
                    "timeout": DIAL_TIMEOUT_SECS,
                    "caller_id": caller_id,
                }),
            )
            .await;
        self.record_decision(call_sid, "AGENT_CANDIDATES", &candidates.join(","))
            .await;

        DialOutcome::Dial(DialSpec::new(candidates, caller_id, DIAL_COMPLETE_ACTION))
    }

    /// Handle the provider's dial-completion callback.
    pub async fn complete(&self, form: &VoiceWebhookForm) {
        let call_sid = form.sid();

        let to_number = match &form.dial_call_sid {
            Some(dial_sid) => match self.provider.call_to_number(dial_sid).await {
                Ok(number) => number,
                Err(e) => {
                    self.events
                        .audit(
                            Some(call_sid),
                            "DIAL_CALL_FETCH_FAILED",
                            json!({ "dial_call_sid": dial_sid, "error": e.to_string() }),
                        )
                        .await;
                    None
                }
            },
            None => None,
        };

        let agent = match &to_number {
            Some(number) => match self.agents.find_by_phone(number).await {
                Ok(rows) => {
                    if rows.len() > 1 {
                        self.events
                            .audit(
                                Some(call_sid),
                                "AGENT_LOOKUP_MULTIPLE",
                                json!({ "phone_number": number, "count": rows.len() }),
                            )
                            .await;
                    }
                    rows.into_iter().next()
                }
                Err(e) => {
                    self.events
                        .audit(
                            Some(call_sid),
                            "AGENT_LOOKUP_ERROR",
                            json!({ "phone_number": number, "error": e.to_string() }),
                        )
                        .await;
                    None
                }
            },
            None => None,
        };

        if let Some(agent) = &agent {
            if let Err(e) = self
                .events
                .record_agent_assignment(call_sid, agent.id, agent.region.as_str())
                .await
            {
                tracing::warn!(call_sid, error = %e, "Failed to record agent assignment");
            }
        }

        let status = form.dial_call_status.as_deref().unwrap_or("unknown");
        let handler = if status == "completed" { "HUMAN" } else { "AI" };
        if let Err(e) = self.calls.mark_completed(call_sid, status, handler).await {
            tracing::warn!(call_sid, error = %e, "Failed to update call status");
        }

        self.events
            .audit(
                Some(call_sid),
                "DIAL_COMPLETED",
                json!({
                    "dial_call_sid": form.dial_call_sid,
                    "status": form.dial_call_status,
                    "duration": form.dial_call_duration,
                    "to": to_number,
                    "agent": agent.as_ref().map(|a| json!({
                        "agent_id": a.id,
                        "name": a.name,
                        "region": a.region.as_str(),
                        "phone_number": a.phone_number,
                    })),
                }),
            )
            .await;
    }

    async fn record_decision(&self, call_sid: &str, rule: &str, routed_to: &str) {
        if let Err(e) = self
            .events
            .record_routing_decision(Some(call_sid), None, rule, routed_to)
            .await
        {
            tracing::warn!(call_sid, error = %e, "Failed to record routing decision");
        }
    }
}
