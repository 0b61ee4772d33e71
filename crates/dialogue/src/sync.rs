//! CRM lead sync, at most once per call
//!
//! Several dialogue paths reach connect; whichever arrives first creates
//! the CRM lead. The guard is the audit trail itself: a prior
//! CRM_LEAD_SYNCED or CRM_LEAD_CREATED event for the call means the work
//! is already done. The success event is written synchronously, before the
//! webhook response goes out, so a crash cannot produce a duplicate lead
//! on the next path.

use std::sync::Arc;

use serde_json::json;

use call_router_integrations::{CrmClient, NewCrmLead};
use call_router_persistence::{EventLog, LeadStore};

const SYNC_EVENTS: &[&str] = &["CRM_LEAD_CREATED", "CRM_LEAD_SYNCED"];

pub struct CrmSync {
    crm: Arc<dyn CrmClient>,
    events: Arc<dyn EventLog>,
    leads: Arc<dyn LeadStore>,
}

impl CrmSync {
    pub fn new(
        crm: Arc<dyn CrmClient>,
        events: Arc<dyn EventLog>,
        leads: Arc<dyn LeadStore>,
    ) -> Self {
        Self { crm, events, leads }
    }

    /// Create the CRM lead for this call unless one was already synced.
    pub async fn sync_once(
        &self,
        call_sid: &str,
        from_number: Option<&str>,
        override_description: Option<&str>,
    ) {
        match self.events.has_any(call_sid, SYNC_EVENTS).await {
            Ok(true) => {
                tracing::debug!(call_sid, "CRM lead already synced, skipping");
                return;
            }
            Ok(false) => {}
            Err(e) => {
                // If the check itself fails, attempt the sync anyway.
                tracing::warn!(call_sid, error = %e, "CRM dedup check failed");
            }
        }

        let lead = match self.leads.get(call_sid).await {
            Ok(lead) => lead,
            Err(e) => {
                tracing::warn!(call_sid, error = %e, "Lead lookup failed before CRM sync");
                None
            }
        };

        let new_lead = NewCrmLead {
            call_sid: call_sid.to_string(),
            caller_name: lead.as_ref().and_then(|l| l.caller_name.clone()),
            mobile_phone: from_number.map(|n| n.to_string()),
            intent: lead.as_ref().and_then(|l| l.intent),
            product_name: lead.as_ref().and_then(|l| l.product_id.clone()),
            category: lead.as_ref().and_then(|l| l.selected_category),
            description: override_description
                .map(|d| d.to_string())
                .or_else(|| lead.as_ref().and_then(|l| l.caller_description.clone())),
        };

        match self.crm.create_lead(&new_lead).await {
            Some(lead_id) => {
                // The dedup event must not be lost: write it synchronously
                // and surface a persistence failure loudly.
                if let Err(e) = self
                    .events
                    .record(
                        Some(call_sid),
                        "CRM_LEAD_SYNCED",
                        json!({ "lead_id": lead_id }),
                    )
                    .await
                {
                    tracing::error!(call_sid, error = %e, "CRM lead synced but event write failed");
                }
            }
            None => {
                self.events
                    .audit(
                        Some(call_sid),
                        "CRM_LEAD_NOT_CREATED",
                        json!({ "had_lead_row": lead.is_some() }),
                    )
                    .await;
            }
        }
    }
}
