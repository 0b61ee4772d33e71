//! Append-only audit trail
//!
//! Call events, routing decisions, and agent assignments. Rows are written
//! once, linked to a call when one exists, and never mutated. The dialogue
//! uses the event trail for observability and for the CRM sync-once check.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use crate::client::PgClient;
use crate::error::PersistenceError;

/// Append-only event log.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Persist a structured event, linking it to the call row when one
    /// exists for the sid.
    async fn record(
        &self,
        call_sid: Option<&str>,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<(), PersistenceError>;

    /// Whether any event of the given types exists for this call.
    async fn has_any(
        &self,
        call_sid: &str,
        event_types: &[&str],
    ) -> Result<bool, PersistenceError>;

    async fn record_routing_decision(
        &self,
        call_sid: Option<&str>,
        caller_country: Option<&str>,
        routing_rule: &str,
        routed_to: &str,
    ) -> Result<(), PersistenceError>;

    async fn record_agent_assignment(
        &self,
        call_sid: &str,
        agent_id: i64,
        agent_region: &str,
    ) -> Result<(), PersistenceError>;

    /// Record an event, logging instead of failing on persistence errors.
    /// Audit writes must never abort the in-flight webhook response.
    async fn audit(&self, call_sid: Option<&str>, event_type: &str, payload: serde_json::Value) {
        if let Err(e) = self.record(call_sid, event_type, payload).await {
            tracing::warn!(event_type, error = %e, "Failed to persist call event");
        }
    }
}

/// Postgres implementation of the event log.
#[derive(Clone)]
pub struct PgEventLog {
    client: PgClient,
}

impl PgEventLog {
    pub fn new(client: PgClient) -> Self {
        Self { client }
    }

    async fn call_id_for(&self, call_sid: Option<&str>) -> Result<Option<Uuid>, PersistenceError> {
        let Some(sid) = call_sid else {
            return Ok(None);
        };
        let row = sqlx::query("SELECT id FROM calls WHERE call_sid = $1")
            .bind(sid)
            .fetch_optional(self.client.pool())
            .await?;
        Ok(row.map(|r| r.get("id")))
    }
}

#[async_trait]
impl EventLog for PgEventLog {
    async fn record(
        &self,
        call_sid: Option<&str>,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<(), PersistenceError> {
        tracing::info!(
            call_sid = call_sid.unwrap_or("-"),
            event = event_type,
            payload = %payload,
            "call event"
        );

        let call_id = self.call_id_for(call_sid).await?;
        let mut payload = payload;
        if let Some(map) = payload.as_object_mut() {
            map.insert(
                "timestamp".to_string(),
                serde_json::Value::String(Utc::now().to_rfc3339()),
            );
        }

        sqlx::query(
            "INSERT INTO call_events (call_id, event_type, event_payload) VALUES ($1, $2, $3)",
        )
        .bind(call_id)
        .bind(event_type)
        .bind(payload)
        .execute(self.client.pool())
        .await?;

        Ok(())
    }

    async fn has_any(
        &self,
        call_sid: &str,
        event_types: &[&str],
    ) -> Result<bool, PersistenceError> {
        let types: Vec<String> = event_types.iter().map(|t| t.to_string()).collect();
        let row = sqlx::query(
            "SELECT 1 AS hit FROM call_events e \
             JOIN calls c ON c.id = e.call_id \
             WHERE c.call_sid = $1 AND e.event_type = ANY($2) \
             LIMIT 1",
        )
        .bind(call_sid)
        .bind(&types)
        .fetch_optional(self.client.pool())
        .await?;
        Ok(row.is_some())
    }

    async fn record_routing_decision(
        &self,
        call_sid: Option<&str>,
        caller_country: Option<&str>,
        routing_rule: &str,
        routed_to: &str,
    ) -> Result<(), PersistenceError> {
        let call_id = self.call_id_for(call_sid).await?;
        sqlx::query(
            "INSERT INTO routing_decisions (call_id, caller_country, routing_rule, routed_to) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(call_id)
        .bind(caller_country)
        .bind(routing_rule)
        .bind(routed_to)
        .execute(self.client.pool())
        .await?;
        Ok(())
    }

    async fn record_agent_assignment(
        &self,
        call_sid: &str,
        agent_id: i64,
        agent_region: &str,
    ) -> Result<(), PersistenceError> {
        let call_id = self.call_id_for(Some(call_sid)).await?;
        sqlx::query(
            "INSERT INTO agent_assignments \
                (call_id, agent_id, agent_region, agent_type, assigned_at) \
             VALUES ($1, $2, $3, 'HUMAN', now())",
        )
        .bind(call_id)
        .bind(agent_id.to_string())
        .bind(agent_region)
        .execute(self.client.pool())
        .await?;
        Ok(())
    }
}
