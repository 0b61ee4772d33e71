//! Call records
//!
//! One row per provider call sid, created on the first webhook and updated
//! as the call progresses. Rows are never deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::client::PgClient;
use crate::error::PersistenceError;

/// Persisted call record.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub id: Uuid,
    pub call_sid: String,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub caller_country: Option<String>,
    pub caller_state: Option<String>,
    pub caller_city: Option<String>,
    pub call_start: DateTime<Utc>,
    pub call_end: Option<DateTime<Utc>>,
    pub final_handler: Option<String>,
    pub call_status: Option<String>,
}

/// Call metadata carried by an inbound webhook.
#[derive(Debug, Clone, Default)]
pub struct InboundCallInfo {
    pub call_sid: String,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub caller_country: Option<String>,
    pub caller_state: Option<String>,
    pub caller_city: Option<String>,
    pub call_status: Option<String>,
}

/// Store for call records.
#[async_trait]
pub trait CallStore: Send + Sync {
    /// Create the call row on first contact; later webhooks return the
    /// existing row unchanged.
    async fn ensure_call(&self, info: &InboundCallInfo) -> Result<CallRecord, PersistenceError>;

    async fn find_by_sid(&self, call_sid: &str) -> Result<Option<CallRecord>, PersistenceError>;

    /// Record the final status and handler once the dial leg has finished.
    async fn mark_completed(
        &self,
        call_sid: &str,
        status: &str,
        handler: &str,
    ) -> Result<(), PersistenceError>;
}

/// Postgres implementation of the call store.
#[derive(Clone)]
pub struct PgCallStore {
    client: PgClient,
}

impl PgCallStore {
    pub fn new(client: PgClient) -> Self {
        Self { client }
    }
}

fn row_to_call(row: &PgRow) -> Result<CallRecord, PersistenceError> {
    Ok(CallRecord {
        id: row.try_get("id")?,
        call_sid: row.try_get("call_sid")?,
        from_number: row.try_get("from_number")?,
        to_number: row.try_get("to_number")?,
        caller_country: row.try_get("caller_country")?,
        caller_state: row.try_get("caller_state")?,
        caller_city: row.try_get("caller_city")?,
        call_start: row.try_get("call_start")?,
        call_end: row.try_get("call_end")?,
        final_handler: row.try_get("final_handler")?,
        call_status: row.try_get("call_status")?,
    })
}

const CALL_COLUMNS: &str = "id, call_sid, from_number, to_number, caller_country, \
     caller_state, caller_city, call_start, call_end, final_handler, call_status";

#[async_trait]
impl CallStore for PgCallStore {
    async fn ensure_call(&self, info: &InboundCallInfo) -> Result<CallRecord, PersistenceError> {
        // ON CONFLICT DO NOTHING keeps the first webhook's snapshot; late or
        // duplicate webhooks must not rewrite call metadata.
        let query = format!(
            "INSERT INTO calls (call_sid, from_number, to_number, caller_country, \
                                caller_state, caller_city, call_status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (call_sid) DO NOTHING \
             RETURNING {CALL_COLUMNS}"
        );

        let inserted = sqlx::query(&query)
            .bind(&info.call_sid)
            .bind(&info.from_number)
            .bind(&info.to_number)
            .bind(&info.caller_country)
            .bind(&info.caller_state)
            .bind(&info.caller_city)
            .bind(&info.call_status)
            .fetch_optional(self.client.pool())
            .await?;

        if let Some(row) = inserted {
            tracing::debug!(call_sid = %info.call_sid, "Call record created");
            return row_to_call(&row);
        }

        // Conflict path: the row already existed.
        self.find_by_sid(&info.call_sid).await?.ok_or_else(|| {
            PersistenceError::InvalidData(format!("call row vanished for {}", info.call_sid))
        })
    }

    async fn find_by_sid(&self, call_sid: &str) -> Result<Option<CallRecord>, PersistenceError> {
        let query = format!("SELECT {CALL_COLUMNS} FROM calls WHERE call_sid = $1");
        let row = sqlx::query(&query)
            .bind(call_sid)
            .fetch_optional(self.client.pool())
            .await?;
        row.as_ref().map(row_to_call).transpose()
    }

    async fn mark_completed(
        &self,
        call_sid: &str,
        status: &str,
        handler: &str,
    ) -> Result<(), PersistenceError> {
        sqlx::query(
            "UPDATE calls SET call_end = now(), call_status = $2, final_handler = $3 \
             WHERE call_sid = $1",
        )
        .bind(call_sid)
        .bind(status)
        .bind(handler)
        .execute(self.client.pool())
        .await?;

        tracing::debug!(call_sid = %call_sid, status, "Call marked completed");
        Ok(())
    }
}
