//! Per-call lead state
//!
//! One mutable row per call sid holding everything the dialogue has
//! collected so far. Writes are upsert-by-call-sid: a webhook arriving
//! before the lead exists creates the row on demand, so request ordering
//! never matters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use call_router_core::{language_for_currency, AssistType, Category, Intent};

use crate::client::PgClient;
use crate::error::PersistenceError;

/// Per-call collected context.
#[derive(Debug, Clone)]
pub struct CallLead {
    pub id: Uuid,
    pub call_id: Option<Uuid>,
    pub call_sid: String,
    pub page_context: String,
    pub selected_category: Option<Category>,
    pub currency: Option<String>,
    pub preferred_language: Option<String>,
    pub user_type: Option<String>,
    pub customer_id: Option<String>,
    /// Caller-provided product name (the column name predates the switch
    /// from catalogue ids to spoken names).
    pub product_id: Option<String>,
    pub intent: Option<Intent>,
    pub assist_type: Option<AssistType>,
    pub caller_name: Option<String>,
    pub caller_description: Option<String>,
    pub extra_metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Website-provided context registered before or during a call.
#[derive(Debug, Clone, Default)]
pub struct LeadContext {
    pub call_sid: String,
    pub page_context: Option<String>,
    pub currency: Option<String>,
    pub user_type: Option<String>,
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
    pub product_category: Option<Category>,
    pub preferred_language: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Store for per-call leads. All operations are idempotent upserts keyed by
/// call sid.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn upsert_context(&self, ctx: &LeadContext) -> Result<CallLead, PersistenceError>;

    async fn get(&self, call_sid: &str) -> Result<Option<CallLead>, PersistenceError>;

    /// Attach the call row once call metadata is available. A lead that is
    /// already linked keeps its link.
    async fn link_call(&self, call_sid: &str, call_id: Uuid) -> Result<(), PersistenceError>;

    async fn set_intent(&self, call_sid: &str, intent: Intent) -> Result<(), PersistenceError>;

    async fn set_assist_type(
        &self,
        call_sid: &str,
        assist_type: AssistType,
    ) -> Result<(), PersistenceError>;

    async fn set_caller_name(&self, call_sid: &str, name: &str) -> Result<(), PersistenceError>;

    async fn set_product_name(&self, call_sid: &str, name: &str) -> Result<(), PersistenceError>;

    async fn set_description(&self, call_sid: &str, text: &str) -> Result<(), PersistenceError>;

    async fn set_category(
        &self,
        call_sid: &str,
        category: Category,
    ) -> Result<(), PersistenceError>;
}

/// Postgres implementation of the lead store.
#[derive(Clone)]
pub struct PgLeadStore {
    client: PgClient,
}

impl PgLeadStore {
    pub fn new(client: PgClient) -> Self {
        Self { client }
    }

    /// Create an empty lead row unless one already exists.
    async fn ensure_row(&self, call_sid: &str) -> Result<(), PersistenceError> {
        sqlx::query(
            "INSERT INTO call_leads (call_sid) VALUES ($1) \
             ON CONFLICT (call_sid) DO NOTHING",
        )
        .bind(call_sid)
        .execute(self.client.pool())
        .await?;
        Ok(())
    }

    async fn set_field(
        &self,
        call_sid: &str,
        column: &str,
        value: &str,
    ) -> Result<(), PersistenceError> {
        self.ensure_row(call_sid).await?;
        // Column names come from a fixed internal set, never from input.
        let query = format!(
            "UPDATE call_leads SET {column} = $2, updated_at = now() WHERE call_sid = $1"
        );
        sqlx::query(&query)
            .bind(call_sid)
            .bind(value)
            .execute(self.client.pool())
            .await?;
        Ok(())
    }
}

fn row_to_lead(row: &PgRow) -> Result<CallLead, PersistenceError> {
    let category: Option<String> = row.try_get("selected_category")?;
    let intent: Option<String> = row.try_get("intent")?;
    let assist_type: Option<String> = row.try_get("assist_type")?;

    Ok(CallLead {
        id: row.try_get("id")?,
        call_id: row.try_get("call_id")?,
        call_sid: row.try_get("call_sid")?,
        page_context: row.try_get("page_context")?,
        selected_category: category.as_deref().and_then(Category::parse),
        currency: row.try_get("currency")?,
        preferred_language: row.try_get("preferred_language")?,
        user_type: row.try_get("user_type")?,
        customer_id: row.try_get("customer_id")?,
        product_id: row.try_get("product_id")?,
        intent: intent.as_deref().and_then(Intent::parse),
        assist_type: assist_type.as_deref().and_then(AssistType::parse),
        caller_name: row.try_get("caller_name")?,
        caller_description: row.try_get("caller_description")?,
        extra_metadata: row.try_get("extra_metadata")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

const LEAD_COLUMNS: &str = "id, call_id, call_sid, page_context, selected_category, currency, \
     preferred_language, user_type, customer_id, product_id, intent, assist_type, \
     caller_name, caller_description, extra_metadata, created_at, updated_at";

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn upsert_context(&self, ctx: &LeadContext) -> Result<CallLead, PersistenceError> {
        self.ensure_row(&ctx.call_sid).await?;

        let existing = self.get(&ctx.call_sid).await?.ok_or_else(|| {
            PersistenceError::InvalidData(format!("lead row vanished for {}", ctx.call_sid))
        })?;

        let page_context = ctx
            .page_context
            .clone()
            .unwrap_or(existing.page_context.clone());
        let currency = ctx
            .currency
            .as_deref()
            .map(|c| c.to_uppercase())
            .or(existing.currency.clone());
        let user_type = ctx.user_type.clone().or(existing.user_type.clone());
        let customer_id = ctx.customer_id.clone().or(existing.customer_id.clone());
        let product_id = ctx.product_id.clone().or(existing.product_id.clone());
        let metadata = ctx.metadata.clone().or(existing.extra_metadata.clone());
        let category = ctx.product_category.or(existing.selected_category);

        // Preferred language: explicit wins, then currency mapping, then the
        // default locale.
        let preferred_language = ctx
            .preferred_language
            .clone()
            .or_else(|| {
                currency
                    .as_deref()
                    .map(|c| language_for_currency(Some(c)).to_string())
            })
            .or(existing.preferred_language.clone())
            .unwrap_or_else(|| language_for_currency(None).to_string());

        let query = format!(
            "UPDATE call_leads SET \
                page_context = $2, currency = $3, user_type = $4, customer_id = $5, \
                product_id = $6, extra_metadata = $7, selected_category = $8, \
                preferred_language = $9, updated_at = now() \
             WHERE call_sid = $1 \
             RETURNING {LEAD_COLUMNS}"
        );

        let row = sqlx::query(&query)
            .bind(&ctx.call_sid)
            .bind(&page_context)
            .bind(&currency)
            .bind(&user_type)
            .bind(&customer_id)
            .bind(&product_id)
            .bind(&metadata)
            .bind(category.map(|c| c.as_str()))
            .bind(&preferred_language)
            .fetch_one(self.client.pool())
            .await?;

        row_to_lead(&row)
    }

    async fn get(&self, call_sid: &str) -> Result<Option<CallLead>, PersistenceError> {
        let query = format!("SELECT {LEAD_COLUMNS} FROM call_leads WHERE call_sid = $1");
        let row = sqlx::query(&query)
            .bind(call_sid)
            .fetch_optional(self.client.pool())
            .await?;
        row.as_ref().map(row_to_lead).transpose()
    }

    async fn link_call(&self, call_sid: &str, call_id: Uuid) -> Result<(), PersistenceError> {
        self.ensure_row(call_sid).await?;
        sqlx::query(
            "UPDATE call_leads SET call_id = $2, updated_at = now() \
             WHERE call_sid = $1 AND call_id IS NULL",
        )
        .bind(call_sid)
        .bind(call_id)
        .execute(self.client.pool())
        .await?;
        Ok(())
    }

    async fn set_intent(&self, call_sid: &str, intent: Intent) -> Result<(), PersistenceError> {
        self.set_field(call_sid, "intent", intent.as_str()).await
    }

    async fn set_assist_type(
        &self,
        call_sid: &str,
        assist_type: AssistType,
    ) -> Result<(), PersistenceError> {
        self.set_field(call_sid, "assist_type", assist_type.as_str())
            .await
    }

    async fn set_caller_name(&self, call_sid: &str, name: &str) -> Result<(), PersistenceError> {
        self.set_field(call_sid, "caller_name", name).await
    }

    async fn set_product_name(&self, call_sid: &str, name: &str) -> Result<(), PersistenceError> {
        self.set_field(call_sid, "product_id", name).await
    }

    async fn set_description(&self, call_sid: &str, text: &str) -> Result<(), PersistenceError> {
        self.set_field(call_sid, "caller_description", text).await
    }

    async fn set_category(
        &self,
        call_sid: &str,
        category: Category,
    ) -> Result<(), PersistenceError> {
        self.ensure_row(call_sid).await?;
        // Selecting a category also settles the preferred language when the
        // lead already carries a currency but no explicit language.
        let lead = self.get(call_sid).await?;
        let derived_language = lead.as_ref().and_then(|l| {
            if l.preferred_language.is_none() {
                l.currency
                    .as_deref()
                    .map(|c| language_for_currency(Some(c)).to_string())
            } else {
                None
            }
        });

        sqlx::query(
            "UPDATE call_leads SET selected_category = $2, \
                preferred_language = COALESCE($3, preferred_language), \
                updated_at = now() \
             WHERE call_sid = $1",
        )
        .bind(call_sid)
        .bind(category.as_str())
        .bind(derived_language)
        .execute(self.client.pool())
        .await?;
        Ok(())
    }
}
