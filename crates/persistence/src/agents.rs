//! Agent and specialization queries
//!
//! Raw ordered lookups used by the candidate selector. Agents are
//! operator-managed rows; nothing here ever falls back to
//! environment-configured pools.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;

use call_router_core::Region;

use crate::client::PgClient;
use crate::error::PersistenceError;

/// A routable human agent.
#[derive(Debug, Clone)]
pub struct AgentRow {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub region: Region,
    pub is_active: bool,
    pub is_default: bool,
}

/// Store for agent lookups. Every query is filtered to active agents and
/// ordered by specialization proficiency descending, then the is-default
/// flag descending.
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Specialists for exactly this category within the given regions.
    async fn specialists(
        &self,
        category: &str,
        regions: &[Region],
        limit: i64,
    ) -> Result<Vec<AgentRow>, PersistenceError>;

    /// Specialists in any category except the excluded one (all specialists
    /// when `exclude` is `None`).
    async fn specialists_excluding(
        &self,
        exclude: Option<&str>,
        regions: &[Region],
        limit: i64,
    ) -> Result<Vec<AgentRow>, PersistenceError>;

    /// Agents flagged default for the given regions.
    async fn regional_defaults(
        &self,
        regions: &[Region],
    ) -> Result<Vec<AgentRow>, PersistenceError>;

    /// All agents holding a phone number. More than one row is an operator
    /// data anomaly the caller has to tolerate.
    async fn find_by_phone(&self, phone: &str) -> Result<Vec<AgentRow>, PersistenceError>;
}

/// Postgres implementation of the agent store.
#[derive(Clone)]
pub struct PgAgentStore {
    client: PgClient,
}

impl PgAgentStore {
    pub fn new(client: PgClient) -> Self {
        Self { client }
    }
}

fn region_labels(regions: &[Region]) -> Vec<String> {
    regions.iter().map(|r| r.as_str().to_string()).collect()
}

fn row_to_agent(row: &PgRow) -> Result<AgentRow, PersistenceError> {
    let region: String = row.try_get("region")?;
    Ok(AgentRow {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        phone_number: row.try_get("phone_number")?,
        region: Region::parse(&region)
            .ok_or_else(|| PersistenceError::InvalidData(format!("unknown region '{region}'")))?,
        is_active: row.try_get("is_active")?,
        is_default: row.try_get("is_default")?,
    })
}

const AGENT_COLUMNS: &str = "a.id, a.name, a.phone_number, a.region, a.is_active, a.is_default";

#[async_trait]
impl AgentStore for PgAgentStore {
    async fn specialists(
        &self,
        category: &str,
        regions: &[Region],
        limit: i64,
    ) -> Result<Vec<AgentRow>, PersistenceError> {
        let query = format!(
            "SELECT {AGENT_COLUMNS} FROM agents a \
             JOIN agent_specializations s ON s.agent_id = a.id \
             WHERE s.category = $1 AND a.is_active AND a.region = ANY($2) \
             ORDER BY s.proficiency_level DESC, a.is_default DESC \
             LIMIT $3"
        );
        let rows = sqlx::query(&query)
            .bind(category)
            .bind(region_labels(regions))
            .bind(limit)
            .fetch_all(self.client.pool())
            .await?;
        rows.iter().map(row_to_agent).collect()
    }

    async fn specialists_excluding(
        &self,
        exclude: Option<&str>,
        regions: &[Region],
        limit: i64,
    ) -> Result<Vec<AgentRow>, PersistenceError> {
        let query = format!(
            "SELECT {AGENT_COLUMNS} FROM agents a \
             JOIN agent_specializations s ON s.agent_id = a.id \
             WHERE ($1::text IS NULL OR s.category <> $1) \
               AND a.is_active AND a.region = ANY($2) \
             ORDER BY s.proficiency_level DESC, a.is_default DESC \
             LIMIT $3"
        );
        let rows = sqlx::query(&query)
            .bind(exclude)
            .bind(region_labels(regions))
            .bind(limit)
            .fetch_all(self.client.pool())
            .await?;
        rows.iter().map(row_to_agent).collect()
    }

    async fn regional_defaults(
        &self,
        regions: &[Region],
    ) -> Result<Vec<AgentRow>, PersistenceError> {
        let query = format!(
            "SELECT {AGENT_COLUMNS} FROM agents a \
             WHERE a.is_active AND a.is_default AND a.region = ANY($1) \
             ORDER BY a.region"
        );
        let rows = sqlx::query(&query)
            .bind(region_labels(regions))
            .fetch_all(self.client.pool())
            .await?;
        rows.iter().map(row_to_agent).collect()
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Vec<AgentRow>, PersistenceError> {
        let query = format!(
            "SELECT {AGENT_COLUMNS} FROM agents a WHERE a.phone_number = $1 ORDER BY a.id"
        );
        let rows = sqlx::query(&query)
            .bind(phone)
            .fetch_all(self.client.pool())
            .await?;
        rows.iter().map(row_to_agent).collect()
    }
}
