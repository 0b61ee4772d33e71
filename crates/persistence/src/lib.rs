//! Postgres persistence layer for the call router
//!
//! Provides persistent storage for:
//! - Calls and their append-only event trail
//! - Per-call leads (the dialogue's collected context)
//! - Agents, specializations, routing decisions, assignments
//! - Operator-editable prompt/greeting/correction overrides
//!
//! Every store is a trait with a Pg implementation so the routing and
//! dialogue crates can be tested against in-memory fakes.

pub mod agents;
pub mod calls;
pub mod client;
pub mod error;
pub mod events;
pub mod leads;
pub mod prompts;
pub mod schema;

pub use agents::{AgentRow, AgentStore, PgAgentStore};
pub use calls::{CallRecord, CallStore, InboundCallInfo, PgCallStore};
pub use client::PgClient;
pub use error::PersistenceError;
pub use events::{EventLog, PgEventLog};
pub use leads::{CallLead, LeadContext, LeadStore, PgLeadStore};
pub use prompts::{ConfigRepo, ConfigSnapshot, PgConfigRepo, PromptCatalog};

use std::sync::Arc;
use std::time::Duration;

use call_router_config::DatabaseConfig;

/// Combined persistence layer with all stores.
pub struct PersistenceLayer {
    pub calls: Arc<PgCallStore>,
    pub leads: Arc<PgLeadStore>,
    pub events: Arc<PgEventLog>,
    pub agents: Arc<PgAgentStore>,
    pub catalog: Arc<PromptCatalog>,
}

/// Connect to Postgres, ensure the schema, and build all stores.
pub async fn init(
    config: &DatabaseConfig,
    config_cache_ttl: Duration,
) -> Result<PersistenceLayer, PersistenceError> {
    let client = PgClient::connect(config).await?;
    client.ensure_schema().await?;

    let repo: Arc<dyn ConfigRepo> = Arc::new(PgConfigRepo::new(client.clone()));

    Ok(PersistenceLayer {
        calls: Arc::new(PgCallStore::new(client.clone())),
        leads: Arc::new(PgLeadStore::new(client.clone())),
        events: Arc::new(PgEventLog::new(client.clone())),
        agents: Arc::new(PgAgentStore::new(client)),
        catalog: Arc::new(PromptCatalog::new(repo, config_cache_ttl)),
    })
}
