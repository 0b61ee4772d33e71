//! Postgres client and connection management

use sqlx::postgres::{PgPool, PgPoolOptions};

use call_router_config::DatabaseConfig;

use crate::error::PersistenceError;
use crate::schema;

/// Postgres pool wrapper shared by all stores.
#[derive(Clone)]
pub struct PgClient {
    pool: PgPool,
}

impl PgClient {
    /// Connect to the Postgres cluster.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, PersistenceError> {
        tracing::info!(max_connections = config.max_connections, "Connecting to Postgres");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by tests).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ensure all tables exist.
    pub async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        schema::create_tables(&self.pool).await?;
        tracing::info!("Schema ensured");
        Ok(())
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
