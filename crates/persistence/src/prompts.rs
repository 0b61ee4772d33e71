//! Prompt, greeting, and correction catalog
//!
//! Operator overrides live in voice_prompts / voice_greetings /
//! misheard_corrections; anything unconfigured falls back to the built-in
//! defaults. The whole set is loaded in one pass behind a TTL cache so a
//! webhook never pays more than one refresh, and admin mutations call
//! [`PromptCatalog::force_refresh`] to publish immediately.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::Row;

use call_router_config::defaults;
use call_router_core::cache::{Clock, TtlCache};

use crate::client::PgClient;
use crate::error::PersistenceError;

/// One coherent load of all operator-editable copy.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    pub greetings: HashMap<String, String>,
    pub prompts: HashMap<String, String>,
    pub corrections: Vec<(String, String)>,
}

/// Source of operator overrides.
#[async_trait]
pub trait ConfigRepo: Send + Sync {
    async fn load(&self) -> Result<ConfigSnapshot, PersistenceError>;
}

/// Postgres-backed override source.
#[derive(Clone)]
pub struct PgConfigRepo {
    client: PgClient,
}

impl PgConfigRepo {
    pub fn new(client: PgClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ConfigRepo for PgConfigRepo {
    async fn load(&self) -> Result<ConfigSnapshot, PersistenceError> {
        let mut snapshot = ConfigSnapshot::default();

        let rows = sqlx::query("SELECT language, message FROM voice_greetings")
            .fetch_all(self.client.pool())
            .await?;
        for row in rows {
            snapshot
                .greetings
                .insert(row.try_get("language")?, row.try_get("message")?);
        }

        let rows = sqlx::query("SELECT key, message FROM voice_prompts")
            .fetch_all(self.client.pool())
            .await?;
        for row in rows {
            snapshot
                .prompts
                .insert(row.try_get("key")?, row.try_get("message")?);
        }

        let rows = sqlx::query(
            "SELECT wrong_word, correct_word FROM misheard_corrections WHERE is_active",
        )
        .fetch_all(self.client.pool())
        .await?;
        for row in rows {
            let wrong: String = row.try_get("wrong_word")?;
            let correct: String = row.try_get("correct_word")?;
            snapshot
                .corrections
                .push((wrong.to_lowercase(), correct.to_lowercase()));
        }

        Ok(snapshot)
    }
}

/// Cached catalog of greetings, prompts, and corrections with built-in
/// defaults behind every key.
pub struct PromptCatalog {
    repo: Arc<dyn ConfigRepo>,
    cache: TtlCache<ConfigSnapshot>,
}

impl PromptCatalog {
    pub fn new(repo: Arc<dyn ConfigRepo>, ttl: Duration) -> Self {
        Self {
            repo,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn with_clock(repo: Arc<dyn ConfigRepo>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            cache: TtlCache::with_clock(ttl, clock),
        }
    }

    /// Current override snapshot, refreshed at most once per TTL window.
    /// A failed refresh degrades to the built-in defaults instead of
    /// propagating an error into the dialogue.
    pub async fn snapshot(&self) -> ConfigSnapshot {
        if let Some(snapshot) = self.cache.get() {
            return snapshot;
        }

        match self.repo.load().await {
            Ok(snapshot) => {
                self.cache.put(snapshot.clone());
                tracing::debug!(
                    greetings = snapshot.greetings.len(),
                    prompts = snapshot.prompts.len(),
                    corrections = snapshot.corrections.len(),
                    "Config cache refreshed"
                );
                snapshot
            }
            Err(e) => {
                tracing::warn!(error = %e, "Config refresh failed, using built-in defaults");
                ConfigSnapshot::default()
            }
        }
    }

    /// Greeting text for a language, falling back to defaults.
    pub async fn greeting(&self, language: &str) -> String {
        let snapshot = self.snapshot().await;
        snapshot
            .greetings
            .get(language)
            .cloned()
            .unwrap_or_else(|| defaults::default_greeting(language).to_string())
    }

    /// Prompt text for a key, falling back to defaults.
    pub async fn prompt(&self, key: &str) -> String {
        let snapshot = self.snapshot().await;
        snapshot
            .prompts
            .get(key)
            .cloned()
            .or_else(|| defaults::default_prompt(key).map(|t| t.to_string()))
            .unwrap_or_default()
    }

    /// Misheard-word corrections: operator rows when any exist, otherwise
    /// the built-in table.
    pub async fn corrections(&self) -> Vec<(String, String)> {
        let snapshot = self.snapshot().await;
        if snapshot.corrections.is_empty() {
            return defaults::DEFAULT_CORRECTIONS
                .iter()
                .map(|(w, c)| (w.to_string(), c.to_string()))
                .collect();
        }
        snapshot.corrections
    }

    /// Synchronous refresh after an admin mutation.
    pub async fn force_refresh(&self) -> Result<(), PersistenceError> {
        let snapshot = self.repo.load().await?;
        self.cache.put(snapshot);
        Ok(())
    }
}
