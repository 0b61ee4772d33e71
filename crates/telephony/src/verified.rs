//! Verified outbound number source
//!
//! The operator allow-list wins when configured; otherwise the provider
//! account is the source of truth, fetched behind a short-lived cache so
//! dial planning never waits on the provider twice in a row. A provider
//! failure degrades to an empty list, never an error.

use std::sync::Arc;
use std::time::Duration;

use call_router_core::cache::{Clock, TtlCache};

use crate::rest::ProviderAccount;

pub struct VerifiedNumbers {
    configured: Vec<String>,
    provider: Arc<dyn ProviderAccount>,
    cache: TtlCache<Vec<String>>,
}

impl VerifiedNumbers {
    pub fn new(configured: Vec<String>, provider: Arc<dyn ProviderAccount>, ttl: Duration) -> Self {
        Self {
            configured,
            provider,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn with_clock(
        configured: Vec<String>,
        provider: Arc<dyn ProviderAccount>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            configured,
            provider,
            cache: TtlCache::with_clock(ttl, clock),
        }
    }

    /// Current verified numbers.
    pub async fn list(&self) -> Vec<String> {
        if !self.configured.is_empty() {
            return self.configured.clone();
        }

        if let Some(numbers) = self.cache.get() {
            return numbers;
        }

        match self.provider.verified_numbers().await {
            Ok(numbers) => {
                tracing::info!(count = numbers.len(), "Verified numbers refreshed");
                self.cache.put(numbers.clone());
                numbers
            }
            Err(e) => {
                tracing::warn!(error = %e, "Verified number fetch failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TelephonyError;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct CountingProvider {
        numbers: Vec<String>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl ProviderAccount for CountingProvider {
        async fn verified_numbers(&self) -> Result<Vec<String>, TelephonyError> {
            *self.calls.lock() += 1;
            Ok(self.numbers.clone())
        }

        async fn call_to_number(&self, _call_sid: &str) -> Result<Option<String>, TelephonyError> {
            Ok(None)
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl ProviderAccount for FailingProvider {
        async fn verified_numbers(&self) -> Result<Vec<String>, TelephonyError> {
            Err(TelephonyError::NotConfigured)
        }

        async fn call_to_number(&self, _call_sid: &str) -> Result<Option<String>, TelephonyError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_configured_list_wins() {
        let provider = Arc::new(CountingProvider {
            numbers: vec!["+19998887777".to_string()],
            calls: Mutex::new(0),
        });
        let verified = VerifiedNumbers::new(
            vec!["+14155550100".to_string()],
            provider.clone(),
            Duration::from_secs(300),
        );

        assert_eq!(verified.list().await, vec!["+14155550100".to_string()]);
        assert_eq!(*provider.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_provider_fetch_is_cached() {
        let provider = Arc::new(CountingProvider {
            numbers: vec!["+14155550100".to_string()],
            calls: Mutex::new(0),
        });
        let verified = VerifiedNumbers::new(Vec::new(), provider.clone(), Duration::from_secs(300));

        verified.list().await;
        verified.list().await;
        assert_eq!(*provider.calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_empty() {
        let verified =
            VerifiedNumbers::new(Vec::new(), Arc::new(FailingProvider), Duration::from_secs(300));
        assert!(verified.list().await.is_empty());
    }
}
