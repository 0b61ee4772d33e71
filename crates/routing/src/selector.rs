//! Agent candidate selection
//!
//! Produces an ordered, de-duplicated dial list for a category and
//! currency. Strict priority: specialists for the category, then
//! specialists in any other category (so a call is never dropped for lack
//! of a narrow specialist), then region defaults. Only operator-configured
//! agents are considered; there is no environment fallback pool.

use std::sync::Arc;

use serde_json::json;

use call_router_core::{Category, Region};
use call_router_persistence::{AgentRow, AgentStore, EventLog};

pub struct AgentSelector {
    agents: Arc<dyn AgentStore>,
    events: Arc<dyn EventLog>,
}

impl AgentSelector {
    pub fn new(agents: Arc<dyn AgentStore>, events: Arc<dyn EventLog>) -> Self {
        Self { agents, events }
    }

    /// Ordered phone numbers to try, at most `limit`, no duplicates.
    pub async fn candidates(
        &self,
        category: Option<Category>,
        currency: Option<&str>,
        limit: usize,
    ) -> Vec<String> {
        let region = Region::from_currency(currency);
        let regions = [region, Region::Global];
        let mut numbers: Vec<String> = Vec::new();

        // Specialists for the requested category.
        if let Some(category) = category {
            let rows = self
                .query(
                    self.agents
                        .specialists(category.as_str(), &regions, limit as i64)
                        .await,
                )
                .await;
            push_unique(&mut numbers, rows, limit);
            if numbers.len() >= limit {
                return numbers;
            }
        }

        // Breadth fallback: specialists in any other category.
        let rows = self
            .query(
                self.agents
                    .specialists_excluding(
                        category.map(|c| c.as_str()),
                        &regions,
                        limit as i64,
                    )
                    .await,
            )
            .await;
        push_unique(&mut numbers, rows, limit);
        if numbers.len() >= limit {
            return numbers;
        }

        // Default agents for the region.
        let rows = self.query(self.agents.regional_defaults(&regions).await).await;
        push_unique(&mut numbers, rows, limit);

        if numbers.is_empty() {
            self.events
                .audit(
                    None,
                    "NO_AGENT_CONFIGURED",
                    json!({
                        "category": category.map(|c| c.as_str()),
                        "region": region.as_str(),
                    }),
                )
                .await;
        }

        numbers
    }

    /// Unwrap a store result, auditing and degrading to an empty page on a
    /// database error.
    async fn query(
        &self,
        result: Result<Vec<AgentRow>, call_router_persistence::PersistenceError>,
    ) -> Vec<AgentRow> {
        match result {
            Ok(rows) => rows,
            Err(e) => {
                self.events
                    .audit(None, "AGENT_DB_ERROR", json!({ "error": e.to_string() }))
                    .await;
                Vec::new()
            }
        }
    }
}

fn push_unique(numbers: &mut Vec<String>, rows: Vec<AgentRow>, limit: usize) {
    for agent in rows {
        if numbers.len() >= limit {
            return;
        }
        if !numbers.contains(&agent.phone_number) {
            numbers.push(agent.phone_number);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use call_router_persistence::PersistenceError;
    use parking_lot::Mutex;

    fn agent(id: i64, phone: &str, region: Region, is_default: bool) -> AgentRow {
        AgentRow {
            id,
            name: format!("agent-{id}"),
            phone_number: phone.to_string(),
            region,
            is_active: true,
            is_default,
        }
    }

    /// In-memory store mirroring the Pg queries' filtering and ordering.
    #[derive(Default)]
    struct FakeAgentStore {
        // (agent, category, proficiency)
        specialists: Vec<(AgentRow, String, i64)>,
        defaults: Vec<AgentRow>,
    }

    impl FakeAgentStore {
        fn ordered(&self, rows: Vec<(AgentRow, i64)>) -> Vec<AgentRow> {
            let mut rows = rows;
            rows.sort_by(|a, b| {
                b.1.cmp(&a.1)
                    .then(b.0.is_default.cmp(&a.0.is_default))
            });
            rows.into_iter().map(|(a, _)| a).collect()
        }
    }

    #[async_trait]
    impl AgentStore for FakeAgentStore {
        async fn specialists(
            &self,
            category: &str,
            regions: &[Region],
            limit: i64,
        ) -> Result<Vec<AgentRow>, PersistenceError> {
            let rows = self
                .specialists
                .iter()
                .filter(|(a, c, _)| c == category && regions.contains(&a.region))
                .map(|(a, _, p)| (a.clone(), *p))
                .collect();
            Ok(self.ordered(rows).into_iter().take(limit as usize).collect())
        }

        async fn specialists_excluding(
            &self,
            exclude: Option<&str>,
            regions: &[Region],
            limit: i64,
        ) -> Result<Vec<AgentRow>, PersistenceError> {
            let rows = self
                .specialists
                .iter()
                .filter(|(a, c, _)| exclude != Some(c.as_str()) && regions.contains(&a.region))
                .map(|(a, _, p)| (a.clone(), *p))
                .collect();
            Ok(self.ordered(rows).into_iter().take(limit as usize).collect())
        }

        async fn regional_defaults(
            &self,
            regions: &[Region],
        ) -> Result<Vec<AgentRow>, PersistenceError> {
            Ok(self
                .defaults
                .iter()
                .filter(|a| regions.contains(&a.region))
                .cloned()
                .collect())
        }

        async fn find_by_phone(&self, _phone: &str) -> Result<Vec<AgentRow>, PersistenceError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct RecordingEventLog {
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EventLog for RecordingEventLog {
        async fn record(
            &self,
            _call_sid: Option<&str>,
            event_type: &str,
            _payload: serde_json::Value,
        ) -> Result<(), PersistenceError> {
            self.events.lock().push(event_type.to_string());
            Ok(())
        }

        async fn has_any(
            &self,
            _call_sid: &str,
            _event_types: &[&str],
        ) -> Result<bool, PersistenceError> {
            Ok(false)
        }

        async fn record_routing_decision(
            &self,
            _call_sid: Option<&str>,
            _caller_country: Option<&str>,
            _routing_rule: &str,
            _routed_to: &str,
        ) -> Result<(), PersistenceError> {
            Ok(())
        }

        async fn record_agent_assignment(
            &self,
            _call_sid: &str,
            _agent_id: i64,
            _agent_region: &str,
        ) -> Result<(), PersistenceError> {
            Ok(())
        }
    }

    fn selector(store: FakeAgentStore) -> (AgentSelector, Arc<RecordingEventLog>) {
        let events = Arc::new(RecordingEventLog::default());
        (
            AgentSelector::new(Arc::new(store), events.clone()),
            events,
        )
    }

    #[tokio::test]
    async fn test_specialists_ranked_by_proficiency() {
        let store = FakeAgentStore {
            specialists: vec![
                (agent(1, "+911111111111", Region::In, false), "necklace".into(), 1),
                (agent(2, "+912222222222", Region::In, false), "necklace".into(), 3),
                (agent(3, "+913333333333", Region::Global, false), "necklace".into(), 2),
            ],
            defaults: vec![],
        };
        let (selector, _) = selector(store);

        let numbers = selector
            .candidates(Some(Category::Necklace), Some("INR"), 5)
            .await;
        assert_eq!(
            numbers,
            vec!["+912222222222", "+913333333333", "+911111111111"]
        );
    }

    #[tokio::test]
    async fn test_breadth_fallback_to_other_categories() {
        let store = FakeAgentStore {
            specialists: vec![
                (agent(1, "+911111111111", Region::In, false), "earrings".into(), 2),
            ],
            defaults: vec![agent(2, "+912222222222", Region::In, true)],
        };
        let (selector, _) = selector(store);

        let numbers = selector
            .candidates(Some(Category::Necklace), Some("INR"), 5)
            .await;
        // No necklace specialist: earrings specialist first, then default.
        assert_eq!(numbers, vec!["+911111111111", "+912222222222"]);
    }

    #[tokio::test]
    async fn test_no_duplicates_and_limit_respected() {
        let shared = agent(1, "+911111111111", Region::In, true);
        let store = FakeAgentStore {
            specialists: vec![
                (shared.clone(), "necklace".into(), 3),
                (shared.clone(), "earrings".into(), 2),
                (agent(2, "+912222222222", Region::In, false), "rings".into(), 1),
                (agent(3, "+913333333333", Region::In, false), "bangles".into(), 1),
            ],
            defaults: vec![shared.clone()],
        };
        let (selector, _) = selector(store);

        let numbers = selector
            .candidates(Some(Category::Necklace), Some("INR"), 2)
            .await;
        assert_eq!(numbers.len(), 2);
        assert_eq!(numbers[0], "+911111111111");
        let mut deduped = numbers.clone();
        deduped.dedup();
        assert_eq!(deduped, numbers);
    }

    #[tokio::test]
    async fn test_region_derived_from_currency() {
        let store = FakeAgentStore {
            specialists: vec![
                (agent(1, "+911111111111", Region::In, false), "rings".into(), 1),
                (agent(2, "+14155550100", Region::Us, false), "rings".into(), 1),
            ],
            defaults: vec![],
        };
        let (selector, _) = selector(store);

        let numbers = selector.candidates(Some(Category::Rings), Some("USD"), 5).await;
        assert_eq!(numbers, vec!["+14155550100"]);
    }

    #[tokio::test]
    async fn test_empty_result_is_logged_not_an_error() {
        let (selector, events) = selector(FakeAgentStore::default());
        let numbers = selector.candidates(None, None, 5).await;
        assert!(numbers.is_empty());
        assert!(events
            .events
            .lock()
            .contains(&"NO_AGENT_CONFIGURED".to_string()));
    }
}
