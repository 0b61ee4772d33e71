//! Core domain types for the call router
//!
//! Shared vocabulary used across all other crates:
//! - Canonical jewelry categories, caller intents, assist types
//! - Routing regions and language derivation
//! - A TTL cache component with an injectable clock

pub mod cache;
pub mod types;

pub use cache::{Clock, SystemClock, TtlCache};
pub use types::{
    language_for_currency, AssistType, Category, Intent, Region, ALL_CATEGORIES, DIAL_TIMEOUT_SECS,
};
