//! Agent routing
//!
//! Ranks eligible human agents into an ordered dial list and turns it into
//! a single connect instruction: verified-number filtering, caller-ID
//! selection, per-leg timeout, and the completion callback that records
//! who actually answered.

pub mod handoff;
pub mod selector;

pub use handoff::{DialOutcome, HandoffPlanner, DIAL_COMPLETE_ACTION};
pub use selector::AgentSelector;

/// Maximum candidates attempted for one handoff.
pub const CANDIDATE_LIMIT: usize = 5;
