//! IVR dialogue state machine
//!
//! Sequences the speech-driven menu: greeting, intent, name, assist type,
//! product or category collection, description, and finally the connect to
//! a human agent. Each inbound webhook re-reads the persisted lead state,
//! applies one transition, and emits one voice markup document - no
//! dialogue state lives in memory between requests.

pub mod machine;
pub mod step;
pub mod sync;

pub use machine::DialogueMachine;
pub use step::{actions, CategoryNext, DialogueStep, ProductPath};
pub use sync::CrmSync;
