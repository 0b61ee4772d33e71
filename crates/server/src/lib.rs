//! Call Router Server
//!
//! HTTP surface for the voice IVR: provider webhooks, the website
//! call-context endpoint, compatibility aliases, and health.

pub mod http;
pub mod state;

pub use http::create_router;
pub use state::AppState;
