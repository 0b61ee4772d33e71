//! Configuration for the call router
//!
//! Settings are layered: `config/default.yaml`, an optional per-environment
//! file, then `CALL_ROUTER__`-prefixed environment variables. Built-in IVR
//! copy (greetings, prompts, misheard corrections) lives in [`defaults`] and
//! is used whenever the operator has not overridden a key in the database.

pub mod defaults;
pub mod settings;

pub use settings::{
    load_settings, CrmConfig, DatabaseConfig, SafetyConfig, ServerConfig, Settings, TwilioConfig,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config load error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
