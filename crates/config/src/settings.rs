//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Telephony provider configuration
    #[serde(default)]
    pub twilio: TwilioConfig,

    /// CRM configuration
    #[serde(default)]
    pub crm: CrmConfig,

    /// Speech safety / moderation configuration
    #[serde(default)]
    pub safety: SafetyConfig,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings that cannot be checked by serde alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.config_cache_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.config_cache_ttl_secs".to_string(),
                message: "cache TTL must be at least 1 second".to_string(),
            });
        }
        for number in &self.twilio.verified_outbound_numbers {
            if !number.starts_with('+') {
                return Err(ConfigError::InvalidValue {
                    field: "twilio.verified_outbound_numbers".to_string(),
                    message: format!("expected E.164 number, got '{}'", number),
                });
            }
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON logs
    #[serde(default)]
    pub log_json: bool,

    /// TTL for the prompt/greeting/correction cache
    #[serde(default = "default_cache_ttl")]
    pub config_cache_ttl_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_cache_ttl() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_json: false,
            config_cache_ttl_secs: default_cache_ttl(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum pool connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_url() -> String {
    "postgres://localhost:5432/call_routing".to_string()
}
fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Telephony provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    /// Account SID
    #[serde(default)]
    pub account_sid: String,

    /// Auth token
    #[serde(default)]
    pub auth_token: String,

    /// Preferred outbound caller ID, used when it survives exclusion
    #[serde(default)]
    pub caller_id: Option<String>,

    /// Operator-configured allow-list of verified outbound numbers.
    /// When empty the list is fetched from the provider account instead.
    #[serde(default)]
    pub verified_outbound_numbers: Vec<String>,

    /// TTL for the verified-number cache
    #[serde(default = "default_verified_ttl")]
    pub verified_cache_ttl_secs: u64,
}

fn default_verified_ttl() -> u64 {
    300
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            caller_id: None,
            verified_outbound_numbers: Vec::new(),
            verified_cache_ttl_secs: default_verified_ttl(),
        }
    }
}

impl TwilioConfig {
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty()
    }
}

/// CRM (Salesforce-style) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmConfig {
    /// OAuth token endpoint
    #[serde(default)]
    pub token_url: String,

    /// API base URL
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    /// When set together with `password`, the password grant is used
    /// instead of client credentials.
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Request timeout for token and lead calls
    #[serde(default = "default_crm_timeout")]
    pub timeout_secs: u64,
}

fn default_crm_timeout() -> u64 {
    30
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            token_url: String::new(),
            base_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            username: None,
            password: None,
            timeout_secs: default_crm_timeout(),
        }
    }
}

impl CrmConfig {
    pub fn is_configured(&self) -> bool {
        !self.token_url.is_empty()
            && !self.base_url.is_empty()
            && !self.client_id.is_empty()
            && !self.client_secret.is_empty()
    }
}

/// Speech safety / moderation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// API key for the remote moderation model; blank disables remote
    /// checks and only the local blacklist applies.
    #[serde(default)]
    pub gemini_api_key: String,

    /// Remote moderation timeout
    #[serde(default = "default_safety_timeout")]
    pub timeout_secs: u64,
}

fn default_safety_timeout() -> u64 {
    5
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            timeout_secs: default_safety_timeout(),
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (CALL_ROUTER prefix, `__` separator)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("CALL_ROUTER")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
