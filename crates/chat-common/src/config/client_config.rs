//! Client configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub app: AppSettings,
    pub gateway: GatewayConfig,
    pub event_cache: EventCacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            env: Environment::default(),
        }
    }
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Gateway session settings
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Minimum spacing between two session connects of one scheduler
    #[serde(default = "default_identify_delay_ms")]
    pub identify_delay_ms: u64,
    /// Number of shards the event stream is split into
    #[serde(default = "default_shard_total")]
    pub shard_total: u32,
    /// Number of shards allowed to identify at the same time
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: u32,
}

impl GatewayConfig {
    #[must_use]
    pub fn identify_delay(&self) -> Duration {
        Duration::from_millis(self.identify_delay_ms)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            identify_delay_ms: default_identify_delay_ms(),
            shard_total: default_shard_total(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Event reconciliation cache settings
#[derive(Debug, Clone, Deserialize)]
pub struct EventCacheConfig {
    /// Deferred events older than this many gateway responses are discarded
    #[serde(default = "default_stale_after_responses")]
    pub stale_after_responses: u64,
}

impl Default for EventCacheConfig {
    fn default() -> Self {
        Self {
            stale_after_responses: default_stale_after_responses(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "chat-client".to_string()
}

fn default_identify_delay_ms() -> u64 {
    5000
}

fn default_shard_total() -> u32 {
    1
}

fn default_max_concurrency() -> u32 {
    1
}

fn default_stale_after_responses() -> u64 {
    100
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// Every variable is optional; unset variables fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = match lookup("APP_ENV") {
            Some(raw) => Environment::parse(&raw)
                .ok_or(ConfigError::InvalidValue("APP_ENV", raw))?,
            None => Environment::default(),
        };

        let config = Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            gateway: GatewayConfig {
                identify_delay_ms: parse_var(
                    &lookup,
                    "GATEWAY_IDENTIFY_DELAY_MS",
                    default_identify_delay_ms,
                )?,
                shard_total: parse_var(&lookup, "GATEWAY_SHARD_TOTAL", default_shard_total)?,
                max_concurrency: parse_var(
                    &lookup,
                    "GATEWAY_MAX_CONCURRENCY",
                    default_max_concurrency,
                )?,
            },
            event_cache: EventCacheConfig {
                stale_after_responses: parse_var(
                    &lookup,
                    "EVENT_CACHE_STALE_AFTER",
                    default_stale_after_responses,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.shard_total == 0 {
            return Err(ConfigError::InvalidValue(
                "GATEWAY_SHARD_TOTAL",
                "must be at least 1".to_string(),
            ));
        }
        if self.gateway.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "GATEWAY_MAX_CONCURRENCY",
                "must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: fn() -> T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default()),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
