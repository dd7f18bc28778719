use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationError};

/// Environment variable prefix for overrides, e.g. `ROUTERSYNC_DATABASE__URL`
pub const ENV_PREFIX: &str = "ROUTERSYNC";

/// Configuration error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    #[validate(length(min = 1))]
    pub service_name: String,
    #[validate(length(min = 1))]
    pub log_level: String,
    #[validate(custom(function = "validate_log_format"))]
    pub log_format: String,
    #[validate(custom(function = "validate_socket_addr"))]
    pub listen_addr: String,
    #[validate(nested)]
    pub database: DatabaseConfig,
    #[validate(nested)]
    pub device: DeviceConfig,
    pub mirror: MirrorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "routersync".to_string(),
            log_level: "info".to_string(),
            log_format: "json".to_string(),
            listen_addr: "0.0.0.0:3000".to_string(),
            database: DatabaseConfig::default(),
            device: DeviceConfig::default(),
            mirror: MirrorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Database URL from the config, falling back to `DATABASE_URL`
    pub fn database_url(&self) -> Option<String> {
        self.database
            .url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| std::env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()))
    }
}

/// Relational store settings; no URL means the in-memory store
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

/// Router connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DeviceConfig {
    /// Bound for ordinary router requests; unset means no explicit bound
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: Option<u64>,
    #[validate(range(min = 1, max = 60))]
    pub probe_timeout_secs: u64,
    pub allow_private_addresses: bool,
    pub accept_invalid_certs: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: None,
            probe_timeout_secs: 5,
            allow_private_addresses: false,
            accept_invalid_certs: true,
        }
    }
}

/// Mirror table write policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Delete mirror rows the router no longer reports (firewall rules are always replaced)
    pub prune_stale: bool,
}

fn validate_log_format(value: &str) -> Result<(), ValidationError> {
    match value {
        "json" | "plain" => Ok(()),
        _ => Err(ValidationError::new("log_format")),
    }
}

fn validate_socket_addr(value: &str) -> Result<(), ValidationError> {
    value
        .parse::<std::net::SocketAddr>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("listen_addr"))
}

/// Load configuration from an optional file plus `ROUTERSYNC_*` environment overrides
pub fn load_config<T>(path: &str) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de> + Validate,
{
    let config: T = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ConfigError::LoadError(e.to_string()))?
        .try_deserialize()
        .map_err(|e| ConfigError::LoadError(e.to_string()))?;

    config
        .validate()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
    Ok(config)
}

/// Load configuration from YAML string (for testing)
pub fn load_from_yaml<T>(yaml: &str) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de> + Validate,
{
    let config: T =
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::LoadError(e.to_string()))?;
    config
        .validate()
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
    Ok(config)
}
