use serde::Deserialize;

use crate::domain::{DomainError, UnlimitedPolicy};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageSettings,
    pub quota: QuotaSettings,
    pub credentials: CredentialSettings,
    pub metrics: MetricsSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Memory,
    Postgres,
}

/// Storage backend selection and PostgreSQL pool settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub kind: StorageKind,
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// Apply pending migrations when the server starts
    pub run_migrations: bool,
}

/// Counter mutation behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuotaSettings {
    pub unlimited_policy: UnlimitedPolicy,
    /// Extra attempts after a storage concurrency conflict
    pub conflict_retries: u32,
}

/// Resolved root credential cache
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
}

/// Prometheus exporter
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            kind: StorageKind::default(),
            url: "postgres://localhost/key_quota".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 5,
            idle_timeout_secs: 600,
            run_migrations: true,
        }
    }
}

impl Default for QuotaSettings {
    fn default() -> Self {
        Self {
            unlimited_policy: UnlimitedPolicy::default(),
            conflict_retries: 1,
        }
    }
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            cache_enabled: false,
            cache_ttl_secs: 30,
            cache_capacity: 10_000,
        }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject settings that would only fail later at runtime
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.storage.min_connections > self.storage.max_connections {
            return Err(DomainError::configuration(
                "storage.min_connections exceeds storage.max_connections",
            ));
        }

        if self.credentials.cache_enabled
            && (self.credentials.cache_ttl_secs == 0 || self.credentials.cache_capacity == 0)
        {
            return Err(DomainError::configuration(
                "credential cache needs a non-zero ttl and capacity",
            ));
        }

        if !self.metrics.path.starts_with('/') {
            return Err(DomainError::configuration("metrics.path must start with '/'"));
        }

        Ok(())
    }
}
