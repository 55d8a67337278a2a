//! Storage factory for runtime storage selection

use std::sync::Arc;

use tracing::info;

use crate::config::{StorageKind, StorageSettings};
use crate::domain::{DomainError, KeyRepository, RootKeyRepository};
use crate::infrastructure::credential::{InMemoryRootKeyRepository, PostgresRootKeyRepository};
use crate::infrastructure::key::{InMemoryKeyRepository, PostgresKeyRepository};

use super::migrations::run_storage_migrations;
use super::postgres::{connect_pool, PostgresConfig};

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage configuration
    InMemory,
    /// PostgreSQL storage configuration
    Postgres {
        config: PostgresConfig,
        run_migrations: bool,
    },
}

impl StorageConfig {
    /// Build from the `storage` configuration section
    pub fn from_settings(settings: &StorageSettings) -> Self {
        match settings.kind {
            StorageKind::Memory => Self::InMemory,
            StorageKind::Postgres => Self::Postgres {
                config: PostgresConfig {
                    url: settings.url.clone(),
                    max_connections: settings.max_connections,
                    min_connections: settings.min_connections,
                    connect_timeout_secs: settings.connect_timeout_secs,
                    idle_timeout_secs: settings.idle_timeout_secs,
                },
                run_migrations: settings.run_migrations,
            },
        }
    }

    pub fn kind(&self) -> StorageKind {
        match self {
            Self::InMemory => StorageKind::Memory,
            Self::Postgres { .. } => StorageKind::Postgres,
        }
    }
}

/// Repositories backed by one storage selection
#[derive(Debug, Clone)]
pub struct StorageBackends {
    pub keys: Arc<dyn KeyRepository>,
    pub root_keys: Arc<dyn RootKeyRepository>,
}

/// Factory for creating storage instances
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates the repositories described by the configuration
    pub async fn create(config: &StorageConfig) -> Result<StorageBackends, DomainError> {
        match config {
            StorageConfig::InMemory => {
                info!("Using in-memory storage");
                Ok(Self::create_in_memory())
            }
            StorageConfig::Postgres {
                config,
                run_migrations,
            } => {
                info!("Connecting to PostgreSQL");
                let pool = connect_pool(config).await?;

                if *run_migrations {
                    let applied = run_storage_migrations(&pool).await?;
                    info!(applied, "Storage migrations complete");
                }

                Ok(StorageBackends {
                    keys: Arc::new(PostgresKeyRepository::new(pool.clone())),
                    root_keys: Arc::new(PostgresRootKeyRepository::new(pool)),
                })
            }
        }
    }

    /// Creates empty in-memory repositories
    pub fn create_in_memory() -> StorageBackends {
        StorageBackends {
            keys: Arc::new(InMemoryKeyRepository::new()),
            root_keys: Arc::new(InMemoryRootKeyRepository::new()),
        }
    }
}
