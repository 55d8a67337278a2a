//! Key quota service
//!
//! Authenticated HTTP endpoint that increments, decrements or sets the
//! remaining-usage counter of an issued API key:
//! - Root keys resolved from bearer secrets by digest
//! - Hierarchical wildcard permissions (`api.*.update_key`)
//! - Atomic counter mutation in memory or PostgreSQL

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use infrastructure::credential::CredentialResolver;
use infrastructure::quota::QuotaService;
use infrastructure::storage::{StorageBackends, StorageConfig, StorageFactory};
use tracing::info;

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage = StorageConfig::from_settings(&config.storage);
    info!("Storage backend: {:?}", storage.kind());

    let backends = StorageFactory::create(&storage).await?;

    Ok(build_app_state(backends, config))
}

/// Wire services over already-created repositories
pub fn build_app_state(backends: StorageBackends, config: &AppConfig) -> AppState {
    let quota_service = QuotaService::new(backends.keys.clone())
        .with_unlimited_policy(config.quota.unlimited_policy)
        .with_conflict_retries(config.quota.conflict_retries);

    let mut credential_resolver = CredentialResolver::new(backends.root_keys);
    if config.credentials.cache_enabled {
        info!(
            ttl_secs = config.credentials.cache_ttl_secs,
            capacity = config.credentials.cache_capacity,
            "Credential cache enabled"
        );
        credential_resolver = credential_resolver.with_cache(
            Duration::from_secs(config.credentials.cache_ttl_secs),
            config.credentials.cache_capacity,
        );
    }

    AppState::new(
        Arc::new(quota_service),
        Arc::new(credential_resolver),
        backends.keys,
    )
}
