//! Administrative commands run against the configured storage

use chrono::{DateTime, Duration, Utc};
use clap::Args;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::{RootKey, RootKeyId, WorkspaceId};
use crate::infrastructure::credential::{hash_secret, RootKeyGenerator};
use crate::infrastructure::storage::{
    connect_pool, run_storage_migrations, StorageConfig, StorageFactory,
};

#[derive(Debug, Args)]
pub struct CreateRootKeyArgs {
    /// Workspace the root key acts in
    #[arg(long)]
    pub workspace: String,

    /// Permission scope, e.g. `api.*.update_key` (repeatable)
    #[arg(long = "scope", required = true)]
    pub scopes: Vec<String>,

    /// Display name
    #[arg(long, default_value = "root")]
    pub name: String,

    /// Expire the key after this many days
    #[arg(long)]
    pub expires_in_days: Option<i64>,
}

/// Apply pending migrations to the configured PostgreSQL database
pub async fn migrate() -> anyhow::Result<()> {
    let config = super::serve::load_config()?;

    let StorageConfig::Postgres { config: pg, .. } = StorageConfig::from_settings(&config.storage)
    else {
        anyhow::bail!("migrate requires storage.kind = postgres");
    };

    let pool = connect_pool(&pg).await?;
    let applied = run_storage_migrations(&pool).await?;
    info!(applied, "Migrations complete");

    Ok(())
}

/// Expiry timestamp `days` after `now`; rejects non-positive or unrepresentable spans
fn expiry_after_days(now: DateTime<Utc>, days: i64) -> anyhow::Result<DateTime<Utc>> {
    if days <= 0 {
        anyhow::bail!("--expires-in-days must be positive, got {days}");
    }

    Duration::try_days(days)
        .and_then(|span| now.checked_add_signed(span))
        .ok_or_else(|| anyhow::anyhow!("--expires-in-days {days} is out of range"))
}

/// Print the digest of a secret as stored by the credential repository
pub fn hash_secret_command(secret: &str) {
    println!("{}", hash_secret(secret));
}

/// Issue a new root key and print its secret
pub async fn create_root_key(args: CreateRootKeyArgs) -> anyhow::Result<()> {
    let config: AppConfig = super::serve::load_config()?;
    let storage = StorageConfig::from_settings(&config.storage);
    let expires_at = args
        .expires_in_days
        .map(|days| expiry_after_days(Utc::now(), days))
        .transpose()?;

    if matches!(storage, StorageConfig::InMemory) {
        warn!("In-memory storage is discarded when this command exits");
    }

    let backends = StorageFactory::create(&storage).await?;
    let generated = RootKeyGenerator::default().generate();

    let mut root_key = RootKey::new(
        RootKeyId::generate(),
        WorkspaceId::new(args.workspace),
        args.name,
        generated.hash,
        generated.prefix,
    )
    .with_scopes(args.scopes);

    if let Some(expires_at) = expires_at {
        root_key = root_key.with_expiration(expires_at);
    }

    let created = backends.root_keys.create(root_key).await?;
    info!(
        root_key_id = %created.id(),
        workspace_id = %created.workspace_id(),
        "Root key created"
    );

    println!("{}", generated.key);
    Ok(())
}
