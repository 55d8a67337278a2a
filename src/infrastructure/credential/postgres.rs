//! PostgreSQL root credential repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::root_key::{RootKey, RootKeyId, RootKeyRepository, RootKeyStatus};
use crate::domain::{DomainError, WorkspaceId};
use crate::infrastructure::storage::classify_sqlx_error;

/// PostgreSQL implementation of RootKeyRepository.
///
/// Lookup is an equality match on the unique `hash` column, so full digests
/// are compared and raw secrets never reach the database.
#[derive(Debug, Clone)]
pub struct PostgresRootKeyRepository {
    pool: PgPool,
}

impl PostgresRootKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RootKeyRepository for PostgresRootKeyRepository {
    async fn find_by_hash(&self, hash: &str) -> Result<Option<RootKey>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, workspace_id, name, hash, prefix, scopes, status, expires_at, created_at
            FROM root_keys
            WHERE hash = $1
            "#,
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error("Failed to get root key", e))?;

        row.as_ref().map(row_to_root_key).transpose()
    }

    async fn create(&self, root_key: RootKey) -> Result<RootKey, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO root_keys (id, workspace_id, name, hash, prefix, scopes, status,
                                   expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(root_key.id().as_str())
        .bind(root_key.workspace_id().as_str())
        .bind(root_key.name())
        .bind(root_key.hash())
        .bind(root_key.prefix())
        .bind(root_key.scopes())
        .bind(root_key.status().as_str())
        .bind(root_key.expires_at())
        .bind(root_key.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error("Failed to create root key", e))?;

        Ok(root_key)
    }
}

fn row_to_root_key(row: &PgRow) -> Result<RootKey, DomainError> {
    let decode = |e| classify_sqlx_error("Failed to decode root key row", e);

    let id: String = row.try_get("id").map_err(decode)?;
    let workspace_id: String = row.try_get("workspace_id").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let hash: String = row.try_get("hash").map_err(decode)?;
    let prefix: String = row.try_get("prefix").map_err(decode)?;
    let scopes: Vec<String> = row.try_get("scopes").map_err(decode)?;
    let status: String = row.try_get("status").map_err(decode)?;
    let expires_at: Option<DateTime<Utc>> = row.try_get("expires_at").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;

    let status = RootKeyStatus::parse(&status)
        .ok_or_else(|| DomainError::storage(format!("Unknown root key status '{}'", status)))?;

    let mut root_key = RootKey::new(
        RootKeyId::new(id),
        WorkspaceId::new(workspace_id),
        name,
        hash,
        prefix,
    )
    .with_scopes(scopes)
    .with_status(status)
    .with_created_at(created_at);

    if let Some(expires_at) = expires_at {
        root_key = root_key.with_expiration(expires_at);
    }

    Ok(root_key)
}
