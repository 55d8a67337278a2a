//! PostgreSQL key repository
//!
//! Counter mutations are single guarded `UPDATE .. RETURNING` statements, so
//! the database row lock serialises concurrent mutations of one key across
//! every service instance.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::key::{Key, KeyAuthId, KeyId, KeyRepository};
use crate::domain::{DomainError, WorkspaceId};
use crate::infrastructure::storage::classify_sqlx_error;

/// PostgreSQL implementation of KeyRepository
#[derive(Debug, Clone)]
pub struct PostgresKeyRepository {
    pool: PgPool,
}

impl PostgresKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Explain why a guarded adjustment matched no row
    async fn classify_rejected_adjustment(
        &self,
        id: &KeyId,
        delta: i64,
    ) -> Result<DomainError, DomainError> {
        let row = sqlx::query("SELECT remaining FROM keys WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify_sqlx_error("Failed to read key", e))?;

        let stored = row
            .map(|row| row.try_get::<Option<i64>, _>("remaining"))
            .transpose()
            .map_err(|e| classify_sqlx_error("Failed to decode key", e))?;

        Ok(rejection_reason(id, stored, delta))
    }
}

/// Why a guarded adjustment by `delta` matched no row, given the counter read
/// back afterwards (`None` when the row is gone).
fn rejection_reason(id: &KeyId, stored: Option<Option<i64>>, delta: i64) -> DomainError {
    let Some(remaining) = stored else {
        return DomainError::not_found(format!("Key '{}' not found", id));
    };

    let Some(current) = remaining else {
        return DomainError::unlimited(id.as_str());
    };

    match current.checked_add(delta) {
        // The counter moved between the update and this read; let the
        // caller retry the guarded update.
        Some(next) if next >= 0 => {
            DomainError::conflict(format!("Key '{}' changed during update", id))
        }
        Some(_) => DomainError::underflow(current, delta.saturating_neg()),
        None if delta > 0 => DomainError::validation("value", "remaining would overflow"),
        None => DomainError::underflow(current, delta.saturating_neg()),
    }
}

#[async_trait]
impl KeyRepository for PostgresKeyRepository {
    async fn find_by_id(&self, id: &KeyId) -> Result<Option<Key>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, key_auth_id, workspace_id, name, start, hash, remaining,
                   created_at, updated_at
            FROM keys
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error("Failed to get key", e))?;

        row.as_ref().map(row_to_key).transpose()
    }

    async fn create(&self, key: Key) -> Result<Key, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO keys (id, key_auth_id, workspace_id, name, start, hash, remaining,
                              created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(key.id().as_str())
        .bind(key.key_auth_id().as_str())
        .bind(key.workspace_id().as_str())
        .bind(key.name())
        .bind(key.start())
        .bind(key.hash())
        .bind(key.remaining())
        .bind(key.created_at())
        .bind(key.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error(&format!("Failed to create key '{}'", key.id()), e))?;

        Ok(key)
    }

    async fn adjust_remaining(&self, id: &KeyId, delta: i64) -> Result<i64, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE keys
            SET remaining = remaining + $2, updated_at = NOW()
            WHERE id = $1 AND remaining IS NOT NULL AND remaining + $2 >= 0
            RETURNING remaining
            "#,
        )
        .bind(id.as_str())
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error("Failed to adjust remaining", e))?;

        match row {
            Some(row) => row
                .try_get("remaining")
                .map_err(|e| classify_sqlx_error("Failed to decode remaining", e)),
            None => Err(self.classify_rejected_adjustment(id, delta).await?),
        }
    }

    async fn set_remaining(&self, id: &KeyId, value: i64) -> Result<i64, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE keys
            SET remaining = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING remaining
            "#,
        )
        .bind(id.as_str())
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify_sqlx_error("Failed to set remaining", e))?;

        match row {
            Some(row) => row
                .try_get("remaining")
                .map_err(|e| classify_sqlx_error("Failed to decode remaining", e)),
            None => Err(DomainError::not_found(format!("Key '{}' not found", id))),
        }
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| classify_sqlx_error("Storage ping failed", e))?;

        Ok(())
    }
}

/// Columns of one `keys` row
#[derive(Debug, Clone)]
struct KeyRow {
    id: String,
    key_auth_id: String,
    workspace_id: String,
    name: Option<String>,
    start: String,
    hash: String,
    remaining: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl KeyRow {
    fn into_key(self) -> Result<Key, DomainError> {
        let id = KeyId::new(self.id)
            .map_err(|e| DomainError::storage(format!("Stored key has invalid id: {}", e)))?;

        let mut key = Key::new(
            id,
            KeyAuthId::new(self.key_auth_id),
            WorkspaceId::new(self.workspace_id),
            self.start,
            self.hash,
        )
        .with_timestamps(self.created_at, self.updated_at);

        if let Some(name) = self.name {
            key = key.with_name(name);
        }

        if let Some(remaining) = self.remaining {
            key = key.with_remaining(remaining);
        }

        Ok(key)
    }
}

fn row_to_key(row: &PgRow) -> Result<Key, DomainError> {
    let decode = |e| classify_sqlx_error("Failed to decode key row", e);

    KeyRow {
        id: row.try_get("id").map_err(decode)?,
        key_auth_id: row.try_get("key_auth_id").map_err(decode)?,
        workspace_id: row.try_get("workspace_id").map_err(decode)?,
        name: row.try_get("name").map_err(decode)?,
        start: row.try_get("start").map_err(decode)?,
        hash: row.try_get("hash").map_err(decode)?,
        remaining: row.try_get("remaining").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    }
    .into_key()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_id() -> KeyId {
        KeyId::new("key_1").unwrap()
    }

    fn key_row(remaining: Option<i64>) -> KeyRow {
        let now = Utc::now();
        KeyRow {
            id: "key_1".to_string(),
            key_auth_id: "ks_1".to_string(),
            workspace_id: "ws_1".to_string(),
            name: None,
            start: "sk_abc".to_string(),
            hash: "sha256$abc".to_string(),
            remaining,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_rejection_for_missing_key() {
        let err = rejection_reason(&key_id(), None, -1);
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[test]
    fn test_rejection_for_unlimited_key() {
        let err = rejection_reason(&key_id(), Some(None), -1);
        assert!(matches!(err, DomainError::UnlimitedQuota { key_id } if key_id == "key_1"));
    }

    #[test]
    fn test_rejection_when_counter_moved_is_retryable() {
        // The update saw 2 and rejected -5; a concurrent set raised it to 10
        let err = rejection_reason(&key_id(), Some(Some(10)), -5);
        assert!(matches!(err, DomainError::Conflict { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_rejection_for_underflow() {
        let err = rejection_reason(&key_id(), Some(Some(3)), -5);
        assert!(matches!(
            err,
            DomainError::QuotaUnderflow {
                remaining: 3,
                requested: 5
            }
        ));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_rejection_for_overflow() {
        let err = rejection_reason(&key_id(), Some(Some(i64::MAX)), 1);
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[test]
    fn test_key_row_into_key() {
        let mut row = key_row(Some(7));
        row.name = Some("ci".to_string());

        let key = row.into_key().unwrap();
        assert_eq!(key.id().as_str(), "key_1");
        assert_eq!(key.workspace_id().as_str(), "ws_1");
        assert_eq!(key.name(), Some("ci"));
        assert_eq!(key.remaining(), Some(7));
    }

    #[test]
    fn test_key_row_null_remaining_is_unlimited() {
        let key = key_row(None).into_key().unwrap();
        assert!(key.is_unlimited());
    }

    #[test]
    fn test_key_row_invalid_id_is_storage_error() {
        let mut row = key_row(Some(1));
        row.id = "bad.id".to_string();

        assert!(matches!(row.into_key(), Err(DomainError::Storage { .. })));
    }
}
