//! In-memory key repository
//!
//! Each mutation holds the map's write guard across its whole
//! read-modify-write, which plays the role of a row lock.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::key::{Key, KeyId, KeyRepository};
use crate::domain::quota::apply_delta;
use crate::domain::DomainError;

/// In-memory implementation of KeyRepository
#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyRepository {
    keys: Arc<RwLock<HashMap<KeyId, Key>>>,
}

impl InMemoryKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with keys
    pub fn with_keys(keys: impl IntoIterator<Item = Key>) -> Self {
        let keys = keys
            .into_iter()
            .map(|key| (key.id().clone(), key))
            .collect();

        Self {
            keys: Arc::new(RwLock::new(keys)),
        }
    }
}

fn not_found(id: &KeyId) -> DomainError {
    DomainError::not_found(format!("Key '{}' not found", id))
}

#[async_trait]
impl KeyRepository for InMemoryKeyRepository {
    async fn find_by_id(&self, id: &KeyId) -> Result<Option<Key>, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys.get(id).cloned())
    }

    async fn create(&self, key: Key) -> Result<Key, DomainError> {
        let mut keys = self.keys.write().await;

        if keys.contains_key(key.id()) {
            return Err(DomainError::conflict(format!(
                "Key '{}' already exists",
                key.id()
            )));
        }

        if keys.values().any(|existing| existing.hash() == key.hash()) {
            return Err(DomainError::conflict("Key hash already exists"));
        }

        keys.insert(key.id().clone(), key.clone());
        Ok(key)
    }

    async fn adjust_remaining(&self, id: &KeyId, delta: i64) -> Result<i64, DomainError> {
        let mut keys = self.keys.write().await;
        let key = keys.get_mut(id).ok_or_else(|| not_found(id))?;

        let current = key
            .remaining()
            .ok_or_else(|| DomainError::unlimited(id.as_str()))?;
        let next = apply_delta(current, delta)?;

        key.store_remaining(Some(next));
        Ok(next)
    }

    async fn set_remaining(&self, id: &KeyId, value: i64) -> Result<i64, DomainError> {
        if value < 0 {
            return Err(DomainError::validation(
                "value",
                "must be a non-negative integer",
            ));
        }

        let mut keys = self.keys.write().await;
        let key = keys.get_mut(id).ok_or_else(|| not_found(id))?;

        key.store_remaining(Some(value));
        Ok(value)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::key::KeyAuthId;
    use crate::domain::WorkspaceId;

    fn create_test_key(id: &str, remaining: Option<i64>) -> Key {
        let key = Key::new(
            KeyId::new(id).unwrap(),
            KeyAuthId::new("ks_1"),
            WorkspaceId::new("ws_1"),
            "key_abc",
            format!("sha256${}", id),
        );

        match remaining {
            Some(remaining) => key.with_remaining(remaining),
            None => key,
        }
    }

    fn id(raw: &str) -> KeyId {
        KeyId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = InMemoryKeyRepository::new();
        repo.create(create_test_key("k1", Some(5))).await.unwrap();

        let found = repo.find_by_id(&id("k1")).await.unwrap().unwrap();
        assert_eq!(found.remaining(), Some(5));
        assert!(repo.find_by_id(&id("k2")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate() {
        let repo = InMemoryKeyRepository::new();
        repo.create(create_test_key("k1", None)).await.unwrap();

        let result = repo.create(create_test_key("k1", None)).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_adjust_remaining() {
        let repo = InMemoryKeyRepository::with_keys([create_test_key("k1", Some(100))]);

        assert_eq!(repo.adjust_remaining(&id("k1"), 10).await.unwrap(), 110);
        assert_eq!(repo.adjust_remaining(&id("k1"), -110).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_adjust_below_zero_leaves_counter() {
        let repo = InMemoryKeyRepository::with_keys([create_test_key("k1", Some(3))]);

        let result = repo.adjust_remaining(&id("k1"), -5).await;
        assert!(matches!(
            result,
            Err(DomainError::QuotaUnderflow {
                remaining: 3,
                requested: 5
            })
        ));

        let key = repo.find_by_id(&id("k1")).await.unwrap().unwrap();
        assert_eq!(key.remaining(), Some(3));
    }

    #[tokio::test]
    async fn test_adjust_unlimited_rejected() {
        let repo = InMemoryKeyRepository::with_keys([create_test_key("k1", None)]);

        let result = repo.adjust_remaining(&id("k1"), 1).await;
        assert!(matches!(result, Err(DomainError::UnlimitedQuota { .. })));

        let key = repo.find_by_id(&id("k1")).await.unwrap().unwrap();
        assert!(key.is_unlimited());
    }

    #[tokio::test]
    async fn test_adjust_overflow() {
        let repo = InMemoryKeyRepository::with_keys([create_test_key("k1", Some(i64::MAX))]);

        let result = repo.adjust_remaining(&id("k1"), 1).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_adjust_missing_key() {
        let repo = InMemoryKeyRepository::new();

        let result = repo.adjust_remaining(&id("nope"), 1).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_set_remaining_materialises_unlimited() {
        let repo = InMemoryKeyRepository::with_keys([create_test_key("k1", None)]);

        assert_eq!(repo.set_remaining(&id("k1"), 10).await.unwrap(), 10);

        let key = repo.find_by_id(&id("k1")).await.unwrap().unwrap();
        assert_eq!(key.remaining(), Some(10));
    }

    #[tokio::test]
    async fn test_set_remaining_negative_rejected() {
        let repo = InMemoryKeyRepository::with_keys([create_test_key("k1", Some(4))]);

        let result = repo.set_remaining(&id("k1"), -1).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let repo = InMemoryKeyRepository::with_keys([create_test_key("k1", Some(0))]);

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.adjust_remaining(&id("k1"), 1).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let key = repo.find_by_id(&id("k1")).await.unwrap().unwrap();
        assert_eq!(key.remaining(), Some(64));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_decrements_never_go_negative() {
        let repo = InMemoryKeyRepository::with_keys([create_test_key("k1", Some(10))]);

        let handles: Vec<_> = (0..25)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.adjust_remaining(&id("k1"), -1).await })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 10);
        let key = repo.find_by_id(&id("k1")).await.unwrap().unwrap();
        assert_eq!(key.remaining(), Some(0));
    }
}
