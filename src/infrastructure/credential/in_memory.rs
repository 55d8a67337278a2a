//! In-memory root credential repository

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::generator::constant_time_eq;
use crate::domain::root_key::{RootKey, RootKeyRepository};
use crate::domain::DomainError;

/// In-memory implementation of RootKeyRepository, indexed by digest
#[derive(Debug, Default)]
pub struct InMemoryRootKeyRepository {
    by_hash: Arc<RwLock<HashMap<String, RootKey>>>,
}

impl InMemoryRootKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RootKeyRepository for InMemoryRootKeyRepository {
    async fn find_by_hash(&self, hash: &str) -> Result<Option<RootKey>, DomainError> {
        let by_hash = self.by_hash.read().await;

        Ok(by_hash
            .get(hash)
            .filter(|root_key| constant_time_eq(root_key.hash().as_bytes(), hash.as_bytes()))
            .cloned())
    }

    async fn create(&self, root_key: RootKey) -> Result<RootKey, DomainError> {
        let mut by_hash = self.by_hash.write().await;

        if by_hash.contains_key(root_key.hash()) {
            return Err(DomainError::conflict(format!(
                "Root key with prefix '{}' already exists",
                root_key.prefix()
            )));
        }

        by_hash.insert(root_key.hash().to_string(), root_key.clone());
        Ok(root_key)
    }
}
