//! Root credential repository trait

use async_trait::async_trait;
use std::fmt::Debug;

#[cfg(test)]
use mockall::automock;

use super::entity::RootKey;
use crate::domain::DomainError;

/// Repository trait for root credential lookup
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RootKeyRepository: Send + Sync + Debug {
    /// Find a root credential by the digest of its secret
    async fn find_by_hash(&self, hash: &str) -> Result<Option<RootKey>, DomainError>;

    /// Insert a root credential (issuance and fixture seeding)
    async fn create(&self, root_key: RootKey) -> Result<RootKey, DomainError>;
}
