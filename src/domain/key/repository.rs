//! Key repository trait

use async_trait::async_trait;
use std::fmt::Debug;

#[cfg(test)]
use mockall::automock;

use super::entity::{Key, KeyId};
use crate::domain::DomainError;

/// Repository trait for key storage.
///
/// The counter mutations are the storage layer's atomic primitives: each call
/// must apply as a single read-modify-write that cannot interleave with
/// another mutation of the same key, across every service instance sharing
/// the store.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KeyRepository: Send + Sync + Debug {
    /// Get a key by its ID
    async fn find_by_id(&self, id: &KeyId) -> Result<Option<Key>, DomainError>;

    /// Insert a key (issuance and fixture seeding)
    async fn create(&self, key: Key) -> Result<Key, DomainError>;

    /// Atomically add `delta` to the key's remaining counter and return the
    /// new value.
    ///
    /// Fails with `NotFound` for an unknown key, `UnlimitedQuota` when the
    /// key has no counter, and `QuotaUnderflow` when the result would be
    /// negative. A failed call leaves the counter untouched.
    async fn adjust_remaining(&self, id: &KeyId, delta: i64) -> Result<i64, DomainError>;

    /// Atomically overwrite the key's remaining counter and return it
    async fn set_remaining(&self, id: &KeyId, value: i64) -> Result<i64, DomainError>;

    /// Cheap connectivity probe used by readiness checks
    async fn ping(&self) -> Result<(), DomainError>;
}
