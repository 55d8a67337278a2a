//! Credential resolution
//!
//! Turns an opaque bearer secret into an authenticated root credential.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use super::generator::{constant_time_eq, hash_secret, secret_prefix};
use crate::domain::root_key::{RootKey, RootKeyRepository};
use crate::domain::DomainError;

/// Resolves bearer secrets to root credentials.
///
/// Stateless per request unless a cache is attached with [`with_cache`];
/// cached entries are bounded in count and expire after the TTL, so a
/// revocation is visible to every instance within one TTL.
///
/// [`with_cache`]: CredentialResolver::with_cache
#[derive(Debug)]
pub struct CredentialResolver {
    repository: Arc<dyn RootKeyRepository>,
    cache: Option<Cache<String, Arc<RootKey>>>,
}

impl CredentialResolver {
    pub fn new(repository: Arc<dyn RootKeyRepository>) -> Self {
        Self {
            repository,
            cache: None,
        }
    }

    /// Attach a bounded, time-expiring cache of resolved credentials
    pub fn with_cache(mut self, ttl: Duration, capacity: u64) -> Self {
        self.cache = Some(
            Cache::builder()
                .time_to_live(ttl)
                .max_capacity(capacity)
                .build(),
        );
        self
    }

    /// Resolve a bearer secret.
    ///
    /// Every failure to authenticate (unknown secret, revoked or expired
    /// credential) is the same `Unauthenticated` error.
    pub async fn resolve(&self, bearer: &str) -> Result<RootKey, DomainError> {
        if bearer.is_empty() {
            return Err(DomainError::Unauthenticated);
        }

        let digest = hash_secret(bearer);

        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&digest).await {
                if cached.is_valid() {
                    debug!(root_key_id = %cached.id(), "Credential cache hit");
                    return Ok((*cached).clone());
                }

                cache.invalidate(&digest).await;
            }
        }

        let root_key = self
            .repository
            .find_by_hash(&digest)
            .await?
            .filter(|root_key| constant_time_eq(root_key.hash().as_bytes(), digest.as_bytes()))
            .ok_or_else(|| {
                debug!(prefix = %secret_prefix(bearer), "No root key matches bearer secret");
                DomainError::Unauthenticated
            })?;

        if !root_key.is_valid() {
            debug!(
                root_key_id = %root_key.id(),
                status = root_key.status().as_str(),
                expired = root_key.is_expired(),
                "Root key is not usable"
            );
            return Err(DomainError::Unauthenticated);
        }

        if let Some(cache) = &self.cache {
            cache.insert(digest, Arc::new(root_key.clone())).await;
        }

        Ok(root_key)
    }
}
