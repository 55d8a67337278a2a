//! Quota service
//!
//! Applies one counter operation to a key on behalf of an authorised
//! workspace. Atomicity of the read-modify-write is owned by the storage
//! adapter; this layer adds workspace scoping, the unlimited policy and
//! conflict retries.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::key::{KeyId, KeyRepository};
use crate::domain::{DomainError, QuotaOperation, QuotaUpdate, UnlimitedPolicy, WorkspaceId};
use crate::infrastructure::observability::{record_conflict_retry, record_quota_update};

/// Service mutating the remaining-usage counter of keys
#[derive(Debug, Clone)]
pub struct QuotaService {
    repository: Arc<dyn KeyRepository>,
    unlimited_policy: UnlimitedPolicy,
    conflict_retries: u32,
}

impl QuotaService {
    /// Create a service with the `reject` policy and a single conflict retry
    pub fn new(repository: Arc<dyn KeyRepository>) -> Self {
        Self {
            repository,
            unlimited_policy: UnlimitedPolicy::default(),
            conflict_retries: 1,
        }
    }

    pub fn with_unlimited_policy(mut self, policy: UnlimitedPolicy) -> Self {
        self.unlimited_policy = policy;
        self
    }

    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries;
        self
    }

    /// Apply `operation` to the key, returning the counter after the change
    pub async fn apply(
        &self,
        workspace_id: &WorkspaceId,
        key_id: &KeyId,
        operation: QuotaOperation,
    ) -> Result<QuotaUpdate, DomainError> {
        let result = self.apply_operation(workspace_id, key_id, operation).await;

        record_quota_update(operation.name(), outcome_label(&result));

        match &result {
            Ok(update) => info!(
                key_id = %key_id,
                workspace_id = %workspace_id,
                op = %operation,
                remaining = ?update.remaining,
                "Key remaining updated"
            ),
            Err(e) => debug!(
                key_id = %key_id,
                workspace_id = %workspace_id,
                op = %operation,
                error = %e,
                "Key remaining update rejected"
            ),
        }

        result
    }

    async fn apply_operation(
        &self,
        workspace_id: &WorkspaceId,
        key_id: &KeyId,
        operation: QuotaOperation,
    ) -> Result<QuotaUpdate, DomainError> {
        // Keys of other workspaces are indistinguishable from missing keys
        self.repository
            .find_by_id(key_id)
            .await?
            .filter(|key| key.belongs_to(workspace_id))
            .ok_or_else(|| DomainError::not_found(format!("Key '{}' not found", key_id)))?;

        let delta = match operation {
            QuotaOperation::Set(value) => {
                let remaining = self
                    .retry_on_conflict(key_id, || self.repository.set_remaining(key_id, value))
                    .await?;
                return Ok(updated(key_id, Some(remaining)));
            }
            QuotaOperation::Increment(value) => value,
            QuotaOperation::Decrement(value) => -value,
        };

        // Whether the key is unlimited is decided by the atomic update, not
        // by the lookup above, which may already be stale.
        match self
            .retry_on_conflict(key_id, || self.repository.adjust_remaining(key_id, delta))
            .await
        {
            Ok(remaining) => Ok(updated(key_id, Some(remaining))),
            Err(DomainError::UnlimitedQuota { .. })
                if self.unlimited_policy == UnlimitedPolicy::Preserve =>
            {
                Ok(updated(key_id, None))
            }
            Err(e) => Err(e),
        }
    }

    async fn retry_on_conflict<F, Fut>(&self, key_id: &KeyId, mut attempt: F) -> Result<i64, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<i64, DomainError>>,
    {
        let mut retries = 0;

        loop {
            match attempt().await {
                Err(e) if e.is_retryable() && retries < self.conflict_retries => {
                    retries += 1;
                    record_conflict_retry();
                    warn!(key_id = %key_id, attempt = retries, error = %e, "Retrying key update");
                }
                result => return result,
            }
        }
    }
}

fn updated(key_id: &KeyId, remaining: Option<i64>) -> QuotaUpdate {
    QuotaUpdate {
        key_id: key_id.clone(),
        remaining,
    }
}

fn outcome_label(result: &Result<QuotaUpdate, DomainError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(DomainError::Validation { .. }) => "invalid",
        Err(DomainError::QuotaUnderflow { .. }) => "underflow",
        Err(DomainError::UnlimitedQuota { .. }) => "unlimited",
        Err(DomainError::NotFound { .. }) => "not_found",
        Err(DomainError::Conflict { .. }) => "conflict",
        Err(_) => "error",
    }
}
