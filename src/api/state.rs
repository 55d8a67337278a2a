//! Application state for shared services

use std::sync::Arc;

use crate::domain::{DomainError, KeyId, KeyRepository, QuotaOperation, QuotaUpdate, WorkspaceId};
use crate::infrastructure::credential::CredentialResolver;
use crate::infrastructure::quota::QuotaService;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub quota_service: Arc<dyn QuotaServiceTrait>,
    pub credential_resolver: Arc<CredentialResolver>,
    /// Probed by the readiness check
    pub key_repository: Arc<dyn KeyRepository>,
}

impl AppState {
    pub fn new(
        quota_service: Arc<dyn QuotaServiceTrait>,
        credential_resolver: Arc<CredentialResolver>,
        key_repository: Arc<dyn KeyRepository>,
    ) -> Self {
        Self {
            quota_service,
            credential_resolver,
            key_repository,
        }
    }
}

/// Trait for quota service operations
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait QuotaServiceTrait: Send + Sync {
    async fn apply(
        &self,
        workspace_id: &WorkspaceId,
        key_id: &KeyId,
        operation: QuotaOperation,
    ) -> Result<QuotaUpdate, DomainError>;
}

#[async_trait::async_trait]
impl QuotaServiceTrait for QuotaService {
    async fn apply(
        &self,
        workspace_id: &WorkspaceId,
        key_id: &KeyId,
        operation: QuotaOperation,
    ) -> Result<QuotaUpdate, DomainError> {
        QuotaService::apply(self, workspace_id, key_id, operation).await
    }
}
