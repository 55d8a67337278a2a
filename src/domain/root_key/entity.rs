//! Root credential entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::workspace::WorkspaceId;

/// Root credential identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RootKeyId(String);

impl RootKeyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id with the `root_` prefix
    pub fn generate() -> Self {
        Self(format!("root_{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RootKeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a root credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RootKeyStatus {
    #[default]
    Active,
    Revoked,
}

impl RootKeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revoked => "revoked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "revoked" => Some(Self::Revoked),
            _ => None,
        }
    }
}

/// A privileged credential used to manage keys of its workspace.
///
/// The scope set is a snapshot: it is read once per request and never
/// mutated while the request is being evaluated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootKey {
    id: RootKeyId,
    workspace_id: WorkspaceId,
    name: String,
    /// Digest of the secret, format `sha256$<base64url>`
    hash: String,
    /// First characters of the secret, for log correlation
    prefix: String,
    scopes: Vec<String>,
    status: RootKeyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl RootKey {
    pub fn new(
        id: RootKeyId,
        workspace_id: WorkspaceId,
        name: impl Into<String>,
        hash: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            id,
            workspace_id,
            name: name.into(),
            hash: hash.into(),
            prefix: prefix.into(),
            scopes: Vec::new(),
            status: RootKeyStatus::Active,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_scopes(mut self, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_status(mut self, status: RootKeyStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_expiration(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub(crate) fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> &RootKeyId {
        &self.id
    }

    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn status(&self) -> RootKeyStatus {
        self.status
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| Utc::now() >= expires_at)
    }

    /// Check if the credential may authenticate a request
    pub fn is_valid(&self) -> bool {
        self.status == RootKeyStatus::Active && !self.is_expired()
    }
}
