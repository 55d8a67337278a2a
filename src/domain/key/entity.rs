//! Key entity and identifiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_key_id, KeyIdValidationError};
use crate::domain::workspace::WorkspaceId;

/// Key identifier - alphanumeric, '_' and '-', max 255 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyId(String);

impl KeyId {
    /// Create a new KeyId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, KeyIdValidationError> {
        let id = id.into();
        validate_key_id(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for KeyId {
    type Error = KeyIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<KeyId> for String {
    fn from(id: KeyId) -> Self {
        id.0
    }
}

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the keyspace (auth realm) a key belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyAuthId(String);

impl KeyAuthId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An issued API key.
///
/// Only the digest of the secret is held. `remaining` is `None` for keys with
/// unlimited usage and is never negative when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Key {
    id: KeyId,
    key_auth_id: KeyAuthId,
    workspace_id: WorkspaceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    /// First characters of the secret, for display
    start: String,
    hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Key {
    /// Create a new key with unlimited remaining usage
    pub fn new(
        id: KeyId,
        key_auth_id: KeyAuthId,
        workspace_id: WorkspaceId,
        start: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            key_auth_id,
            workspace_id,
            name: None,
            start: start.into(),
            hash: hash.into(),
            remaining: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set a finite remaining counter; negative values are clamped to zero
    pub fn with_remaining(mut self, remaining: i64) -> Self {
        self.remaining = Some(remaining.max(0));
        self
    }

    pub(crate) fn with_timestamps(
        mut self,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    // Getters

    pub fn id(&self) -> &KeyId {
        &self.id
    }

    pub fn key_auth_id(&self) -> &KeyAuthId {
        &self.key_auth_id
    }

    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn remaining(&self) -> Option<i64> {
        self.remaining
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_unlimited(&self) -> bool {
        self.remaining.is_none()
    }

    /// Whether the key is visible to credentials of the given workspace
    pub fn belongs_to(&self, workspace_id: &WorkspaceId) -> bool {
        &self.workspace_id == workspace_id
    }

    // Storage-layer mutators. Callers outside a repository go through the
    // quota service.

    pub(crate) fn store_remaining(&mut self, remaining: Option<i64>) {
        self.remaining = remaining;
        self.updated_at = Utc::now();
    }
}
