use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Unauthorized: missing permission '{required}'")]
    Unauthorized { required: String },

    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Quota underflow: cannot decrement {requested} from {remaining}")]
    QuotaUnderflow { remaining: i64, requested: i64 },

    #[error("Key '{key_id}' has unlimited remaining usage")]
    UnlimitedQuota { key_id: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn unauthorized(required: impl Into<String>) -> Self {
        Self::Unauthorized {
            required: required.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn underflow(remaining: i64, requested: i64) -> Self {
        Self::QuotaUnderflow {
            remaining,
            requested,
        }
    }

    pub fn unlimited(key_id: impl Into<String>) -> Self {
        Self::UnlimitedQuota {
            key_id: key_id.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the failure is a transient concurrency conflict worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
