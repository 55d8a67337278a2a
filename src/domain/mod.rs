//! Domain layer - Core business logic and entities

pub mod error;
pub mod key;
pub mod permission;
pub mod quota;
pub mod root_key;
pub mod workspace;

pub use error::DomainError;
pub use key::{Key, KeyAuthId, KeyId, KeyRepository};
pub use permission::{evaluate, Capability, PermissionDecision};
pub use quota::{QuotaOperation, QuotaUpdate, UnlimitedPolicy};
pub use root_key::{RootKey, RootKeyId, RootKeyRepository, RootKeyStatus};
pub use workspace::WorkspaceId;
