//! Root credential domain

mod entity;
mod repository;

pub use entity::{RootKey, RootKeyId, RootKeyStatus};
#[cfg(test)]
pub use repository::MockRootKeyRepository;
pub use repository::RootKeyRepository;
