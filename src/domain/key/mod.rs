//! Key domain
//!
//! Issued API keys and the storage contract for their remaining-usage
//! counter.

mod entity;
mod repository;
mod validation;

pub use entity::{Key, KeyAuthId, KeyId};
#[cfg(test)]
pub use repository::MockKeyRepository;
pub use repository::KeyRepository;
pub use validation::{validate_key_id, KeyIdValidationError};
