//! Quota domain
//!
//! The closed set of counter operations, their validation, and the result of
//! applying one to a key.

mod operation;
mod policy;

use serde::Serialize;

pub use operation::{apply_delta, QuotaOperation};
pub use policy::UnlimitedPolicy;

use crate::domain::key::KeyId;

/// The key's counter after a successful mutation; `None` means unlimited
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaUpdate {
    pub key_id: KeyId,
    pub remaining: Option<i64>,
}
