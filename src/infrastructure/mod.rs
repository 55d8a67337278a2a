//! Infrastructure layer - External service implementations

pub mod credential;
pub mod key;
pub mod logging;
pub mod observability;
pub mod quota;
pub mod storage;
