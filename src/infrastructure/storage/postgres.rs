//! PostgreSQL connection pooling and error classification

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::domain::DomainError;

const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection acquire timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

/// Open a bounded connection pool.
///
/// The acquire timeout bounds how long any storage call can wait for a
/// connection.
pub async fn connect_pool(config: &PostgresConfig) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))
}

/// Map a sqlx error to the domain taxonomy
pub fn classify_sqlx_error(context: &str, err: sqlx::Error) -> DomainError {
    let code = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned());

    match code.as_deref() {
        Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
            DomainError::conflict(format!("{}: concurrent modification: {}", context, err))
        }
        Some(NUMERIC_VALUE_OUT_OF_RANGE) => {
            DomainError::validation("value", "remaining would overflow")
        }
        Some(UNIQUE_VIOLATION) => DomainError::conflict(format!("{}: already exists", context)),
        _ => DomainError::storage(format!("{}: {}", context, err)),
    }
}
