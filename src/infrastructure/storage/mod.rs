//! Storage infrastructure - backend selection, pooling and migrations

mod factory;
pub mod migrations;
mod postgres;

pub use factory::{StorageBackends, StorageConfig, StorageFactory};
pub use migrations::{run_storage_migrations, Migration, PostgresMigrator};
pub use postgres::{classify_sqlx_error, connect_pool, PostgresConfig};
