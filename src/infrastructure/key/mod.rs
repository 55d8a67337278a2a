//! Key storage adapters

mod in_memory;
mod postgres;

pub use in_memory::InMemoryKeyRepository;
pub use postgres::PostgresKeyRepository;
