//! Root credential infrastructure
//!
//! Secret hashing, root key generation, credential stores and the resolver
//! that authenticates bearer secrets.

mod generator;
mod in_memory;
mod postgres;
mod resolver;

pub use generator::{hash_secret, secret_prefix, GeneratedRootKey, RootKeyGenerator};
pub use in_memory::InMemoryRootKeyRepository;
pub use postgres::PostgresRootKeyRepository;
pub use resolver::CredentialResolver;
