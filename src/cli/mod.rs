//! CLI module for the key quota service
//!
//! - `serve`: run the HTTP API
//! - `migrate`: apply PostgreSQL migrations
//! - `hash-secret`: print the stored digest of a secret
//! - `create-root-key`: issue a root key for a workspace

pub mod admin;
pub mod serve;

use clap::{Parser, Subcommand};

/// Key quota service - mutate the remaining-usage counter of API keys
#[derive(Parser)]
#[command(name = "key-quota")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Apply pending storage migrations
    Migrate,

    /// Print the digest stored for a secret
    HashSecret {
        /// Secret to hash
        secret: String,
    },

    /// Issue a root key; the secret is printed once
    CreateRootKey(admin::CreateRootKeyArgs),
}
