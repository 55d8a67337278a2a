use clap::Parser;
use key_quota::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Migrate => cli::admin::migrate().await,
        Command::HashSecret { secret } => {
            cli::admin::hash_secret_command(&secret);
            Ok(())
        }
        Command::CreateRootKey(args) => cli::admin::create_root_key(args).await,
    }
}
