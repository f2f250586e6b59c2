use clap::Parser;
use record_lookup_gateway::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Lookup(args) => cli::lookup::run(args).await,
    }
}
