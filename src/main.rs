use clap::Parser;
use kb_retrieval::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    cli::commands::run(cli).await
}
