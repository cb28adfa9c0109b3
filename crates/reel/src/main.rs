//! Reel CLI binary.
//!
//! - `reel run` turns a document into a narrated video
//! - `reel plan` stops after planning and prints the scene plans

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use cli::{Cli, Commands, plan_document, run_document};

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run(args) => run_document(&cli, args).await?,
        Commands::Plan(args) => plan_document(&cli, args).await?,
    }

    Ok(())
}
