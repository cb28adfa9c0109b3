//! CLI command definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Reel - turn research documents into narrated explainer videos
#[derive(Parser, Debug)]
#[command(name = "reel")]
#[command(about = "Turn research documents into narrated explainer videos", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file layered over the defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan and generate the full video
    Run(RunArgs),

    /// Plan only and print the scene plans as JSON
    Plan(RunArgs),
}

/// Options shared by `run` and `plan`
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Source document (PDF, markdown or text; path or URL)
    #[arg(long)]
    pub document: String,

    /// Root of the per-document working directories
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Existing scene plan to use instead of decomposing the document
    #[arg(long)]
    pub high_plan: Option<PathBuf>,

    /// Accept first drafts without evaluator feedback
    #[arg(long)]
    pub no_reflection: bool,

    /// Do not append worked examples to prompts
    #[arg(long)]
    pub no_examples: bool,

    /// Seed for retry jitter and example order
    #[arg(long)]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_flags_parse() {
        let cli = Cli::parse_from([
            "reel",
            "-v",
            "run",
            "--document",
            "paper.pdf",
            "--no-examples",
            "--seed",
            "42",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.document, "paper.pdf");
                assert!(args.no_examples);
                assert!(!args.no_reflection);
                assert_eq!(args.seed, Some(42));
            }
            Commands::Plan(_) => panic!("expected run"),
        }
    }
}
