//! CLI command definitions and handlers.

mod commands;
mod run;

pub use commands::{Cli, Commands};
pub use run::{plan_document, run_document};
