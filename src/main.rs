//! Entry point for reel, a terminal movie assistant that answers with
//! tool-backed facts.
//!
//! This binary loads environment variables, sets up file logging, parses CLI
//! arguments via [`cli`], and dispatches to the appropriate subcommand handler.

mod agent;
mod chat;
mod cli;
mod completion;
mod config;
mod constants;
mod error;
mod logging;
mod message;
mod output;
mod provider;
mod session;
mod streaming;
#[cfg(test)]
mod testing;
mod tools;

use anyhow::Result;
use colored::Colorize;

/// Runs the reel CLI.
///
/// Loads `.env` files (silently ignored if absent), installs the tracing
/// subscriber, parses command-line arguments into a [`cli::Cli`] struct, and
/// dispatches the chosen subcommand via [`cli::run`].
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    if let Err(err) = logging::init_logging() {
        eprintln!("{} logging disabled: {:#}", "warning:".yellow().bold(), err);
    }
    let cli = cli::parse();
    cli::run(cli).await
}
