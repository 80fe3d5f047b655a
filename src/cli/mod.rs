//! Command-line interface definition and dispatch for reel.
//!
//! Uses [`clap`] for argument parsing with derive macros. Each subcommand is
//! routed to its handler; the interactive loop lives in [`crate::chat`].

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::{chat, config::Config, output, provider, session::Session, tools::ToolRegistry};

/// Top-level CLI structure for reel.
#[derive(Parser)]
#[command(name = "reel", about = "Ask about movies, showtimes, reviews and tickets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the reel CLI.
///
/// The `///` doc comments on variants double as `--help` text rendered by clap.
#[derive(Subcommand)]
pub enum Commands {
    /// Ask a one-shot question
    Ask {
        /// The question to ask
        prompt: Vec<String>,
        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
        /// Provider to use (anthropic, openai, openrouter, ollama)
        #[arg(short, long)]
        provider: Option<String>,
    },
    /// Start an interactive chat session
    Chat {
        /// Provider to use (anthropic, openai, openrouter, ollama)
        #[arg(long)]
        provider: Option<String>,
        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
    },
    /// List the tools the assistant can call
    Tools,
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Subcommands for the `config` command.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current config
    Show,
}

/// Parses command-line arguments into a [`Cli`] struct.
///
/// Delegates to [`clap::Parser::parse`], which exits the process on invalid input.
pub fn parse() -> Cli {
    Cli::parse()
}

/// Dispatches the parsed CLI command to its handler.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ask {
            prompt,
            model,
            provider: provider_name,
        } => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                anyhow::bail!("No prompt provided. Usage: reel ask \"what's playing?\"");
            }

            let config = Config::load()?;
            let selection =
                provider::resolve_model(provider_name.as_deref(), model.as_deref(), &config)?;

            println!(
                "{} [model: {}]",
                "reel".bold().cyan(),
                selection.model.yellow(),
            );
            println!();
            println!("{} {}", ">".green().bold(), prompt);
            println!();

            let mut session = open_session(&config, &selection)?;
            let mut renderer = output::StdoutRenderer::new();
            let outcome = session.send(&prompt, &mut renderer).await?;

            println!();
            println!("{}", format!("Tool rounds: {}", outcome.rounds).dimmed());
            Ok(())
        }
        Commands::Chat {
            provider: provider_name,
            model,
        } => {
            let config = Config::load()?;
            let selection =
                provider::resolve_model(provider_name.as_deref(), model.as_deref(), &config)?;
            let session = open_session(&config, &selection)?;
            chat::run_chat(session, &selection).await
        }
        Commands::Tools => {
            let config = Config::load()?;
            let registry = ToolRegistry::with_builtins(&config.tmdb)?;
            for declaration in registry.declarations() {
                let params: Vec<&str> = declaration.parameters.iter().map(|p| p.name).collect();
                println!(
                    "{}({})",
                    declaration.name.cyan().bold(),
                    params.join(", ")
                );
                println!("  {}", declaration.description.dimmed());
            }
            Ok(())
        }
        Commands::Config { action } => {
            let config = Config::load()?;
            match action {
                ConfigAction::Show => {
                    let path = Config::config_path()?;
                    println!("{} {}", "Config path:".bold(), path.display());
                    println!();
                    let toml_str = toml::to_string_pretty(&config)?;
                    println!("{}", toml_str);
                }
            }
            Ok(())
        }
    }
}

/// Wires the configured provider and the built-in tools into a new session.
fn open_session(config: &Config, selection: &provider::ModelSelection) -> Result<Session> {
    let service = provider::Provider::from_config(config, selection)?;
    let registry = ToolRegistry::with_builtins(&config.tmdb)?;
    Ok(Session::new(
        Arc::new(service),
        Arc::new(registry),
        config.agent_settings(),
        config.system_prompt.as_deref(),
    ))
}
