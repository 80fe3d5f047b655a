//! Interactive chat REPL for reel.
//!
//! Provides a multi-turn conversation loop using [`rustyline`] for readline
//! support (history, line editing). Each line becomes one [`Session::send`]
//! call, so the model sees the whole conversation on every turn.

mod commands;

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

use crate::config::Config;
use crate::output::StdoutRenderer;
use crate::provider::ModelSelection;
use crate::session::Session;

/// Runs the interactive chat REPL.
///
/// # Readline behavior
///
/// - **Ctrl+C**: cancels current input, stays in REPL
/// - **Ctrl+D**: exits cleanly with "goodbye."
/// - Readline history is persisted to `~/.cache/reel/chat_history.txt`
pub async fn run_chat(mut session: Session, selection: &ModelSelection) -> Result<()> {
    let short = session.id().simple().to_string();
    println!(
        "{} [session: {}] [model: {}] (Ctrl+D to exit)",
        "reel chat".bold().cyan(),
        short[..8].yellow(),
        selection.model.yellow(),
    );
    println!();

    let mut rl = DefaultEditor::new()?;
    let history_path = Config::cache_dir()?.join(crate::constants::HISTORY_FILENAME);
    if history_path.exists() {
        if let Err(err) = rl.load_history(&history_path) {
            warn!(error = %err, "could not load readline history");
        }
    }

    loop {
        match rl.readline(&format!("{} ", ">".green().bold())) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                if line.starts_with('/') {
                    if let commands::CommandAction::Unknown(cmd) =
                        commands::handle_slash_command(line, &mut session)
                    {
                        println!("{} Unknown command: {}", "?".yellow(), cmd);
                    }
                    continue;
                }

                let _ = rl.add_history_entry(line);
                println!();

                let mut renderer = StdoutRenderer::new();
                if let Err(e) = session.send(line, &mut renderer).await {
                    if !renderer.reported_error() {
                        eprintln!("{} {}", "error:".red().bold(), e);
                    }
                }
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "goodbye.".dimmed());
                break;
            }
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                break;
            }
        }
    }

    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if let Err(err) = rl.save_history(&history_path) {
        warn!(error = %err, "could not save readline history");
    }

    Ok(())
}
