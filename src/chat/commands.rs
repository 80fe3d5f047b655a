//! Slash command handlers for the chat REPL.
//!
//! Dispatches `/history`, `/clear`, `/tools`, and `/help`. Returns a
//! [`CommandAction`] so the REPL loop can decide how to proceed.

use colored::Colorize;

use crate::message::{Message, Role};
use crate::session::Session;

/// Action returned by slash command handling.
pub(crate) enum CommandAction {
    /// Command was handled successfully; continue the REPL loop.
    Continue,
    /// Unknown command was entered.
    Unknown(String),
}

/// Dispatch and handle a slash command.
pub(crate) fn handle_slash_command(command: &str, session: &mut Session) -> CommandAction {
    match command {
        "/history" => {
            for msg in session.messages() {
                if msg.role() == Role::System {
                    continue;
                }
                println!("{}", format_message(msg));
                println!();
            }
            CommandAction::Continue
        }
        "/clear" => {
            session.clear();
            println!("{}", "History cleared.".dimmed());
            CommandAction::Continue
        }
        "/tools" => {
            for declaration in session.registry().declarations() {
                let params: Vec<&str> = declaration.parameters.iter().map(|p| p.name).collect();
                println!("  {}({})", declaration.name.cyan(), params.join(", "));
            }
            CommandAction::Continue
        }
        "/help" => {
            println!("{}", "Commands:".bold());
            println!("  {} - show conversation history", "/history".cyan());
            println!("  {} - clear conversation", "/clear".cyan());
            println!("  {} - list the tools reel can call", "/tools".cyan());
            println!("  {} - show this help", "/help".cyan());
            println!("  {} - exit", "Ctrl+D".cyan());
            CommandAction::Continue
        }
        _ => CommandAction::Unknown(command.to_string()),
    }
}

/// One history entry with a colored role label.
fn format_message(msg: &Message) -> String {
    match msg.role() {
        Role::User => format!("{} {}", msg.role().to_string().green().bold(), msg.text()),
        Role::Assistant => format!("{} {}", msg.role().to_string().cyan().bold(), msg.text()),
        Role::Tool => format!(
            "{} {}",
            format!("[{}]", msg.tool_name().unwrap_or("tool")).yellow(),
            msg.text().dimmed()
        ),
        Role::System => format!("{}", msg.text().dimmed()),
    }
}
