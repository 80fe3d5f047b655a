//! Output rendering abstraction for reel.
//!
//! Defines the [`Renderer`] trait, the sink that receives a turn's tool
//! activity and streamed answer. [`StdoutRenderer`] prints to the terminal.

use colored::Colorize;
use std::io::{self, Write};

/// Receives the visible parts of a turn, in order.
///
/// For one answer, `render_token` is called once per fragment, followed by
/// exactly one of `render_done` or `render_error`.
pub trait Renderer {
    /// Render a single fragment as it arrives.
    fn render_token(&mut self, token: &str);

    /// Called when the full response is complete.
    fn render_done(&mut self);

    /// Called when an error occurs during streaming.
    fn render_error(&mut self, err: &str);

    /// Called before a tool runs.
    fn tool_start(&mut self, _name: &str, _args: &str) {}

    /// Called after a tool finishes, with its output or error text.
    fn tool_result(&mut self, _name: &str, _result: &str, _is_error: bool) {}
}

/// Renders streaming LLM output directly to stdout.
///
/// Each fragment is printed immediately with an explicit flush so the user
/// sees a "typing" effect.
pub struct StdoutRenderer {
    fragment_count: usize,
    reported_error: bool,
}

impl StdoutRenderer {
    pub fn new() -> Self {
        Self {
            fragment_count: 0,
            reported_error: false,
        }
    }

    /// Whether `render_error` has already shown a failure to the user.
    pub fn reported_error(&self) -> bool {
        self.reported_error
    }
}

/// Shortens tool output to a single dimmed preview line.
fn preview(text: &str) -> String {
    const MAX: usize = 80;
    let first = text.lines().next().unwrap_or_default();
    if first.chars().count() > MAX || text.lines().nth(1).is_some() {
        let cut: String = first.chars().take(MAX).collect();
        format!("{}…", cut)
    } else {
        first.to_string()
    }
}

impl Renderer for StdoutRenderer {
    fn render_token(&mut self, token: &str) {
        print!("{}", token);
        io::stdout().flush().ok();
        self.fragment_count += 1;
    }

    fn render_done(&mut self) {
        println!();
        if self.fragment_count == 0 {
            println!("{}", "(no answer)".dimmed());
        }
        self.fragment_count = 0;
    }

    fn render_error(&mut self, err: &str) {
        eprintln!();
        eprintln!("{} {}", "error:".red().bold(), err);
        self.fragment_count = 0;
        self.reported_error = true;
    }

    fn tool_start(&mut self, name: &str, args: &str) {
        println!("{} {} {}", "⚙".yellow(), name.yellow().bold(), args.dimmed());
    }

    fn tool_result(&mut self, name: &str, result: &str, is_error: bool) {
        if is_error {
            println!("  {} {}: {}", "✗".red(), name, preview(result).red());
        } else {
            println!("  {} {}", "✓".green(), preview(result).dimmed());
        }
    }
}
