//! Centralized constants for reel.
//!
//! All magic numbers, default strings, and configuration constants live here
//! so they can be changed in one place.

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "reel";

/// Default LLM model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default system prompt prepended to every session.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a movie guide bot. For each query, decide whether to use your knowledge base or fetch context using specific methods. Follow these guidelines:

1. Use Knowledge Base for:
   - General movie facts, trivia, recommendations, and summaries.
   - Known information on actors, genres, awards, or classic films.

2. Fetch Context with:
   - get_now_playing_movies(): For currently showing films.
   - get_showtimes(): For movie times at specific locations.
   - buy_ticket(): To assist with ticket purchases.
   - get_reviews(): For recent reviews or audience reactions.
   - confirm_ticket_purchase(): Confirm with the user, before making the purchase of the ticket.

3. Interaction: Be clear and concise. Ask for clarification if needed. Keep a friendly and helpful tone.
";

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Per-project configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = "reel.toml";

/// Readline history filename.
pub const HISTORY_FILENAME: &str = "chat_history.txt";

/// Log filename, written under the cache directory.
pub const LOG_FILENAME: &str = "reel.log";

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV_VAR: &str = "REEL_LOG";

// --- Provider defaults ---

/// Default provider when none is configured.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Default LLM model identifier for Anthropic.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5";

/// Default LLM model identifier for OpenRouter.
pub const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4o";

/// Default base URL for local Ollama server.
pub const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default LLM model identifier for Ollama.
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3.1";

// --- Dispatch loop defaults ---

/// Tool rounds allowed per turn before a direct answer is forced.
pub const MAX_TOOL_ROUNDS_DEFAULT: usize = 8;

/// Seconds to wait for a single decision round-trip.
pub const REQUEST_TIMEOUT_SECS_DEFAULT: u64 = 60;

/// Seconds a single tool handler may run.
pub const TOOL_TIMEOUT_SECS_DEFAULT: u64 = 30;

/// Seconds to wait between two answer fragments.
pub const STREAM_IDLE_TIMEOUT_SECS_DEFAULT: u64 = 60;

/// Sampling temperature for completions.
pub const TEMPERATURE_DEFAULT: f64 = 0.2;

/// Maximum tokens for LLM completions.
pub const MAX_TOKENS_DEFAULT: u64 = 500;

/// System note appended when the round ceiling cuts the tool loop short.
pub const ROUND_LIMIT_NOTE: &str = "Tool call limit reached for this turn. \
Answer the user directly with the information gathered so far.";

// --- TMDB ---

/// Default base URL of the TMDB v3 API.
pub const TMDB_DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Maximum number of reviews returned by the reviews tool.
pub const TMDB_MAX_REVIEWS: usize = 5;

/// Maximum characters kept from a single review.
pub const TMDB_REVIEW_MAX_CHARS: usize = 600;
