//! Struct definitions and serde defaults for reel configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for reel, deserialized from `config.toml`.
///
/// Fields use serde defaults so reel can run with sensible defaults
/// when no config file exists.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Default model identifier (e.g. `"gpt-4o"`).
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Default provider name (e.g., "openai", "anthropic").
    #[serde(default)]
    pub default_provider: Option<String>,
    /// System prompt that opens every session.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: Option<String>,
    /// Dispatch loop limits and sampling settings.
    #[serde(default)]
    pub agent: AgentConfig,
    /// TMDB access for the listing and review tools.
    #[serde(default)]
    pub tmdb: TmdbConfig,
}

/// Returns the default model identifier.
///
/// Used by serde's `#[serde(default)]` attribute during deserialization.
pub(super) fn default_model() -> String {
    crate::constants::DEFAULT_MODEL.to_string()
}

fn default_system_prompt() -> Option<String> {
    Some(crate::constants::DEFAULT_SYSTEM_PROMPT.to_string())
}

/// Provider-specific configuration map.
///
/// Each field corresponds to a supported LLM provider. Only providers
/// the user has configured will be `Some`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProviderConfig {
    pub openai: Option<ProviderEntry>,
    pub anthropic: Option<ProviderEntry>,
    pub ollama: Option<ProviderEntry>,
    pub openrouter: Option<ProviderEntry>,
}

/// Connection details for a single LLM provider.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProviderEntry {
    /// API key for authentication. Can also be set via environment variables.
    pub api_key: Option<String>,
    /// Custom base URL for the provider's API (useful for proxies or self-hosted instances).
    pub base_url: Option<String>,
}

/// Limits for a single turn of the dispatch loop.
///
/// Unset fields fall back to the constants in [`crate::constants`]; see the
/// accessor methods on [`Config`].
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct AgentConfig {
    /// Tool rounds allowed before a direct answer is forced.
    pub max_tool_rounds: Option<usize>,
    /// Seconds to wait for one decision round-trip.
    pub request_timeout_secs: Option<u64>,
    /// Seconds a single tool handler may run.
    pub tool_timeout_secs: Option<u64>,
    /// Seconds to wait between two streamed answer fragments.
    pub stream_idle_timeout_secs: Option<u64>,
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Completion token cap.
    pub max_tokens: Option<u64>,
    /// Model for tool decisions. Defaults to the answer model.
    pub decision_model: Option<String>,
}

/// TMDB API access.
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct TmdbConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl TmdbConfig {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(crate::constants::TMDB_DEFAULT_BASE_URL)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            provider: ProviderConfig::default(),
            default_provider: None,
            system_prompt: default_system_prompt(),
            agent: AgentConfig::default(),
            tmdb: TmdbConfig::default(),
        }
    }
}
