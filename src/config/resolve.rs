//! Environment variable substitution, API key resolution and agent limits.

use std::time::Duration;

use super::types::{Config, ProviderEntry};
use crate::agent::AgentSettings;
use crate::constants::{
    MAX_TOKENS_DEFAULT, MAX_TOOL_ROUNDS_DEFAULT, REQUEST_TIMEOUT_SECS_DEFAULT,
    STREAM_IDLE_TIMEOUT_SECS_DEFAULT, TEMPERATURE_DEFAULT, TOOL_TIMEOUT_SECS_DEFAULT,
};

impl Config {
    /// Resolve {env:VAR_NAME} patterns in string fields.
    pub(super) fn resolve_substitutions(&mut self) {
        self.model = resolve_str(&self.model);
        if let Some(ref mut sp) = self.system_prompt {
            *sp = resolve_str(sp);
        }
        if let Some(ref mut dp) = self.default_provider {
            *dp = resolve_str(dp);
        }
        resolve_provider_entry(&mut self.provider.openai);
        resolve_provider_entry(&mut self.provider.anthropic);
        resolve_provider_entry(&mut self.provider.ollama);
        resolve_provider_entry(&mut self.provider.openrouter);
        if let Some(ref mut key) = self.tmdb.api_key {
            *key = resolve_str(key);
        }
        if let Some(ref mut url) = self.tmdb.base_url {
            *url = resolve_str(url);
        }
    }

    /// Resolve API key for a provider: env var first, then config value.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        let env_key = format!("{}_API_KEY", provider.to_uppercase());
        if let Ok(val) = std::env::var(&env_key) {
            if !val.is_empty() {
                return Some(val);
            }
        }

        self.provider_entry(provider)
            .and_then(|e| e.api_key.clone())
            .filter(|k| !k.is_empty())
    }

    /// Configured base URL override for a provider.
    pub fn provider_base_url(&self, provider: &str) -> Option<&str> {
        self.provider_entry(provider)
            .and_then(|e| e.base_url.as_deref())
            .filter(|u| !u.is_empty())
    }

    fn provider_entry(&self, provider: &str) -> Option<&ProviderEntry> {
        match provider {
            "openai" => self.provider.openai.as_ref(),
            "anthropic" => self.provider.anthropic.as_ref(),
            "ollama" => self.provider.ollama.as_ref(),
            "openrouter" => self.provider.openrouter.as_ref(),
            _ => None,
        }
    }

    /// Get the configured default provider name, if any.
    pub fn provider_name(&self) -> Option<&str> {
        self.default_provider.as_deref()
    }

    /// Get the model name from config, stripping provider prefix if present.
    /// Returns None if the model is the compile-time default (meaning user hasn't configured it).
    pub fn model_name(&self) -> Option<String> {
        let m = &self.model;
        if m == crate::constants::DEFAULT_MODEL {
            return None;
        }
        if let Some((_prov, model)) = m.split_once('/') {
            Some(model.to_string())
        } else {
            Some(m.to_string())
        }
    }

    /// Model override for tool decisions, if configured.
    pub fn decision_model(&self) -> Option<&str> {
        self.agent.decision_model.as_deref().filter(|m| !m.is_empty())
    }

    /// Sampling temperature for completions.
    pub fn temperature(&self) -> f64 {
        self.agent.temperature.unwrap_or(TEMPERATURE_DEFAULT)
    }

    /// Completion token cap.
    pub fn max_tokens(&self) -> u64 {
        self.agent.max_tokens.unwrap_or(MAX_TOKENS_DEFAULT)
    }

    /// Dispatch loop limits with defaults filled in.
    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            max_tool_rounds: self.agent.max_tool_rounds.unwrap_or(MAX_TOOL_ROUNDS_DEFAULT),
            request_timeout: Duration::from_secs(
                self.agent
                    .request_timeout_secs
                    .unwrap_or(REQUEST_TIMEOUT_SECS_DEFAULT),
            ),
            tool_timeout: Duration::from_secs(
                self.agent.tool_timeout_secs.unwrap_or(TOOL_TIMEOUT_SECS_DEFAULT),
            ),
            stream_idle_timeout: Duration::from_secs(
                self.agent
                    .stream_idle_timeout_secs
                    .unwrap_or(STREAM_IDLE_TIMEOUT_SECS_DEFAULT),
            ),
        }
    }
}

/// Resolves `{env:VAR}` patterns in a single provider entry's `api_key` and `base_url`.
fn resolve_provider_entry(entry: &mut Option<ProviderEntry>) {
    if let Some(ref mut e) = entry {
        if let Some(ref mut key) = e.api_key {
            *key = resolve_str(key);
        }
        if let Some(ref mut url) = e.base_url {
            *url = resolve_str(url);
        }
    }
}

/// Replace {env:VAR} with the environment variable value. Unset variables become empty.
fn resolve_str(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("{env:") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 5..start + len];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}
