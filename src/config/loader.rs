//! File loading and merging for reel configuration.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::types::{default_model, AgentConfig, Config, ProviderConfig, ProviderEntry, TmdbConfig};

impl Config {
    /// Loads the global config from `~/.config/reel/config.toml`.
    ///
    /// If no config file exists, creates one with sensible defaults
    /// (including `{env:VAR}` placeholders for API keys) and returns it.
    pub(super) fn load_global() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            let default_toml = Self::default_toml();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &default_toml)
                .with_context(|| format!("Failed to write default config to {:?}", path))?;
            let config: Config = toml::from_str(&default_toml)
                .with_context(|| "Failed to parse default config".to_string())?;
            return Ok(config);
        }
        Self::load_file(&path)
    }

    /// Look for reel.toml in current dir, then walk up to git root.
    pub(super) fn load_project() -> Result<Option<Config>> {
        let mut dir = std::env::current_dir()?;
        loop {
            let candidate = dir.join(crate::constants::PROJECT_CONFIG_FILENAME);
            if candidate.exists() {
                return Self::load_file(&candidate).map(Some);
            }
            // Stop at git root or filesystem root
            if dir.join(".git").exists() || !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config at {:?}", path))
    }

    pub(super) fn default_toml() -> String {
        format!(
            r#"model = "{}"
default_provider = "{}"

[provider]

[provider.openai]
api_key = "{{env:OPENAI_API_KEY}}"

[provider.anthropic]
api_key = "{{env:ANTHROPIC_API_KEY}}"

[provider.openrouter]
api_key = "{{env:OPENROUTER_API_KEY}}"

[provider.ollama]
base_url = "http://localhost:11434"

[agent]
max_tool_rounds = {}
temperature = {}
max_tokens = {}

[tmdb]
api_key = "{{env:TMDB_API_KEY}}"
"#,
            default_model(),
            crate::constants::DEFAULT_PROVIDER,
            crate::constants::MAX_TOOL_ROUNDS_DEFAULT,
            crate::constants::TEMPERATURE_DEFAULT,
            crate::constants::MAX_TOKENS_DEFAULT,
        )
    }

    /// Merge project config over global config.
    /// Project values win when present.
    pub(super) fn merge(global: Config, project: Config) -> Config {
        Config {
            model: if project.model != default_model() {
                project.model
            } else {
                global.model
            },
            provider: ProviderConfig {
                openai: merge_entry(project.provider.openai, global.provider.openai),
                anthropic: merge_entry(project.provider.anthropic, global.provider.anthropic),
                ollama: merge_entry(project.provider.ollama, global.provider.ollama),
                openrouter: merge_entry(project.provider.openrouter, global.provider.openrouter),
            },
            system_prompt: project.system_prompt.or(global.system_prompt),
            default_provider: project.default_provider.or(global.default_provider),
            agent: AgentConfig {
                max_tool_rounds: project.agent.max_tool_rounds.or(global.agent.max_tool_rounds),
                request_timeout_secs: project
                    .agent
                    .request_timeout_secs
                    .or(global.agent.request_timeout_secs),
                tool_timeout_secs: project
                    .agent
                    .tool_timeout_secs
                    .or(global.agent.tool_timeout_secs),
                stream_idle_timeout_secs: project
                    .agent
                    .stream_idle_timeout_secs
                    .or(global.agent.stream_idle_timeout_secs),
                temperature: project.agent.temperature.or(global.agent.temperature),
                max_tokens: project.agent.max_tokens.or(global.agent.max_tokens),
                decision_model: project.agent.decision_model.or(global.agent.decision_model),
            },
            tmdb: TmdbConfig {
                api_key: project.tmdb.api_key.or(global.tmdb.api_key),
                base_url: project.tmdb.base_url.or(global.tmdb.base_url),
            },
        }
    }
}

/// Field-wise merge of one provider entry; project fields win.
fn merge_entry(project: Option<ProviderEntry>, global: Option<ProviderEntry>) -> Option<ProviderEntry> {
    match (project, global) {
        (Some(p), Some(g)) => Some(ProviderEntry {
            api_key: p.api_key.or(g.api_key),
            base_url: p.base_url.or(g.base_url),
        }),
        (p, g) => p.or(g),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_parses() {
        let config: Config = toml::from_str(&Config::default_toml()).unwrap();
        assert_eq!(config.model, default_model());
        assert_eq!(config.default_provider.as_deref(), Some("openai"));
        assert_eq!(config.agent.max_tool_rounds, Some(8));
        assert!(config.provider.ollama.is_some());
    }

    #[test]
    fn project_values_win() {
        let global: Config = toml::from_str(
            r#"
model = "gpt-4o-mini"
[provider.openai]
api_key = "global-key"
base_url = "https://proxy.example"
[agent]
max_tool_rounds = 3
tool_timeout_secs = 9
"#,
        )
        .unwrap();
        let project: Config = toml::from_str(
            r#"
[provider.openai]
api_key = "project-key"
[agent]
max_tool_rounds = 5
decision_model = "gpt-4"
"#,
        )
        .unwrap();

        let merged = Config::merge(global, project);
        assert_eq!(merged.model, "gpt-4o-mini");
        let openai = merged.provider.openai.as_ref().unwrap();
        assert_eq!(openai.api_key.as_deref(), Some("project-key"));
        assert_eq!(openai.base_url.as_deref(), Some("https://proxy.example"));
        assert_eq!(merged.agent.max_tool_rounds, Some(5));
        assert_eq!(merged.agent.tool_timeout_secs, Some(9));
        assert_eq!(merged.decision_model(), Some("gpt-4"));
    }
}
