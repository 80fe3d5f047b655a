//! LLM provider client and the [`CompletionService`] implementation.
//!
//! Contains the [`Provider`] struct which wraps rig-core provider clients
//! behind enum dispatch, keeping provider-specific details out of the
//! dispatch loop. Supports Anthropic, OpenAI, OpenRouter, and Ollama.
//!
//! rig-core is only asked for single completions: one non-streaming call per
//! tool decision and one streaming call for the answer. reel drives the loop.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use rig::agent::MultiTurnStreamItem;
use rig::client::CompletionClient;
use rig::completion::{Completion, ToolDefinition as RigToolDefinition};
use rig::message::{AssistantContent, Message as RigMessage, Text, ToolCall, ToolChoice};
use rig::providers::{anthropic, openai, openrouter};
use rig::streaming::{StreamedAssistantContent, StreamingChat};
use serde_json::Value;
use tracing::debug;

use super::kind::ProviderKind;
use super::resolve::ModelSelection;
use crate::completion::{CompletionService, Decision, FragmentStream, ToolCallDirective};
use crate::config::Config;
use crate::message::{Message, Role};
use crate::tools::ToolDeclaration;

/// Internal enum wrapping provider-specific clients.
enum ClientKind {
    Anthropic(anthropic::Client),
    OpenAI(openai::Client),
    OpenRouter(openrouter::Client),
    Ollama(openai::Client),
}

/// A configured LLM provider ready to handle completion requests.
///
/// Agents are constructed on each call since they are cheap to create and
/// the preamble comes from the conversation itself.
pub struct Provider {
    client: ClientKind,
    model: String,
    /// Model used by `decide`; the answer always streams from `model`.
    decision_model: String,
    temperature: f64,
    max_tokens: u64,
}

/// Builds an agent from the given client, model, and optional system prompt,
/// then executes the provided block with the agent bound to `$agent`.
macro_rules! with_agent {
    ($client:expr, $provider:expr, $model:expr, $sys:expr, |$agent:ident| $body:expr) => {{
        let builder = $client
            .agent($model)
            .temperature($provider.temperature)
            .max_tokens($provider.max_tokens);
        let $agent = if let Some(sys) = $sys {
            builder.preamble(sys).build()
        } else {
            builder.build()
        };
        $body
    }};
}

/// Dispatches an operation across provider-specific clients.
///
/// Matches on [`ClientKind`] and executes the same block for each variant,
/// letting the compiler monomorphize per provider.
macro_rules! dispatch {
    ($self:expr, |$client:ident| $body:expr) => {
        match &$self.client {
            ClientKind::Anthropic($client) => $body,
            ClientKind::OpenAI($client) => $body,
            ClientKind::OpenRouter($client) => $body,
            ClientKind::Ollama($client) => $body,
        }
    };
}

/// Reduces a multi-turn stream to its answer text fragments.
///
/// Tool calls and reasoning items never appear here because the answer agent
/// has no tools; they are dropped if a provider sends them anyway.
macro_rules! text_fragments {
    ($stream:expr) => {
        $stream
            .filter_map(|chunk| async move {
                match chunk {
                    Ok(MultiTurnStreamItem::StreamAssistantItem(
                        StreamedAssistantContent::Text(Text { text }),
                    )) => Some(Ok(text)),
                    Ok(_) => None,
                    Err(err) => Some(Err(anyhow::anyhow!("Streaming error: {}", err))),
                }
            })
            .boxed()
    };
}

impl Provider {
    /// Creates a new [`Provider`] from the loaded application config.
    ///
    /// Resolves the API key through reel's config precedence chain
    /// (env var → config file → substitution) and builds the appropriate
    /// provider client.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is found for the selected provider
    /// or if client construction fails.
    pub fn from_config(config: &Config, selection: &ModelSelection) -> Result<Self> {
        let client = match selection.provider {
            ProviderKind::Anthropic => {
                let api_key = config
                    .resolve_api_key("anthropic")
                    .context("No API key found for Anthropic. Set ANTHROPIC_API_KEY or configure it in config.toml")?;
                ClientKind::Anthropic(
                    anthropic::Client::new(&api_key).context("Failed to create Anthropic client")?,
                )
            }
            ProviderKind::OpenAI => {
                let api_key = config
                    .resolve_api_key("openai")
                    .context("No API key found for OpenAI. Set OPENAI_API_KEY or configure it in config.toml")?;
                ClientKind::OpenAI(
                    openai::Client::new(&api_key).context("Failed to create OpenAI client")?,
                )
            }
            ProviderKind::OpenRouter => {
                let api_key = config
                    .resolve_api_key("openrouter")
                    .context("No API key found for OpenRouter. Set OPENROUTER_API_KEY or configure it in config.toml")?;
                ClientKind::OpenRouter(
                    openrouter::Client::new(&api_key)
                        .context("Failed to create OpenRouter client")?,
                )
            }
            ProviderKind::Ollama => {
                let base_url = config
                    .provider_base_url("ollama")
                    .unwrap_or(crate::constants::OLLAMA_DEFAULT_BASE_URL);
                let client = openai::Client::builder()
                    .api_key("ollama")
                    .base_url(format!("{}/v1", base_url.trim_end_matches('/')))
                    .build()
                    .context("Failed to create Ollama client")?;
                ClientKind::Ollama(client)
            }
        };
        Ok(Self {
            client,
            model: selection.model.clone(),
            decision_model: config
                .decision_model()
                .unwrap_or(&selection.model)
                .to_string(),
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
        })
    }
}

#[async_trait]
impl CompletionService for Provider {
    async fn decide(&self, messages: &[Message], tools: &[ToolDeclaration]) -> Result<Decision> {
        let request = ChatRequest::from_history(messages);
        let definitions: Vec<RigToolDefinition> = tools.iter().map(to_rig_definition).collect();

        let choice = dispatch!(self, |client| {
            with_agent!(client, self, &self.decision_model, request.preamble.as_deref(), |agent| {
                agent
                    .completion(request.prompt.clone(), request.history.clone())
                    .await
                    .context("Failed to build completion request")?
                    .tools(definitions.clone())
                    .tool_choice(ToolChoice::Auto)
                    .send()
                    .await
                    .context("Completion request failed")?
                    .choice
            })
        });

        Ok(match first_tool_call(choice) {
            Some(call) => {
                debug!(tool = %call.function.name, "model requested a tool");
                Decision::ToolCall(ToolCallDirective::new(
                    call.function.name,
                    arguments_text(call.function.arguments),
                ))
            }
            None => Decision::Respond,
        })
    }

    async fn stream_answer(&self, messages: &[Message]) -> Result<FragmentStream> {
        let request = ChatRequest::from_history(messages);
        let fragments = dispatch!(self, |client| {
            let stream = with_agent!(client, self, &self.model, request.preamble.as_deref(), |agent| {
                agent
                    .stream_chat(request.prompt.clone(), request.history.clone())
                    .await
            });
            text_fragments!(stream)
        });
        Ok(fragments)
    }
}

/// Picks the first tool call of a response. reel runs one call per round, so
/// parallel calls beyond the first are logged and dropped.
fn first_tool_call(choice: impl IntoIterator<Item = AssistantContent>) -> Option<ToolCall> {
    let mut calls = choice.into_iter().filter_map(|content| match content {
        AssistantContent::ToolCall(call) => Some(call),
        _ => None,
    });
    let first = calls.next();
    let dropped: Vec<String> = calls.map(|c| c.function.name).collect();
    if !dropped.is_empty() {
        debug!(?dropped, "model sent parallel tool calls; running only the first");
    }
    first
}

/// Arguments as JSON text. Providers that already decoded them get re-encoded;
/// providers that pass a raw string through are returned verbatim so the
/// dispatch loop sees malformed payloads as they were.
fn arguments_text(arguments: Value) -> String {
    match arguments {
        Value::String(raw) => raw,
        other => other.to_string(),
    }
}

fn to_rig_definition(declaration: &ToolDeclaration) -> RigToolDefinition {
    RigToolDefinition {
        name: declaration.name.clone(),
        description: declaration.description.clone(),
        parameters: declaration.schema(),
    }
}

/// A conversation split the way rig-core agents take it.
struct ChatRequest {
    /// First system message, used as the agent preamble.
    preamble: Option<String>,
    /// Last remaining message.
    prompt: RigMessage,
    /// Everything in between.
    history: Vec<RigMessage>,
}

impl ChatRequest {
    fn from_history(messages: &[Message]) -> Self {
        let preamble_at = messages.iter().position(|m| m.role() == Role::System);
        let preamble = preamble_at.map(|i| messages[i].text().to_string());
        let mut history: Vec<RigMessage> = messages
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != preamble_at)
            .map(|(_, m)| convert_message_to_rig(m))
            .collect();
        let prompt = history.pop().unwrap_or_else(|| RigMessage::user(""));
        Self {
            preamble,
            prompt,
            history,
        }
    }
}

/// Converts a reel [`Message`] to a rig-core [`RigMessage`].
///
/// - **User** → user text
/// - **Assistant** → assistant text
/// - **Tool** → user text labelled with the tool name; reel does not keep
///   provider call ids, so results travel as plain context
/// - **System** (after the preamble) → user text prefixed `System note:`
fn convert_message_to_rig(msg: &Message) -> RigMessage {
    match msg.role() {
        Role::User => RigMessage::user(msg.text()),
        Role::Assistant => RigMessage::assistant(msg.text()),
        Role::Tool => RigMessage::user(tool_result_text(msg)),
        Role::System => RigMessage::user(format!("System note: {}", msg.text())),
    }
}

fn tool_result_text(msg: &Message) -> String {
    format!(
        "Result of function {}:\n{}",
        msg.tool_name().unwrap_or("unknown"),
        msg.text()
    )
}
