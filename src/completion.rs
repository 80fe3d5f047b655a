//! The completion service contract consumed by the dispatch loop.
//!
//! [`CompletionService`] is the seam between reel's orchestration and any
//! concrete LLM backend. [`Provider`](crate::provider::Provider) implements
//! it over rig-core; tests implement it with scripted responses.

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::message::Message;
use crate::tools::ToolDeclaration;

/// Incremental answer text. Ends when the service signals end of stream.
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// A tool invocation requested by the model, before argument parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallDirective {
    /// Name of the tool to invoke, as the model spelled it.
    pub name: String,
    /// Raw JSON text of the arguments object.
    pub arguments_json: String,
}

impl ToolCallDirective {
    pub fn new(name: impl Into<String>, arguments_json: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments_json: arguments_json.into(),
        }
    }
}

/// What the model wants to do after seeing the conversation so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Run a tool and show the model its output.
    ToolCall(ToolCallDirective),
    /// Answer the user directly.
    Respond,
}

/// A language-model backend able to pick tools and stream answers.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Asks the model whether a tool should run, in automatic tool-choice mode.
    async fn decide(&self, messages: &[Message], tools: &[ToolDeclaration]) -> Result<Decision>;

    /// Opens a stream for the final answer. No tool declarations are attached.
    async fn stream_answer(&self, messages: &[Message]) -> Result<FragmentStream>;
}
