pub mod invoker;
pub mod movies;

use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::TmdbConfig;
use crate::message::Message;

pub use invoker::{ToolInvocationRequest, ToolInvoker};

/// Named arguments handed to a tool, already filtered to its declared parameters.
pub type Arguments = Map<String, Value>;

/// One declared parameter of a tool. All parameters are strings.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Parameter {
    pub name: &'static str,
    pub description: &'static str,
}

/// Definition sent to the LLM so it knows what tools are available.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
}

impl ToolDeclaration {
    /// JSON Schema for the parameters, in the shape function-calling APIs expect.
    pub fn schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.to_string(),
                    json!({ "type": "string", "description": p.description }),
                )
            })
            .collect();
        let required: Vec<&str> = self.parameters.iter().map(|p| p.name).collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// The outcome of invoking a tool. Always becomes a tool message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolResult {
    Success(String),
    Failure(String),
}

impl ToolResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Success(text) | Self::Failure(text) => text,
        }
    }

    pub fn into_message(self, tool_name: &str) -> Message {
        match self {
            Self::Success(text) | Self::Failure(text) => Message::tool(tool_name, text),
        }
    }
}

/// Every tool implements this trait.
///
/// Handlers that never suspend are still exposed through the async `call`,
/// see [`FnTool`], so the invoker treats both kinds the same way.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Unique name the LLM uses to call this tool.
    fn name(&self) -> &str;

    /// Human-readable description sent with the declaration.
    fn description(&self) -> &str;

    /// Parameters the tool accepts. Anything else the model sends is dropped.
    fn parameters(&self) -> &[Parameter];

    /// The set of argument names the tool accepts.
    fn parameter_names(&self) -> BTreeSet<&str> {
        self.parameters().iter().map(|p| p.name).collect()
    }

    /// Execute the tool with filtered arguments.
    async fn call(&self, args: Arguments) -> Result<String>;
}

/// Adapts a synchronous closure into a [`Tool`].
///
/// The closure runs on the runtime thread when the call is polled, so
/// `tool_timeout` only fires once it returns. Handlers must not block.
pub struct FnTool<F> {
    name: &'static str,
    description: &'static str,
    parameters: &'static [Parameter],
    handler: F,
}

impl<F> FnTool<F>
where
    F: Fn(&Arguments) -> Result<String> + Send + Sync,
{
    pub fn new(
        name: &'static str,
        description: &'static str,
        parameters: &'static [Parameter],
        handler: F,
    ) -> Self {
        Self {
            name,
            description,
            parameters,
            handler,
        }
    }
}

#[async_trait::async_trait]
impl<F> Tool for FnTool<F>
where
    F: Fn(&Arguments) -> Result<String> + Send + Sync,
{
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameters(&self) -> &[Parameter] {
        self.parameters
    }

    async fn call(&self, args: Arguments) -> Result<String> {
        (self.handler)(&args)
    }
}

/// Holds all registered tools and resolves them by name.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<()> {
        anyhow::ensure!(
            self.resolve(tool.name()).is_none(),
            "Tool '{}' is already registered",
            tool.name()
        );
        self.tools.push(Arc::new(tool));
        Ok(())
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Produce declarations for the LLM, in registration order.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools
            .iter()
            .map(|t| ToolDeclaration {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters().to_vec(),
            })
            .collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl ToolRegistry {
    /// Create a registry with the movie guide tools.
    pub fn with_builtins(tmdb: &TmdbConfig) -> Result<Self> {
        let mut registry = Self::new();
        movies::register_all(&mut registry, tmdb)?;
        Ok(registry)
    }
}
