//! Argument filtering and fault-isolated tool execution.
//!
//! [`ToolInvoker::invoke`] always yields a [`ToolResult`]: unknown tools,
//! handler errors, panics and timeouts all come back as
//! [`ToolResult::Failure`] so the dispatch loop can hand them to the model.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Arguments, ToolRegistry, ToolResult};
use crate::completion::ToolCallDirective;
use crate::error::ToolError;

/// A parsed tool call: a name and the arguments object the model produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocationRequest {
    pub name: String,
    pub raw_arguments: Arguments,
}

impl ToolInvocationRequest {
    /// Parses the directive's argument text as a JSON object.
    ///
    /// Empty argument text counts as `{}`; some providers send nothing for
    /// parameterless calls.
    pub fn parse(directive: &ToolCallDirective) -> Result<Self, ToolError> {
        let text = directive.arguments_json.trim();
        let value: Value = if text.is_empty() {
            Value::Object(Arguments::new())
        } else {
            serde_json::from_str(text).map_err(|e| ToolError::ArgumentParse {
                name: directive.name.clone(),
                reason: e.to_string(),
            })?
        };
        match value {
            Value::Object(raw_arguments) => Ok(Self {
                name: directive.name.clone(),
                raw_arguments,
            }),
            other => Err(ToolError::ArgumentParse {
                name: directive.name.clone(),
                reason: format!("expected a JSON object, got {other}"),
            }),
        }
    }
}

/// Routes invocation requests to registered tools.
pub struct ToolInvoker<'a> {
    registry: &'a ToolRegistry,
    timeout: Duration,
}

impl<'a> ToolInvoker<'a> {
    pub fn new(registry: &'a ToolRegistry, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub async fn invoke(&self, request: ToolInvocationRequest) -> ToolResult {
        match self.try_invoke(request).await {
            Ok(content) => ToolResult::Success(content),
            Err(err) => {
                warn!(error = %err, "tool round failed");
                ToolResult::Failure(err.to_string())
            }
        }
    }

    async fn try_invoke(&self, request: ToolInvocationRequest) -> Result<String, ToolError> {
        let ToolInvocationRequest {
            name,
            raw_arguments,
        } = request;
        let tool = self
            .registry
            .resolve(&name)
            .ok_or_else(|| ToolError::NotFound(name.clone()))?;

        let declared = tool.parameter_names();
        let (accepted, dropped): (Arguments, Arguments) = raw_arguments
            .into_iter()
            .partition(|(key, _)| declared.contains(key.as_str()));
        if !dropped.is_empty() {
            let keys: Vec<&String> = dropped.keys().collect();
            debug!(tool = %name, dropped = ?keys, "ignoring undeclared arguments");
        }

        debug!(tool = %name, args = accepted.len(), "invoking tool");
        let call = AssertUnwindSafe(tool.call(accepted)).catch_unwind();
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(Ok(content))) => Ok(content),
            Ok(Ok(Err(err))) => Err(ToolError::Execution {
                name,
                message: format!("{err:#}"),
            }),
            Ok(Err(_panic)) => Err(ToolError::Panicked { name }),
            Err(_elapsed) => Err(ToolError::Timeout {
                name,
                secs: self.timeout.as_secs(),
            }),
        }
    }
}
