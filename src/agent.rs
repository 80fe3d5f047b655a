//! The tool dispatch loop.
//!
//! [`DispatchLoop`] repeatedly asks the completion service whether a tool
//! should run, runs it through [`ToolInvoker`], and appends the result to the
//! conversation until the model is ready to answer. The answer itself is
//! streamed afterwards by [`StreamingResponder`](crate::streaming::StreamingResponder).
//!
//! At most one tool call is outstanding at any time, so tool messages land in
//! the conversation in the order their calls completed.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::completion::{CompletionService, Decision};
use crate::constants::ROUND_LIMIT_NOTE;
use crate::error::TurnError;
use crate::message::{ConversationState, Message};
use crate::output::Renderer;
use crate::tools::{ToolInvocationRequest, ToolInvoker, ToolRegistry};

/// Limits applied to every turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSettings {
    /// Tool rounds allowed before a direct answer is forced.
    pub max_tool_rounds: usize,
    /// Bound on one decision round-trip and on opening the answer stream.
    pub request_timeout: Duration,
    /// Bound on one tool handler.
    pub tool_timeout: Duration,
    /// Bound on the gap between two answer fragments.
    pub stream_idle_timeout: Duration,
}

/// Why the loop moved on to answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The model chose to answer directly.
    Answer,
    /// A tool call carried arguments that were not a JSON object.
    MalformedArguments,
    /// The round ceiling was reached.
    RoundLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Tool rounds executed this turn.
    pub rounds: usize,
    pub exit: LoopExit,
}

/// The Deciding half of a turn.
pub struct DispatchLoop<'a> {
    service: &'a dyn CompletionService,
    registry: &'a ToolRegistry,
    settings: AgentSettings,
}

impl<'a> DispatchLoop<'a> {
    pub fn new(
        service: &'a dyn CompletionService,
        registry: &'a ToolRegistry,
        settings: AgentSettings,
    ) -> Self {
        Self {
            service,
            registry,
            settings,
        }
    }

    /// Runs tool rounds until the model wants to answer.
    ///
    /// Only completion service failures end the turn with an error. Tool
    /// faults become tool messages; malformed arguments and the round ceiling
    /// add a system note and hand over to answering.
    pub async fn run(
        &self,
        state: &mut ConversationState,
        renderer: &mut dyn Renderer,
    ) -> Result<DispatchOutcome, TurnError> {
        let declarations = self.registry.declarations();
        let invoker = ToolInvoker::new(self.registry, self.settings.tool_timeout);
        let mut rounds = 0;

        loop {
            if rounds >= self.settings.max_tool_rounds {
                warn!(rounds, "tool round limit reached, forcing an answer");
                state.push(Message::system(ROUND_LIMIT_NOTE));
                return Ok(DispatchOutcome {
                    rounds,
                    exit: LoopExit::RoundLimit,
                });
            }

            debug!(round = rounds + 1, history = state.len(), "asking model for next step");
            let decision = tokio::time::timeout(
                self.settings.request_timeout,
                self.service.decide(state.messages(), &declarations),
            )
            .await
            .map_err(|_| TurnError::Timeout {
                stage: "tool decision",
                secs: self.settings.request_timeout.as_secs(),
            })?
            .map_err(TurnError::completion)?;

            let directive = match decision {
                Decision::Respond => {
                    debug!(rounds, "model is ready to answer");
                    return Ok(DispatchOutcome {
                        rounds,
                        exit: LoopExit::Answer,
                    });
                }
                Decision::ToolCall(directive) => directive,
            };
            rounds += 1;

            let request = match ToolInvocationRequest::parse(&directive) {
                Ok(request) => request,
                Err(err) => {
                    warn!(tool = %directive.name, error = %err, "malformed tool call");
                    state.push(Message::system(format!("Error in function call loop: {err}")));
                    return Ok(DispatchOutcome {
                        rounds,
                        exit: LoopExit::MalformedArguments,
                    });
                }
            };

            info!(tool = %request.name, round = rounds, "calling tool");
            renderer.tool_start(&request.name, &directive.arguments_json);
            let result = invoker.invoke(request).await;
            renderer.tool_result(&directive.name, result.content(), result.is_failure());
            state.push(result.into_message(&directive.name));
        }
    }
}
