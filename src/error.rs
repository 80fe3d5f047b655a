//! Error taxonomy for the dispatch loop.
//!
//! [`ToolError`] covers faults that stay inside a tool round and are fed back
//! to the model as text. [`TurnError`] covers faults that fail the whole turn
//! and reach the caller. Neither is ever fatal to the process.

use thiserror::Error;

/// A tool round went wrong. Rendered into the conversation, never propagated.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),

    #[error("invalid arguments for {name}: {reason}")]
    ArgumentParse { name: String, reason: String },

    #[error("Error calling function {name}: {message}")]
    Execution { name: String, message: String },

    #[error("Error calling function {name}: handler panicked")]
    Panicked { name: String },

    #[error("Error calling function {name}: timed out after {secs}s")]
    Timeout { name: String, secs: u64 },
}

/// A turn could not complete. The session discards the turn and stays usable.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("completion service failed: {0}")]
    CompletionService(String),

    #[error("answer stream failed: {0}")]
    Stream(String),

    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },
}

impl TurnError {
    pub(crate) fn completion(err: anyhow::Error) -> Self {
        Self::CompletionService(format!("{err:#}"))
    }

    pub(crate) fn stream(err: anyhow::Error) -> Self {
        Self::Stream(format!("{err:#}"))
    }
}
