//! LLM provider abstraction for reel.
//!
//! Wraps rig-core's provider clients behind a [`Provider`] struct with enum
//! dispatch. [`Provider`] implements
//! [`CompletionService`](crate::completion::CompletionService), the only
//! interface the dispatch loop sees.

mod client;
mod kind;
mod resolve;

pub use client::Provider;
pub use resolve::{resolve_model, ModelSelection};
