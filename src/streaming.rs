//! Streams the final answer of a turn to the output sink.

use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, warn};

use crate::completion::CompletionService;
use crate::error::TurnError;
use crate::message::Message;
use crate::output::Renderer;

/// Renders the answer generation call, fragment by fragment.
pub struct StreamingResponder<'a> {
    service: &'a dyn CompletionService,
    open_timeout: Duration,
    idle_timeout: Duration,
}

impl<'a> StreamingResponder<'a> {
    pub fn new(
        service: &'a dyn CompletionService,
        open_timeout: Duration,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            service,
            open_timeout,
            idle_timeout,
        }
    }

    /// Streams an answer for `messages` into `renderer` and returns it as an
    /// assistant message.
    ///
    /// Fragments reach the renderer as soon as they arrive. On failure the
    /// renderer gets `render_error` and whatever was already shown stays shown.
    pub async fn render(
        &self,
        messages: &[Message],
        renderer: &mut dyn Renderer,
    ) -> Result<Message, TurnError> {
        match self.stream_into(messages, renderer).await {
            Ok(text) => {
                renderer.render_done();
                debug!(chars = text.len(), "answer stream finished");
                Ok(Message::assistant(text))
            }
            Err(err) => {
                warn!(error = %err, "answer stream failed");
                renderer.render_error(&err.to_string());
                Err(err)
            }
        }
    }

    async fn stream_into(
        &self,
        messages: &[Message],
        renderer: &mut dyn Renderer,
    ) -> Result<String, TurnError> {
        let mut stream = tokio::time::timeout(self.open_timeout, self.service.stream_answer(messages))
            .await
            .map_err(|_| TurnError::Timeout {
                stage: "opening the answer stream",
                secs: self.open_timeout.as_secs(),
            })?
            .map_err(TurnError::completion)?;

        let mut full_response = String::new();
        loop {
            let next = tokio::time::timeout(self.idle_timeout, stream.next())
                .await
                .map_err(|_| TurnError::Timeout {
                    stage: "waiting for the next answer fragment",
                    secs: self.idle_timeout.as_secs(),
                })?;
            match next {
                Some(Ok(fragment)) => {
                    if fragment.is_empty() {
                        continue;
                    }
                    renderer.render_token(&fragment);
                    full_response.push_str(&fragment);
                }
                Some(Err(err)) => return Err(TurnError::stream(err)),
                None => return Ok(full_response),
            }
        }
    }
}
