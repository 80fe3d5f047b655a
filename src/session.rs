//! In-memory chat sessions.
//!
//! A [`Session`] owns one [`ConversationState`] and runs turns against it.
//! `send` takes `&mut self`, so a session processes one user message at a
//! time, tool rounds and streamed answer included. Sessions live for the
//! duration of the process and are never written to disk.

use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::agent::{AgentSettings, DispatchLoop, DispatchOutcome};
use crate::completion::CompletionService;
use crate::error::TurnError;
use crate::message::{ConversationState, Message};
use crate::output::Renderer;
use crate::streaming::StreamingResponder;
use crate::tools::ToolRegistry;

/// An active conversation.
pub struct Session {
    id: Uuid,
    state: ConversationState,
    service: Arc<dyn CompletionService>,
    registry: Arc<ToolRegistry>,
    settings: AgentSettings,
}

impl Session {
    /// Creates a new session with a UUID v4 identifier.
    pub fn new(
        service: Arc<dyn CompletionService>,
        registry: Arc<ToolRegistry>,
        settings: AgentSettings,
        system_prompt: Option<&str>,
    ) -> Self {
        let id = Uuid::new_v4();
        info!(session = %id, "session started");
        Self {
            id,
            state: ConversationState::with_system_prompt(system_prompt),
            service,
            registry,
            settings,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The conversation so far, read-only.
    pub fn messages(&self) -> &[Message] {
        self.state.messages()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Removes all turns, keeping the system prompt.
    pub fn clear(&mut self) {
        self.state.clear_turns();
    }

    /// Handles one user message: tool rounds, then a streamed answer that
    /// ends up as the last message.
    ///
    /// On error the conversation is restored to what it was before `text`
    /// arrived, so the user can simply retry.
    pub async fn send(
        &mut self,
        text: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<DispatchOutcome, TurnError> {
        let span = info_span!("turn", session = %self.id);
        let mark = self.state.len();
        let result = self.run_turn(text, renderer).instrument(span).await;
        if let Err(ref err) = result {
            warn!(session = %self.id, error = %err, "turn failed, discarding it");
            self.state.rollback(mark);
        }
        result
    }

    async fn run_turn(
        &mut self,
        text: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<DispatchOutcome, TurnError> {
        self.state.push(Message::user(text));

        let dispatch = DispatchLoop::new(self.service.as_ref(), &self.registry, self.settings)
            .run(&mut self.state, renderer)
            .await?;
        info!(rounds = dispatch.rounds, exit = ?dispatch.exit, "dispatch finished");

        let answer = StreamingResponder::new(
            self.service.as_ref(),
            self.settings.request_timeout,
            self.settings.stream_idle_timeout,
        )
        .render(self.state.messages(), renderer)
        .await?;
        self.state.push(answer);

        Ok(dispatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::LoopExit;
    use crate::message::Role;
    use crate::testing::{RecordingRenderer, ScriptedService};
    use crate::tools::FnTool;
    use std::time::Duration;

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry
            .register(FnTool::new("get_now_playing_movies", "listing", &[], |_| {
                Ok("Dune, Alien".to_string())
            }))
            .unwrap();
        registry
            .register(FnTool::new("buy_ticket", "purchase", &[], |_| {
                anyhow::bail!("payment declined")
            }))
            .unwrap();
        Arc::new(registry)
    }

    fn settings() -> AgentSettings {
        AgentSettings {
            max_tool_rounds: 4,
            request_timeout: Duration::from_secs(5),
            tool_timeout: Duration::from_secs(5),
            stream_idle_timeout: Duration::from_secs(5),
        }
    }

    fn session(service: ScriptedService) -> Session {
        Session::new(Arc::new(service), registry(), settings(), Some("movie guide"))
    }

    fn last_text(session: &Session) -> &str {
        session.messages().last().map(Message::text).unwrap_or_default()
    }

    fn scripted_turn() -> ScriptedService {
        ScriptedService::new()
            .tool_call("get_now_playing_movies", "{}")
            .tool_call("buy_ticket", r#"{"movie": "Dune"}"#)
            .respond()
            .answer(["Dune is ", "playing, ", "but the purchase failed."])
    }

    #[tokio::test]
    async fn full_turn_appends_answer() {
        let mut session = session(scripted_turn());
        let mut sink = RecordingRenderer::default();

        let outcome = session.send("book Dune", &mut sink).await.unwrap();

        assert_eq!(outcome.rounds, 2);
        assert_eq!(last_text(&session), "Dune is playing, but the purchase failed.");
        let roles: Vec<Role> = session.messages().iter().map(|m| m.role()).collect();
        assert_eq!(
            roles,
            [Role::System, Role::User, Role::Tool, Role::Tool, Role::Assistant]
        );
        assert_eq!(session.messages()[3].text(), "Error calling function buy_ticket: payment declined");
        assert_eq!(sink.done, 1);
    }

    #[tokio::test]
    async fn answer_stream_sees_tool_results_but_no_declarations() {
        let service = Arc::new(scripted_turn());
        let mut session = Session::new(service.clone(), registry(), settings(), None);

        session
            .send("book Dune", &mut RecordingRenderer::default())
            .await
            .unwrap();

        let answer_calls = service.answer_calls.lock().unwrap();
        assert_eq!(answer_calls.len(), 1);
        assert_eq!(answer_calls[0].len(), 3);
        assert_eq!(answer_calls[0][2].role(), Role::Tool);
    }

    #[tokio::test]
    async fn replay_is_deterministic() {
        let mut first = session(scripted_turn());
        let mut second = session(scripted_turn());

        first
            .send("book Dune", &mut RecordingRenderer::default())
            .await
            .unwrap();
        second
            .send("book Dune", &mut RecordingRenderer::default())
            .await
            .unwrap();

        assert_ne!(first.id(), second.id());
        assert_eq!(first.messages(), second.messages());
    }

    #[tokio::test]
    async fn malformed_arguments_still_answer() {
        let service = ScriptedService::new()
            .tool_call("buy_ticket", "not json at all")
            .answer(["Sorry, ", "could you repeat that?"]);
        let mut session = session(service);
        let mut sink = RecordingRenderer::default();

        let outcome = session.send("buy it", &mut sink).await.unwrap();

        assert_eq!(outcome.exit, LoopExit::MalformedArguments);
        assert_eq!(last_text(&session), "Sorry, could you repeat that?");
        let messages = session.messages();
        assert_eq!(messages[messages.len() - 2].role(), Role::System);
        assert_eq!(messages[messages.len() - 1].role(), Role::Assistant);
    }

    #[tokio::test]
    async fn failed_turn_is_rolled_back() {
        let service = ScriptedService::new()
            .tool_call("get_now_playing_movies", "{}")
            .decide_error("rate limited")
            .respond()
            .answer(["Dune is playing."]);
        let mut session = session(service);
        let mut sink = RecordingRenderer::default();

        let err = session.send("what's on?", &mut sink).await.unwrap_err();
        assert!(matches!(err, TurnError::CompletionService(_)));
        assert_eq!(session.messages().len(), 1);

        session.send("what's on?", &mut sink).await.unwrap();
        assert_eq!(last_text(&session), "Dune is playing.");
        assert_eq!(session.messages().len(), 3);
    }

    #[tokio::test]
    async fn stream_failure_is_rolled_back() {
        let service = ScriptedService::new().broken_answer(["Du"], "socket closed");
        let mut session = session(service);
        let mut sink = RecordingRenderer::default();

        let err = session.send("hi", &mut sink).await.unwrap_err();

        assert!(matches!(err, TurnError::Stream(_)));
        assert_eq!(sink.tokens, ["Du"]);
        assert_eq!(session.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn decision_timeout_is_rolled_back() {
        let service = ScriptedService::new()
            .tool_call("get_now_playing_movies", "{}")
            .hung_decision();
        let mut session = session(service);
        let mut sink = RecordingRenderer::default();

        let err = session.send("what's on?", &mut sink).await.unwrap_err();

        assert!(matches!(err, TurnError::Timeout { stage: "tool decision", .. }));
        assert_eq!(session.messages().len(), 1);
        assert!(sink.tokens.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stream_open_timeout_is_rolled_back() {
        let service = ScriptedService::new().respond().hung_answer();
        let mut session = session(service);
        let mut sink = RecordingRenderer::default();

        let err = session.send("what's on?", &mut sink).await.unwrap_err();

        assert!(matches!(
            err,
            TurnError::Timeout {
                stage: "opening the answer stream",
                ..
            }
        ));
        assert_eq!(session.messages().len(), 1);
    }

    #[tokio::test]
    async fn clear_drops_notes_from_earlier_turns() {
        let service = ScriptedService::new()
            .tool_call("buy_ticket", "not json at all")
            .answer(["Sorry?"]);
        let mut session = session(service);
        session
            .send("buy it", &mut RecordingRenderer::default())
            .await
            .unwrap();
        assert!(session.messages().iter().filter(|m| m.role() == Role::System).count() > 1);

        session.clear();

        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].text(), "movie guide");
    }

    #[tokio::test]
    async fn clear_keeps_system_prompt() {
        let mut session = session(ScriptedService::new().answer(["hello"]));
        session
            .send("hi", &mut RecordingRenderer::default())
            .await
            .unwrap();
        session.clear();
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role(), Role::System);
    }
}
