//! Scripted collaborators for exercising the dispatch loop without a model.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::future;
use futures::stream::{self, StreamExt};

use crate::completion::{CompletionService, Decision, FragmentStream, ToolCallDirective};
use crate::message::Message;
use crate::output::Renderer;
use crate::tools::ToolDeclaration;

enum ScriptedDecision {
    Ready(Decision),
    Fail(String),
    Hang,
}

enum ScriptedAnswer {
    Fragments(Vec<String>),
    NeverOpens,
    Broken(Vec<String>, String),
    Stalled(Vec<String>),
}

/// Replays queued decisions and answers in order.
///
/// An exhausted decision queue answers [`Decision::Respond`]; an exhausted
/// answer queue fails to open the stream.
#[derive(Default)]
pub struct ScriptedService {
    decisions: Mutex<VecDeque<ScriptedDecision>>,
    answers: Mutex<VecDeque<ScriptedAnswer>>,
    /// History snapshot of every `decide` call.
    pub decide_calls: Mutex<Vec<Vec<Message>>>,
    /// Tool declaration names seen by every `decide` call.
    pub declared: Mutex<Vec<Vec<String>>>,
    /// History snapshot of every `stream_answer` call.
    pub answer_calls: Mutex<Vec<Vec<Message>>>,
}

fn owned<I, S>(fragments: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fragments.into_iter().map(Into::into).collect()
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_decision(self, decision: ScriptedDecision) -> Self {
        self.decisions.lock().unwrap().push_back(decision);
        self
    }

    fn push_answer(self, answer: ScriptedAnswer) -> Self {
        self.answers.lock().unwrap().push_back(answer);
        self
    }

    pub fn tool_call(self, name: &str, arguments_json: &str) -> Self {
        self.push_decision(ScriptedDecision::Ready(Decision::ToolCall(
            ToolCallDirective::new(name, arguments_json),
        )))
    }

    pub fn respond(self) -> Self {
        self.push_decision(ScriptedDecision::Ready(Decision::Respond))
    }

    pub fn decide_error(self, message: &str) -> Self {
        self.push_decision(ScriptedDecision::Fail(message.to_string()))
    }

    /// A decision that never arrives.
    pub fn hung_decision(self) -> Self {
        self.push_decision(ScriptedDecision::Hang)
    }

    /// An answer stream that never opens.
    pub fn hung_answer(self) -> Self {
        self.push_answer(ScriptedAnswer::NeverOpens)
    }

    pub fn answer<I, S>(self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_answer(ScriptedAnswer::Fragments(owned(fragments)))
    }

    pub fn broken_answer<I, S>(self, fragments: I, error: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_answer(ScriptedAnswer::Broken(owned(fragments), error.to_string()))
    }

    pub fn stalled_answer<I, S>(self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_answer(ScriptedAnswer::Stalled(owned(fragments)))
    }
}

#[async_trait]
impl CompletionService for ScriptedService {
    async fn decide(&self, messages: &[Message], tools: &[ToolDeclaration]) -> Result<Decision> {
        self.decide_calls.lock().unwrap().push(messages.to_vec());
        self.declared
            .lock()
            .unwrap()
            .push(tools.iter().map(|t| t.name.clone()).collect());
        let next = self.decisions.lock().unwrap().pop_front();
        match next {
            Some(ScriptedDecision::Ready(decision)) => Ok(decision),
            Some(ScriptedDecision::Fail(message)) => Err(anyhow!(message)),
            Some(ScriptedDecision::Hang) => future::pending().await,
            None => Ok(Decision::Respond),
        }
    }

    async fn stream_answer(&self, messages: &[Message]) -> Result<FragmentStream> {
        self.answer_calls.lock().unwrap().push(messages.to_vec());
        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted answer"))?;
        let stream: FragmentStream = match answer {
            ScriptedAnswer::Fragments(fragments) => {
                stream::iter(fragments.into_iter().map(Ok)).boxed()
            }
            ScriptedAnswer::NeverOpens => return future::pending().await,
            ScriptedAnswer::Broken(fragments, error) => {
                let mut items: Vec<Result<String>> = fragments.into_iter().map(Ok).collect();
                items.push(Err(anyhow!(error)));
                stream::iter(items).boxed()
            }
            ScriptedAnswer::Stalled(fragments) => stream::iter(fragments.into_iter().map(Ok))
                .chain(stream::pending())
                .boxed(),
        };
        Ok(stream)
    }
}

/// Captures everything a turn shows to the user.
#[derive(Default, Debug)]
pub struct RecordingRenderer {
    pub tokens: Vec<String>,
    pub done: usize,
    pub errors: Vec<String>,
    pub tool_starts: Vec<String>,
    pub tool_results: Vec<(String, bool)>,
}

impl Renderer for RecordingRenderer {
    fn render_token(&mut self, token: &str) {
        self.tokens.push(token.to_string());
    }

    fn render_done(&mut self) {
        self.done += 1;
    }

    fn render_error(&mut self, err: &str) {
        self.errors.push(err.to_string());
    }

    fn tool_start(&mut self, name: &str, _args: &str) {
        self.tool_starts.push(name.to_string());
    }

    fn tool_result(&mut self, name: &str, _result: &str, is_error: bool) {
        self.tool_results.push((name.to_string(), is_error));
    }
}
