//! Message types for reel's conversation history.
//!
//! Provides the [`Message`] type with its [`Role`], and [`ConversationState`],
//! the ordered log a session owns. These are reel's internal types, converted
//! to provider-specific formats (e.g. rig-core's `Message`) when sent to the
//! LLM.

use serde::Serialize;

/// The role of a message sender in the conversation.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single message in a conversation.
///
/// Fields are private so the `tool_name` invariant holds by construction:
/// it is set exactly when the role is [`Role::Tool`], and only
/// [`Message::tool`] produces such a message.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Message {
    role: Role,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

impl Message {
    fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            tool_name: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text.into())
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text.into())
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text.into())
    }

    /// Creates a tool result message to feed back to the LLM.
    pub fn tool(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_name: Some(tool_name.into()),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    /// Name of the tool that produced this message. `Some` only for tool messages.
    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "you"),
            Role::Assistant => write!(f, "reel"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// Ordered, append-only log of a session's messages.
///
/// Messages cannot be edited once pushed. The only way to shrink the log is
/// [`ConversationState::rollback`], which the session uses to discard a
/// failed turn as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a conversation with the given system prompt, if any.
    pub fn with_system_prompt(prompt: Option<&str>) -> Self {
        let mut state = Self::new();
        if let Some(prompt) = prompt {
            state.push(Message::system(prompt));
        }
        state
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Drops every message appended after `len`.
    pub fn rollback(&mut self, len: usize) {
        self.messages.truncate(len);
    }

    /// Removes every turn, keeping only the leading system prompt. Notes added
    /// by earlier turns go too.
    pub fn clear_turns(&mut self) {
        let prompt_len = match self.messages.first() {
            Some(first) if first.role == Role::System => 1,
            _ => 0,
        };
        self.messages.truncate(prompt_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_name_only_on_tool_messages() {
        let messages = [
            Message::system("s"),
            Message::user("u"),
            Message::assistant("a"),
            Message::tool("get_reviews", "great"),
        ];
        for m in &messages {
            assert_eq!(m.tool_name().is_some(), m.role() == Role::Tool);
        }
        assert_eq!(messages[3].tool_name(), Some("get_reviews"));
    }

    #[test]
    fn system_prompt_is_optional() {
        assert!(ConversationState::with_system_prompt(None).is_empty());
        let state = ConversationState::with_system_prompt(Some("be nice"));
        assert_eq!(state.len(), 1);
        assert_eq!(state.messages()[0].role(), Role::System);
    }

    #[test]
    fn rollback_and_clear_keep_prefix() {
        let mut state = ConversationState::with_system_prompt(Some("prompt"));
        state.push(Message::user("hi"));
        let mark = state.len();
        state.push(Message::tool("get_now_playing_movies", "Dune"));
        state.push(Message::assistant("Dune is playing"));
        state.rollback(mark);
        assert_eq!(state.len(), 2);
        assert_eq!(state.last().map(Message::text), Some("hi"));

        state.push(Message::system("Error in function call loop: bad arguments"));
        state.push(Message::assistant("Could you repeat that?"));
        state.clear_turns();
        assert_eq!(state.len(), 1);
        assert_eq!(state.messages()[0].text(), "prompt");
    }

    #[test]
    fn clear_without_prompt_empties_state() {
        let mut state = ConversationState::new();
        state.push(Message::user("hi"));
        state.push(Message::system("Error in function call loop: bad arguments"));
        state.clear_turns();
        assert!(state.is_empty());
    }

    #[test]
    fn serializes_lowercase_role() {
        let json = serde_json::to_value(Message::tool("buy_ticket", "ok")).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_name"], "buy_ticket");
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert!(json.get("tool_name").is_none());
    }
}
