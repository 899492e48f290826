//! Read-only views over a conversational exchange with a generative responder.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Responder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
        }
    }

    pub fn responder(content: impl Into<String>) -> Self {
        Self {
            role: Role::Responder,
            content: Some(content.into()),
        }
    }

    /// A responder turn that carried no content at all (e.g. a bare tool call).
    pub fn responder_without_content() -> Self {
        Self {
            role: Role::Responder,
            content: None,
        }
    }

    pub fn is_from_responder(&self) -> bool {
        self.role == Role::Responder
    }

    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Messages in chronological order. Built once per exchange, then only read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of responder-authored turns.
    pub fn responder_turns(&self) -> usize {
        self.messages.iter().filter(|m| m.is_from_responder()).count()
    }
}

impl From<Vec<Message>> for ConversationLog {
    fn from(messages: Vec<Message>) -> Self {
        Self::new(messages)
    }
}

/// The ways one exchange can be observed.
///
/// A single exchange may be visible through several representations that do
/// not always agree: the returned log, a "most recent message" accessor and a
/// secondary store kept by the responder itself.
pub trait ConversationView {
    fn log(&self) -> &ConversationLog;

    fn last_message(&self) -> Option<Message>;

    fn alternate_log(&self) -> Option<ConversationLog>;
}

/// A view with all three representations captured up front.
#[derive(Debug, Clone, Default)]
pub struct CapturedExchange {
    pub log: ConversationLog,
    pub last: Option<Message>,
    pub alternate: Option<ConversationLog>,
}

impl CapturedExchange {
    pub fn from_log(log: ConversationLog) -> Self {
        Self {
            log,
            last: None,
            alternate: None,
        }
    }
}

impl ConversationView for CapturedExchange {
    fn log(&self) -> &ConversationLog {
        &self.log
    }

    fn last_message(&self) -> Option<Message> {
        self.last.clone()
    }

    fn alternate_log(&self) -> Option<ConversationLog> {
        self.alternate.clone()
    }
}
