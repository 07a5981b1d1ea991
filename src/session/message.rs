//! Conversation message types and the append-only log

use crate::api::types::{Question, Source};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// Quiz payload carried by a quiz prompt message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizPayload {
    pub quiz_id: String,
    pub questions: Vec<Question>,
}

/// Rich content attached to an assistant turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachments {
    #[serde(default)]
    pub svg_flashcard: Option<String>,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub quiz: Option<QuizPayload>,
}

impl Attachments {
    pub fn is_empty(&self) -> bool {
        self.svg_flashcard.is_none()
            && self.sources.is_empty()
            && self.keywords.is_empty()
            && self.quiz.is_none()
    }
}

/// What kind of user reply the next turn is expected to be.
///
/// Exactly one expectation per assistant message, structurally. Routing for a
/// new user message reads only the metadata of the most recent assistant
/// message, never earlier history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutingMetadata {
    #[default]
    None,

    /// Awaiting a yes/no reply to the quiz offer
    ExpectingYesNo {
        session_id: String,
        last_topic: String,
    },

    /// Awaiting a pick from a numbered topic list
    ExpectingTopicChoice {
        topics: Vec<String>,
        last_topic: String,
    },

    /// Awaiting answers to an outstanding quiz
    ExpectingQuizAnswers {
        quiz_id: String,
        questions: Vec<Question>,
        last_topic: Option<String>,
    },
}

/// One turn in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Monotonic id assigned by the log on append
    pub id: u64,
    pub role: Role,
    /// Markdown body
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Attachments>,
    /// Presentation hint, not routing state
    #[serde(default)]
    pub is_error: bool,
    /// Presentation hint, not routing state
    #[serde(default)]
    pub is_thinking: bool,
    #[serde(default)]
    pub routing: RoutingMetadata,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: 0,
            role: Role::User,
            content: content.into(),
            created_at: Utc::now(),
            attachments: None,
            is_error: false,
            is_thinking: false,
            routing: RoutingMetadata::None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: 0,
            role: Role::Assistant,
            content: content.into(),
            created_at: Utc::now(),
            attachments: None,
            is_error: false,
            is_thinking: false,
            routing: RoutingMetadata::None,
        }
    }

    pub fn assistant_error(content: impl Into<String>) -> Self {
        let mut msg = Self::assistant(content);
        msg.is_error = true;
        msg
    }

    #[must_use]
    pub fn with_attachments(mut self, attachments: Attachments) -> Self {
        if !attachments.is_empty() {
            self.attachments = Some(attachments);
        }
        self
    }

    #[must_use]
    pub fn with_routing(mut self, routing: RoutingMetadata) -> Self {
        self.routing = routing;
        self
    }
}

/// Append-only message log.
///
/// The last-assistant position is maintained incrementally on append rather
/// than recomputed by scanning history, so routing always sees the message
/// appended most recently regardless of what the handler did in between.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
    next_id: u64,
    last_assistant: Option<usize>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            next_id: 1,
            last_assistant: None,
        }
    }

    /// Append a message, assigning its id. Never fails.
    pub fn append(&mut self, mut message: Message) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        message.id = id;
        if message.role == Role::Assistant {
            self.last_assistant = Some(self.messages.len());
        }
        self.messages.push(message);
        id
    }

    /// Most recent assistant turn, if any
    pub fn last_assistant_message(&self) -> Option<&Message> {
        self.last_assistant.map(|i| &self.messages[i])
    }

    /// Read-only snapshot for rendering
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
