//! Conversation state shared between an analysis and its follow-up questions.
//!
//! A [`ConversationSession`] is an append-only log of alternating user and
//! model turns. Every call to the chat backend receives the whole log, which
//! is what gives the model memory of earlier turns.

mod openai;
mod store;

pub use openai::OpenAiChat;
pub use store::{Checkout, SessionStore, SharedSession, DEFAULT_SESSION_TTL_SECS};

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Token counts reported for one model reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Binary image data sent inline with a user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub data: Vec<u8>,
    pub media_type: String,
}

/// What the user sends in one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserContent {
    Text(String),
    TextWithImage { text: String, image: InlineImage },
}

impl UserContent {
    /// The text part of the message.
    pub fn text(&self) -> &str {
        match self {
            UserContent::Text(text) => text,
            UserContent::TextWithImage { text, .. } => text,
        }
    }

    /// The image part, if any.
    pub fn image(&self) -> Option<&InlineImage> {
        match self {
            UserContent::Text(_) => None,
            UserContent::TextWithImage { image, .. } => Some(image),
        }
    }
}

/// One entry in the conversation log.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    User {
        content: UserContent,
        at: DateTime<Utc>,
    },
    Model {
        text: String,
        usage: UsageRecord,
        at: DateTime<Utc>,
    },
}

impl Turn {
    pub fn is_user(&self) -> bool {
        matches!(self, Turn::User { .. })
    }
}

/// Text and usage returned by a chat backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: UsageRecord,
}

/// Trait for chat-completion backends.
///
/// Backends are stateless: the caller passes the full history on every call,
/// ending with the user turn to answer.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, history: &[Turn]) -> Result<Completion>;
}

/// An in-memory conversation with a chat backend.
pub struct ConversationSession {
    backend: Arc<dyn ChatBackend>,
    turns: Vec<Turn>,
}

impl ConversationSession {
    /// Create an empty session.
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            turns: Vec::new(),
        }
    }

    /// Whether at least one exchange has completed.
    pub fn is_active(&self) -> bool {
        !self.turns.is_empty()
    }

    /// Turns recorded so far, oldest first.
    pub fn history(&self) -> &[Turn] {
        &self.turns
    }

    /// Send a user message and record the exchange.
    ///
    /// The history is only extended once the backend has answered, so a
    /// failed call leaves the session exactly as it was.
    #[instrument(skip(self, content), fields(turns = self.turns.len(), image = content.image().is_some()))]
    pub async fn send(&mut self, content: UserContent) -> Result<Completion> {
        let mut pending = Vec::with_capacity(self.turns.len() + 1);
        pending.extend(self.turns.iter().cloned());
        pending.push(Turn::User {
            content,
            at: Utc::now(),
        });

        let completion = self.backend.complete(&pending).await?;

        debug!(
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            "Chat reply received"
        );

        pending.push(Turn::Model {
            text: completion.text.clone(),
            usage: completion.usage,
            at: Utc::now(),
        });
        self.turns = pending;

        Ok(completion)
    }
}
