//! Completion client trait, the abstraction over remote chat-completion
//! backends.
//!
//! A client takes the user's message, the video they are watching and recent
//! conversation turns, and returns the assistant's reply text. Any failure is
//! reported as [`RemoteUnavailable`] so the orchestrator can fall back to the
//! local responder.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteUnavailable;
use crate::message::ConversationTurn;

/// Everything a remote backend needs to answer one message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The user's current message
    pub message: String,

    /// Title or description of the video being watched; may be empty
    #[serde(default)]
    pub video_context: String,

    /// Recent turns, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ConversationTurn>,

    /// Exchanges completed so far in the whole conversation, which may be
    /// more than `history` carries
    #[serde(default)]
    pub prior_rounds: usize,
}

impl CompletionRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_video_context(mut self, context: impl Into<String>) -> Self {
        self.video_context = context.into();
        self
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_prior_rounds(mut self, rounds: usize) -> Self {
        self.prior_rounds = rounds;
        self
    }

    /// The message as sent upstream: prefixed with the video context when
    /// one is set.
    pub fn prefixed_message(&self) -> String {
        let context = self.video_context.trim();
        if context.is_empty() {
            self.message.clone()
        } else {
            format!("[视频上下文: {context}] {}", self.message)
        }
    }
}

/// A remote chat-completion backend.
///
/// The orchestrator holds one of these behind an `Arc<dyn CompletionClient>`
/// and never knows which vendor sits behind it.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// A human-readable name for this backend (e.g., "deepseek").
    fn name(&self) -> &str;

    /// Model identifier sent upstream.
    fn model(&self) -> &str {
        "unknown"
    }

    /// Send a request and get the reply text.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<String, RemoteUnavailable>;
}
