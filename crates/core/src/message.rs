//! Conversation turn domain types.
//!
//! A turn is one utterance in the chat: the user asks, the assistant answers.
//! Turns flow from the gateway into the conversation log, and from the log
//! into the remote completion request as role-tagged context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Who said it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The person using the app
    User,
    /// The fencing assistant
    Assistant,
}

impl Speaker {
    /// Role tag used by chat-completion APIs.
    pub fn role(&self) -> &'static str {
        match self {
            Speaker::User => "user",
            Speaker::Assistant => "assistant",
        }
    }
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who said it
    pub speaker: Speaker,

    /// The text; never empty
    pub text: String,

    /// When it was recorded
    pub timestamp: DateTime<Utc>,

    /// Video the user was watching, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_context: Option<String>,
}

impl ConversationTurn {
    /// Create a turn, rejecting blank text.
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::InvalidInput(format!(
                "{} turn must have non-empty text",
                speaker.role()
            )));
        }
        Ok(Self {
            speaker,
            text,
            timestamp: Utc::now(),
            video_context: None,
        })
    }

    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Result<Self> {
        Self::new(Speaker::User, text)
    }

    /// Create an assistant turn.
    pub fn assistant(text: impl Into<String>) -> Result<Self> {
        Self::new(Speaker::Assistant, text)
    }

    /// Tag the turn with the video being watched. Blank tags are dropped.
    pub fn with_video_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.video_context = if context.trim().is_empty() {
            None
        } else {
            Some(context)
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        assert!(ConversationTurn::user("").is_err());
        assert!(ConversationTurn::assistant("   \n").is_err());
    }

    #[test]
    fn roles_match_completion_api() {
        assert_eq!(Speaker::User.role(), "user");
        assert_eq!(Speaker::Assistant.role(), "assistant");
    }

    #[test]
    fn video_context_tag() {
        let turn = ConversationTurn::user("这一剑是谁得分？")
            .unwrap()
            .with_video_context("2024巴黎奥运会男子花剑决赛");
        assert_eq!(
            turn.video_context.as_deref(),
            Some("2024巴黎奥运会男子花剑决赛")
        );

        let untagged = ConversationTurn::user("你好").unwrap().with_video_context("  ");
        assert!(untagged.video_context.is_none());
    }

    #[test]
    fn serializes_speaker_lowercase() {
        let turn = ConversationTurn::assistant("先得15分者获胜").unwrap();
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["speaker"], "assistant");
        assert!(json.get("video_context").is_none());
    }
}
