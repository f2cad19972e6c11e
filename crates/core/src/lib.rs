//! # piste core
//!
//! Domain types, traits, and error definitions for the piste fencing
//! companion backend. Everything the assistant, the generators and the HTTP
//! gateway agree on lives here.
//!
//! ## Layout
//!
//! - [`message`] — conversation turns and speakers
//! - [`intent`] — the closed set of intent categories
//! - [`provider`] — the remote completion client trait
//! - [`status`] — assistant mode and status snapshot
//! - [`templates`] — keyword routing and template selection shared by the
//!   responder and every generator

pub mod error;
pub mod intent;
pub mod message;
pub mod provider;
pub mod status;
pub mod templates;

// Re-export key types at crate root for ergonomics
pub use error::{Error, RemoteUnavailable, Result};
pub use intent::IntentCategory;
pub use message::{ConversationTurn, Speaker};
pub use provider::{CompletionClient, CompletionRequest};
pub use status::{AiStatus, AssistantMode};
pub use templates::{KeywordRouter, TemplateBank, render};
