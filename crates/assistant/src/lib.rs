//! The fencing chat assistant.
//!
//! A message flows through:
//!
//! 1. **Classify** into an [`IntentCategory`](piste_core::IntentCategory)
//! 2. **Remote** completion, when in remote mode and a client is configured
//! 3. **Local** knowledge answer, in local mode or when the remote is unavailable
//! 4. **Log** both turns in the bounded conversation log

pub mod classifier;
pub mod history;
pub mod knowledge;
pub mod orchestrator;
pub mod responder;

pub use classifier::classify;
pub use history::ConversationLog;
pub use knowledge::{KnowledgeBody, KnowledgeCategory, KnowledgeEntry, KnowledgeStore};
pub use orchestrator::{Assistant, AssistantSettings, PROBE_MESSAGE, Reply, ReplySource};
pub use responder::LocalResponder;
