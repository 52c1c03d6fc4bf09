//! Completion collaborator surface for the Oryx bot.
//!
//! Defines the role-tagged chat message types, the `CompletionClient` seam
//! the pipeline generates replies through, and the Groq-backed client.

mod groq;
mod types;

pub use groq::{GroqClient, GroqConfig};
pub use types::{AiError, ChatMessage, CompletionClient, MessageRole};
