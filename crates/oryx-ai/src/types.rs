use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Role tag for one entry in a completion request.
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// One role-tagged message in the ordered list sent to the model.
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: text.into(),
        }
    }
}

#[derive(Debug, Error)]
/// Failure modes of the completion collaborator.
pub enum AiError {
    #[error("missing API key")]
    MissingApiKey,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned non-success status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
/// Seam between the decision pipeline and the language model. Returns the
/// generated text, or an empty string when the provider produced no content.
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_tag_roles() {
        assert_eq!(ChatMessage::system("a").role, MessageRole::System);
        assert_eq!(ChatMessage::user("b").role, MessageRole::User);
        assert_eq!(ChatMessage::assistant("c").role, MessageRole::Assistant);
    }

    #[test]
    fn roles_serialize_snake_case() {
        let message = ChatMessage::system("regras");
        let value = serde_json::to_value(&message).expect("serialize");
        assert_eq!(value["role"], "system");
        assert_eq!(value["content"], "regras");
    }
}
