//! Per-call Groq client construction.
//!
//! The client is built at the point of use so a missing `GROQ_API_KEY` fails
//! the affected message instead of the whole process; the gateway keeps
//! accepting webhooks either way.

use async_trait::async_trait;

use oryx_ai::{AiError, ChatMessage, CompletionClient, GroqClient, GroqConfig};

pub struct DeferredGroqClient {
    config: GroqConfig,
}

impl DeferredGroqClient {
    pub fn new(config: GroqConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CompletionClient for DeferredGroqClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AiError> {
        let client = GroqClient::new(self.config.clone())?;
        client.complete(messages).await
    }
}
