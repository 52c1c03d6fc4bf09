use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

use crate::{AiError, ChatMessage, CompletionClient};

pub const DEFAULT_GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-70b-versatile";

const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_MAX_TOKENS: u32 = 250;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone)]
/// Connection settings for the Groq OpenAI-compatible chat endpoint.
pub struct GroqConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_ms: u64,
}

impl GroqConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_GROQ_API_BASE.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone)]
/// Groq chat-completions client. Collaborator failures are returned as-is;
/// callers never retry them automatically.
pub struct GroqClient {
    client: reqwest::Client,
    config: GroqConfig,
}

#[derive(Debug, Deserialize)]
struct CompletionsResponse {
    #[serde(default)]
    choices: Vec<CompletionsChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionsChoice {
    #[serde(default)]
    message: Option<CompletionsMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionsMessage {
    #[serde(default)]
    content: Option<String>,
}

impl GroqClient {
    pub fn new(config: GroqConfig) -> Result<Self, AiError> {
        if config.api_key.trim().is_empty() {
            return Err(AiError::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|e| AiError::InvalidResponse(format!("invalid API key header: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AiError> {
        let body = json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let response = self
            .client
            .post(self.completions_url())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionsResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    use super::*;

    fn test_client(server: &MockServer) -> GroqClient {
        let mut config = GroqConfig::new("test-key", "test-model");
        config.api_base = server.base_url();
        GroqClient::new(config).expect("client")
    }

    #[test]
    fn rejects_empty_api_key() {
        let result = GroqClient::new(GroqConfig::new("  ", "test-model"));
        assert!(matches!(result, Err(AiError::MissingApiKey)));
    }

    #[tokio::test]
    async fn extracts_first_choice_content() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer test-key")
                .json_body_partial(r#"{"model":"test-model","temperature":0.2,"max_tokens":250}"#);
            then.status(200).json_body(json!({
                "choices": [{ "message": { "role": "assistant", "content": "resposta" } }]
            }));
        });

        let client = test_client(&server);
        let reply = client
            .complete(&[ChatMessage::system("regras"), ChatMessage::user("oi")])
            .await
            .expect("complete");
        mock.assert();
        assert_eq!(reply, "resposta");
    }

    #[tokio::test]
    async fn empty_choices_yield_empty_string() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({ "choices": [] }));
        });

        let client = test_client(&server);
        let reply = client
            .complete(&[ChatMessage::user("oi")])
            .await
            .expect("complete");
        assert_eq!(reply, "");
    }

    #[tokio::test]
    async fn non_success_status_surfaces_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429).body("rate limited");
        });

        let client = test_client(&server);
        let error = client
            .complete(&[ChatMessage::user("oi")])
            .await
            .expect_err("should fail");
        match error {
            AiError::HttpStatus { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
