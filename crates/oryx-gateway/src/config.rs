//! Environment-style configuration for the gateway process.

use oryx_ai::GroqConfig;
use oryx_knowledge::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_TOP_K};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GROQ_MODEL: &str = "llama-3.1-70b-versatile";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub agent_tone: String,
    pub retrieval_top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub groq_api_key: String,
    pub groq_model: String,
    pub whatsapp_verify_token: String,
    pub whatsapp_access_token: String,
    pub whatsapp_phone_number_id: String,
}

impl GatewayConfig {
    /// Reads the process environment. Missing credentials are not fatal
    /// here; each collaborator surfaces its own configuration error at the
    /// point of use.
    pub fn from_env() -> Self {
        Self {
            port: non_empty_env_var("PORT")
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            agent_tone: non_empty_env_var("AGENT_TONE").unwrap_or_default(),
            retrieval_top_k: non_empty_env_var("RAG_TOP_K")
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_TOP_K),
            chunk_size: non_empty_env_var("RAG_CHUNK_SIZE")
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            chunk_overlap: non_empty_env_var("RAG_CHUNK_OVERLAP")
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_CHUNK_OVERLAP),
            groq_api_key: non_empty_env_var("GROQ_API_KEY").unwrap_or_default(),
            groq_model: non_empty_env_var("GROQ_MODEL")
                .unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string()),
            whatsapp_verify_token: non_empty_env_var("WHATSAPP_VERIFY_TOKEN").unwrap_or_default(),
            whatsapp_access_token: non_empty_env_var("WHATSAPP_ACCESS_TOKEN").unwrap_or_default(),
            whatsapp_phone_number_id: non_empty_env_var("WHATSAPP_PHONE_NUMBER_ID")
                .unwrap_or_default(),
        }
    }

    pub fn groq_config(&self) -> GroqConfig {
        GroqConfig::new(self.groq_api_key.clone(), self.groq_model.clone())
    }
}

fn non_empty_env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
