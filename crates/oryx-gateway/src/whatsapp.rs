//! WhatsApp Cloud API transport client.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use oryx_agent::ChatTransport;

pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/v20.0";

/// The Cloud API rejects oversized bodies; longer texts are truncated with a
/// trailing ellipsis before sending.
const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    client: reqwest::Client,
    api_base: String,
    access_token: String,
    phone_number_id: String,
}

impl WhatsAppClient {
    pub fn new(access_token: impl Into<String>, phone_number_id: impl Into<String>) -> Self {
        Self::with_api_base(DEFAULT_GRAPH_API_BASE, access_token, phone_number_id)
    }

    pub fn with_api_base(
        api_base: impl Into<String>,
        access_token: impl Into<String>,
        phone_number_id: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            access_token: access_token.into(),
            phone_number_id: phone_number_id.into(),
        }
    }

    fn messages_url(&self) -> Result<String> {
        if self.phone_number_id.trim().is_empty() {
            bail!("WHATSAPP_PHONE_NUMBER_ID is not configured");
        }
        Ok(format!(
            "{}/{}/messages",
            self.api_base.trim_end_matches('/'),
            self.phone_number_id
        ))
    }

    async fn post_payload(&self, payload: serde_json::Value) -> Result<()> {
        if self.access_token.trim().is_empty() {
            bail!("WHATSAPP_ACCESS_TOKEN is not configured");
        }
        let url = self.messages_url()?;
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.access_token.trim())
            .json(&payload)
            .send()
            .await
            .context("whatsapp api request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("whatsapp api returned status {status}: {body}");
        }
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for WhatsAppClient {
    async fn send_text(&self, to: &str, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            bail!("refusing to send empty message to {to}");
        }
        let body = truncate_message(text);
        self.post_payload(json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": body },
        }))
        .await
    }

    async fn mark_read(&self, message_id: &str) -> Result<()> {
        debug!(message_id, "marking message as read");
        self.post_payload(json!({
            "messaging_product": "whatsapp",
            "status": "read",
            "message_id": message_id,
        }))
        .await
    }
}

fn truncate_message(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    let mut truncated = text.chars().take(MAX_MESSAGE_CHARS).collect::<String>();
    truncated.push_str("...");
    truncated
}
