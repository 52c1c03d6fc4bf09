//! Gateway router and webhook handlers.
//!
//! The inbound webhook is acknowledged immediately, before any pipeline
//! work, so the platform never times out and redelivers. Extracted text
//! messages are processed in a spawned task; per-message failures are
//! logged and the message dropped without a reply.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use oryx_agent::{ChatTransport, Orchestrator};

const CHAT_ENDPOINT: &str = "/chat";
const WEBHOOK_ENDPOINT: &str = "/webhook";
const CHAT_DEFAULT_USER_ID: &str = "local-test";
const CHAT_REPLY_CHANNEL: &str = "chat";

pub struct AppState {
    pub orchestrator: Orchestrator,
    pub transport: Arc<dyn ChatTransport>,
    pub verify_token: String,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_healthcheck))
        .route(WEBHOOK_ENDPOINT, get(handle_webhook_verify))
        .route(WEBHOOK_ENDPOINT, post(handle_webhook_event))
        .route(CHAT_ENDPOINT, post(handle_chat))
        .with_state(state)
}

async fn handle_healthcheck() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Meta webhook verification handshake: echoes the challenge when the mode
/// and token match, 403 otherwise.
async fn handle_webhook_verify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token").map(String::as_str);
    let challenge = params.get("hub.challenge").cloned().unwrap_or_default();

    if mode == Some("subscribe") && token == Some(state.verify_token.as_str()) {
        (StatusCode::OK, challenge).into_response()
    } else {
        (StatusCode::FORBIDDEN, "Forbidden").into_response()
    }
}

async fn handle_webhook_event(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Response {
    if body.get("entry").is_none() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "status": "ignored" }))).into_response();
    }

    let messages = extract_text_messages(&body);
    if !messages.is_empty() {
        tokio::spawn(process_inbound_messages(Arc::clone(&state), messages));
    }

    // Always a prompt 200, independent of downstream outcome.
    (StatusCode::OK, Json(json!({ "status": "received" }))).into_response()
}

#[derive(Debug, Deserialize)]
struct ChatRequestBody {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    message: String,
}

/// Test/debug entry point: runs the full pipeline as a dry run and returns
/// the would-be reply without delivering it.
async fn handle_chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequestBody>,
) -> Json<Value> {
    let text = body.message.trim().to_string();
    if text.is_empty() {
        return Json(json!({ "reply": "" }));
    }
    let user_id = body
        .user_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| CHAT_DEFAULT_USER_ID.to_string());

    match state
        .orchestrator
        .handle(&user_id, &text, CHAT_REPLY_CHANNEL, true)
        .await
    {
        Ok(reply) => Json(json!({ "reply": reply })),
        Err(error) => {
            error!(%error, user_id, "chat pipeline failed");
            Json(json!({ "reply": "" }))
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct InboundTextMessage {
    pub from: String,
    pub text: String,
    pub to_channel: String,
    pub message_id: Option<String>,
}

/// Pulls the text messages out of a Cloud API webhook envelope. Non-text
/// messages and entries missing expected fields are skipped.
pub(crate) fn extract_text_messages(body: &Value) -> Vec<InboundTextMessage> {
    let mut extracted = Vec::new();
    let entries = body.get("entry").and_then(Value::as_array);
    for entry in entries.into_iter().flatten() {
        let changes = entry.get("changes").and_then(Value::as_array);
        for change in changes.into_iter().flatten() {
            let value = change.get("value").cloned().unwrap_or_default();
            let to_channel = value
                .get("metadata")
                .and_then(|metadata| metadata.get("display_phone_number"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let messages = value.get("messages").and_then(Value::as_array);
            for message in messages.into_iter().flatten() {
                if message.get("type").and_then(Value::as_str) != Some("text") {
                    continue;
                }
                let Some(from) = message.get("from").and_then(Value::as_str) else {
                    continue;
                };
                let text = message
                    .get("text")
                    .and_then(|text| text.get("body"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                extracted.push(InboundTextMessage {
                    from: from.to_string(),
                    text,
                    to_channel: to_channel.clone(),
                    message_id: message
                        .get("id")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                });
            }
        }
    }
    extracted
}

async fn process_inbound_messages(state: Arc<AppState>, messages: Vec<InboundTextMessage>) {
    for message in messages {
        if let Some(message_id) = &message.message_id {
            if let Err(error) = state.transport.mark_read(message_id).await {
                warn!(message_id, %error, "failed to mark message as read");
            }
        }

        match state
            .orchestrator
            .handle(&message.from, &message.text, &message.to_channel, false)
            .await
        {
            Ok(reply) => {
                info!(from = message.from, reply_chars = reply.len(), "message processed");
            }
            Err(error) => {
                // No reply, no retry.
                error!(from = message.from, %error, "failed to process message");
            }
        }
    }
}
