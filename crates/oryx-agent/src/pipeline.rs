use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use tracing::{debug, warn};

use oryx_ai::{ChatMessage, CompletionClient};
use oryx_core::{AuditLog, InteractionLog, InteractionRecord};
use oryx_knowledge::KnowledgeIndex;
use oryx_session::SessionStore;

use crate::cache::{cache_key, ResponseCache};
use crate::intent::{Intent, IntentClassifier};
use crate::messages::{
    CLARIFICATION_MESSAGE, CONTEXT_RULES, HANDOFF_SENTINEL, INTRO_MESSAGE,
    NO_CONTEXT_DISCLAIMER, RESUME_MESSAGE, TRANSFER_MESSAGE,
};
use crate::persona::Tone;
use crate::predefined::predefined_reply;
use crate::transport::ChatTransport;

const ESCALATION_VERBS: &[&str] = &["encaminhar", "transferir", "direcionar"];
const ESCALATION_SUBJECTS: &[&str] = &["atendente", "humano", "especialista", "equipe"];

/// True when a generated reply itself suggests escalating to a human: it
/// must mention both an escalation verb and an operator reference.
pub fn reply_suggests_escalation(raw_reply: &str) -> bool {
    let normalized = raw_reply.to_lowercase();
    ESCALATION_VERBS.iter().any(|verb| normalized.contains(verb))
        && ESCALATION_SUBJECTS
            .iter()
            .any(|subject| normalized.contains(subject))
}

/// Collaborators and settings injected into the orchestrator at startup.
pub struct OrchestratorConfig {
    pub sessions: SessionStore,
    pub cache: Arc<ResponseCache>,
    pub knowledge: Arc<KnowledgeIndex>,
    pub completion: Arc<dyn CompletionClient>,
    pub transport: Arc<dyn ChatTransport>,
    pub interactions: InteractionLog,
    pub audit: AuditLog,
    pub tone: Tone,
    pub retrieval_top_k: usize,
}

/// The decision pipeline. One `handle` call consumes one inbound event and
/// emits at most one terminal reply (plus, possibly, the intro side message).
pub struct Orchestrator {
    sessions: SessionStore,
    cache: Arc<ResponseCache>,
    knowledge: Arc<KnowledgeIndex>,
    completion: Arc<dyn CompletionClient>,
    transport: Arc<dyn ChatTransport>,
    interactions: InteractionLog,
    audit: AuditLog,
    classifier: IntentClassifier,
    tone: Tone,
    retrieval_top_k: usize,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            sessions: config.sessions,
            cache: config.cache,
            knowledge: config.knowledge,
            completion: config.completion,
            transport: config.transport,
            interactions: config.interactions,
            audit: config.audit,
            classifier: IntentClassifier,
            tone: config.tone,
            retrieval_top_k: config.retrieval_top_k,
        }
    }

    /// Runs the guard chain for one inbound `(user id, text)` event and
    /// returns the text that was (or, under `dry_run`, would have been)
    /// sent. Retrieval/completion failures propagate; the caller logs them
    /// and drops the message.
    pub async fn handle(
        &self,
        user_id: &str,
        text: &str,
        reply_channel: &str,
        dry_run: bool,
    ) -> Result<String> {
        let trimmed = text.trim();

        // Guard 1: too-short input. No session or cache effects.
        if trimmed.chars().count() < 2 {
            self.audit
                .append("message_ignored", json!({ "user_id": user_id, "reason": "too_short" }));
            self.deliver(user_id, CLARIFICATION_MESSAGE, dry_run).await;
            return Ok(CLARIFICATION_MESSAGE.to_string());
        }

        let normalized = trimmed.to_lowercase();

        // Guard 2: predefined table. Greeting triggers still get the intro
        // side message before the canned reply.
        if let Some(reply) = predefined_reply(&normalized) {
            self.maybe_send_intro(user_id, &normalized, dry_run).await?;
            self.deliver(user_id, reply, dry_run).await;
            self.log_interaction(user_id, reply_channel, trimmed, reply);
            self.audit
                .append("reply_predefined", json!({ "user_id": user_id, "cached": true }));
            return Ok(reply.to_string());
        }

        // Guard 3: response cache.
        let key = cache_key(trimmed);
        if let Some(cached) = self.cache.get(&key) {
            self.deliver(user_id, &cached, dry_run).await;
            self.log_interaction(user_id, reply_channel, trimmed, &cached);
            self.audit
                .append("reply_cached", json!({ "user_id": user_id, "cached": true }));
            return Ok(cached);
        }

        // Guard 4: a human operator owns this conversation.
        if self.sessions.is_handoff_active(user_id) {
            if self.classifier.matches(Intent::ReturnToBot, &normalized) {
                self.sessions.set_handoff(user_id, false)?;
                self.deliver(user_id, RESUME_MESSAGE, dry_run).await;
                self.log_interaction(user_id, reply_channel, trimmed, RESUME_MESSAGE);
                self.audit
                    .append("handoff_ended", json!({ "user_id": user_id }));
                return Ok(RESUME_MESSAGE.to_string());
            }
            // Intentionally not forwarded to the model; nothing is sent.
            self.log_interaction(user_id, reply_channel, trimmed, HANDOFF_SENTINEL);
            self.audit
                .append("handoff_message_skipped", json!({ "user_id": user_id }));
            return Ok(HANDOFF_SENTINEL.to_string());
        }

        // Guard 5: pending handoff offer inside the acceptance window.
        if self.sessions.has_active_handoff_offer(user_id) {
            if self.classifier.matches(Intent::AcceptOffer, &normalized) {
                self.sessions.clear_handoff_offer(user_id)?;
                self.sessions.set_handoff(user_id, true)?;
                self.deliver(user_id, TRANSFER_MESSAGE, dry_run).await;
                self.log_interaction(user_id, reply_channel, trimmed, TRANSFER_MESSAGE);
                self.audit
                    .append("handoff_offer_accepted", json!({ "user_id": user_id }));
                return Ok(TRANSFER_MESSAGE.to_string());
            }
            if self.classifier.matches(Intent::RejectOffer, &normalized) {
                self.sessions.clear_handoff_offer(user_id)?;
                self.audit
                    .append("handoff_offer_rejected", json!({ "user_id": user_id }));
                // Falls through: the rejection itself is answered normally.
            }
        }

        // Guard 6: explicit human request.
        if self.classifier.matches(Intent::WantsHuman, &normalized) {
            self.sessions.set_handoff(user_id, true)?;
            self.deliver(user_id, TRANSFER_MESSAGE, dry_run).await;
            self.log_interaction(user_id, reply_channel, trimmed, TRANSFER_MESSAGE);
            self.audit
                .append("handoff_started", json!({ "user_id": user_id }));
            return Ok(TRANSFER_MESSAGE.to_string());
        }

        // Guard 7: intro gating. Processing continues either way.
        self.maybe_send_intro(user_id, &normalized, dry_run).await?;

        // Guard 8: retrieval-augmented generation.
        let context = self
            .knowledge
            .build_prompt_context(trimmed, self.retrieval_top_k);
        let mut system_prompt = self.tone.system_prompt().to_string();
        if !context.context_text.is_empty() {
            system_prompt.push_str("\n\n");
            system_prompt.push_str(&context.context_text);
            system_prompt.push_str("\n\n");
            system_prompt.push_str(CONTEXT_RULES);
        }

        let raw_reply = self
            .completion
            .complete(&[
                ChatMessage::system(system_prompt),
                ChatMessage::user(trimmed),
            ])
            .await?;

        let final_reply = if context.snippets.is_empty() && !raw_reply.trim().is_empty() {
            format!("{raw_reply}{NO_CONTEXT_DISCLAIMER}")
        } else {
            raw_reply.clone()
        };

        // The final text is cached so a cache replay equals the first reply.
        if !raw_reply.trim().is_empty() {
            self.cache.put(&key, &final_reply);
        }

        if reply_suggests_escalation(&raw_reply) {
            self.sessions.set_handoff_offer(user_id)?;
            self.audit
                .append("handoff_offer_set", json!({ "user_id": user_id }));
        }

        if !final_reply.trim().is_empty() {
            self.deliver(user_id, &final_reply, dry_run).await;
        }
        self.log_interaction(user_id, reply_channel, trimmed, &final_reply);
        self.audit.append(
            "reply_generated",
            json!({ "user_id": user_id, "snippets": context.snippets.len() }),
        );
        Ok(final_reply)
    }

    async fn maybe_send_intro(
        &self,
        user_id: &str,
        normalized: &str,
        dry_run: bool,
    ) -> Result<()> {
        if !self.classifier.matches(Intent::Greeting, normalized) {
            return Ok(());
        }
        if !self.sessions.should_send_intro(user_id) {
            return Ok(());
        }
        self.deliver(user_id, INTRO_MESSAGE, dry_run).await;
        self.sessions.mark_intro_sent(user_id)?;
        self.audit
            .append("intro_sent", json!({ "user_id": user_id }));
        Ok(())
    }

    /// Sends through the transport unless dry-running. Send failures are
    /// audited and swallowed; the interaction log entry stands either way.
    async fn deliver(&self, user_id: &str, text: &str, dry_run: bool) {
        if dry_run {
            debug!(user_id, "dry run, skipping transport send");
            return;
        }
        if let Err(error) = self.transport.send_text(user_id, text).await {
            warn!(user_id, %error, "transport send failed");
            self.audit.append(
                "send_failed",
                json!({ "user_id": user_id, "reason": error.to_string() }),
            );
        }
    }

    fn log_interaction(&self, user_id: &str, reply_channel: &str, user_text: &str, bot_text: &str) {
        let record = InteractionRecord::now(user_id, reply_channel, user_text, bot_text);
        if let Err(error) = self.interactions.append(&record) {
            warn!(user_id, %error, "interaction log append failed");
        }
    }
}
