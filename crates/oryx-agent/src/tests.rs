//! Decision-pipeline behavior tests: guard ordering, handoff state machine,
//! offer windows, intro gating, caching, and failure policy.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use oryx_ai::{AiError, ChatMessage, CompletionClient};
use oryx_core::{current_unix_timestamp_ms, AuditLog, InteractionLog};
use oryx_knowledge::{KnowledgeDoc, KnowledgeIndex};
use oryx_session::{SessionStore, HANDOFF_OFFER_WINDOW_MS};

use super::*;

const USER: &str = "5511999990000";
const CHANNEL: &str = "5511888880000";

#[derive(Default)]
struct MockCompletion {
    reply: Mutex<String>,
    calls: AtomicUsize,
    fail: AtomicBool,
    last_messages: Mutex<Vec<ChatMessage>>,
}

impl MockCompletion {
    fn with_reply(reply: &str) -> Arc<Self> {
        let mock = Self::default();
        *mock.reply.lock().unwrap() = reply.to_string();
        Arc::new(mock)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_system_prompt(&self) -> String {
        self.last_messages
            .lock()
            .unwrap()
            .first()
            .map(|message| message.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages.to_vec();
        if self.fail.load(Ordering::SeqCst) {
            return Err(AiError::InvalidResponse("mock completion failure".to_string()));
        }
        Ok(self.reply.lock().unwrap().clone())
    }
}

#[derive(Default)]
struct RecordingTransport {
    sends: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

impl RecordingTransport {
    fn sent(&self) -> Vec<(String, String)> {
        self.sends.lock().unwrap().clone()
    }

    fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, to: &str, text: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("transport unavailable");
        }
        self.sends
            .lock()
            .unwrap()
            .push((to.to_string(), text.to_string()));
        Ok(())
    }
}

struct Harness {
    orchestrator: Orchestrator,
    completion: Arc<MockCompletion>,
    transport: Arc<RecordingTransport>,
    cache: Arc<ResponseCache>,
    sessions: SessionStore,
}

fn harness(dir: &Path, completion: Arc<MockCompletion>, index: KnowledgeIndex) -> Harness {
    let transport = Arc::new(RecordingTransport::default());
    let cache = Arc::new(ResponseCache::new());
    let sessions = SessionStore::new(dir);
    let orchestrator = Orchestrator::new(OrchestratorConfig {
        sessions: sessions.clone(),
        cache: Arc::clone(&cache),
        knowledge: Arc::new(index),
        completion: Arc::clone(&completion) as Arc<dyn CompletionClient>,
        transport: Arc::clone(&transport) as Arc<dyn ChatTransport>,
        interactions: InteractionLog::new(dir.join("interactions.csv")),
        audit: AuditLog::new(dir.join("audit.jsonl")),
        tone: Tone::Professional,
        retrieval_top_k: 3,
    });
    Harness {
        orchestrator,
        completion,
        transport,
        cache,
        sessions,
    }
}

fn empty_index() -> KnowledgeIndex {
    KnowledgeIndex::build(Vec::new())
}

fn faq_index() -> KnowledgeIndex {
    KnowledgeIndex::build(vec![KnowledgeDoc {
        id: "resgate.md:0".to_string(),
        file: "resgate.md".to_string(),
        content: "O prazo de resgate varia entre D+1 e D+30 conforme o fundo.".to_string(),
    }])
}

fn write_stale_offer(dir: &Path, user_id: &str) {
    let stale = current_unix_timestamp_ms() - HANDOFF_OFFER_WINDOW_MS - 1;
    std::fs::write(
        dir.join("sessions.json"),
        format!("{{\"{user_id}\":{{\"handoff_offer_at_unix_ms\":{stale}}}}}"),
    )
    .expect("write sessions.json");
}

#[tokio::test]
async fn too_short_input_asks_for_clarification_without_side_effects() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let h = harness(tempdir.path(), MockCompletion::with_reply("x"), empty_index());

    let reply = h
        .orchestrator
        .handle(USER, "  a ", CHANNEL, false)
        .await
        .expect("handle");

    assert_eq!(reply, CLARIFICATION_MESSAGE);
    assert_eq!(h.completion.calls(), 0);
    assert!(h.cache.is_empty());
    assert_eq!(h.sessions.get(USER), Default::default());
    assert_eq!(h.transport.sent_texts(), vec![CLARIFICATION_MESSAGE.to_string()]);
}

#[tokio::test]
async fn predefined_greeting_replies_without_model_and_sends_intro_once() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let h = harness(tempdir.path(), MockCompletion::with_reply("x"), empty_index());

    let reply = h
        .orchestrator
        .handle(USER, "oi", CHANNEL, false)
        .await
        .expect("handle");

    assert_eq!(reply, predefined_reply("oi").expect("table entry"));
    assert_eq!(h.completion.calls(), 0);
    let sent = h.transport.sent_texts();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], INTRO_MESSAGE);
    assert_eq!(sent[1], reply);
    assert!(h.sessions.get(USER).last_intro_at_unix_ms.is_some());

    // Second greeting inside the 24h window: canned reply only.
    h.orchestrator
        .handle(USER, "oi", CHANNEL, false)
        .await
        .expect("handle");
    let sent = h.transport.sent_texts();
    assert_eq!(sent.len(), 3);
    assert_ne!(sent[2], INTRO_MESSAGE);
}

#[tokio::test]
async fn predefined_match_is_case_and_prefix_tolerant() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let h = harness(tempdir.path(), MockCompletion::with_reply("x"), empty_index());

    let reply = h
        .orchestrator
        .handle(USER, "  Obrigado pela ajuda  ", CHANNEL, true)
        .await
        .expect("handle");
    assert_eq!(reply, predefined_reply("obrigado").expect("table entry"));
    assert_eq!(h.completion.calls(), 0);
}

#[tokio::test]
async fn generation_result_is_cached_and_replayed_without_second_call() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let h = harness(
        tempdir.path(),
        MockCompletion::with_reply("O prazo depende do fundo."),
        empty_index(),
    );

    let first = h
        .orchestrator
        .handle(USER, "Qual o prazo de resgate do fundo?", CHANNEL, true)
        .await
        .expect("first");
    let second = h
        .orchestrator
        .handle(USER, "qual o prazo de RESGATE do fundo?", CHANNEL, true)
        .await
        .expect("second");

    assert_eq!(first, second);
    assert_eq!(h.completion.calls(), 1);
}

#[tokio::test]
async fn handoff_state_machine_full_cycle() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let h = harness(tempdir.path(), MockCompletion::with_reply("x"), empty_index());

    // Explicit request from a fresh session activates the handoff.
    let reply = h
        .orchestrator
        .handle(USER, "quero falar com atendente", CHANNEL, true)
        .await
        .expect("request");
    assert_eq!(reply, TRANSFER_MESSAGE);
    assert!(h.sessions.is_handoff_active(USER));

    // While active, ordinary messages return the sentinel and skip the model.
    let reply = h
        .orchestrator
        .handle(USER, "qual o prazo de resgate?", CHANNEL, true)
        .await
        .expect("skipped");
    assert_eq!(reply, HANDOFF_SENTINEL);
    assert_eq!(h.completion.calls(), 0);

    // Returning to the bot clears the flag and confirms.
    let reply = h
        .orchestrator
        .handle(USER, "voltar ao bot", CHANNEL, true)
        .await
        .expect("resume");
    assert_eq!(reply, RESUME_MESSAGE);
    assert!(!h.sessions.is_handoff_active(USER));
}

#[tokio::test]
async fn wants_human_keyword_matches_inside_longer_text() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let h = harness(tempdir.path(), MockCompletion::with_reply("x"), empty_index());

    let reply = h
        .orchestrator
        .handle(USER, "quero falar com um humano", CHANNEL, true)
        .await
        .expect("handle");
    assert_eq!(reply, TRANSFER_MESSAGE);
    assert!(h.sessions.is_handoff_active(USER));
    assert_eq!(h.completion.calls(), 0);
}

#[tokio::test]
async fn escalating_reply_records_offer_and_acceptance_activates_handoff() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let h = harness(
        tempdir.path(),
        MockCompletion::with_reply(
            "Não tenho esse dado. Posso encaminhar você para um atendente.",
        ),
        empty_index(),
    );

    h.orchestrator
        .handle(USER, "qual a taxa do fundo xyz?", CHANNEL, true)
        .await
        .expect("generate");
    assert!(h.sessions.has_active_handoff_offer(USER));

    let reply = h
        .orchestrator
        .handle(USER, "sim", CHANNEL, true)
        .await
        .expect("accept");
    assert_eq!(reply, TRANSFER_MESSAGE);
    assert!(h.sessions.is_handoff_active(USER));
    assert!(!h.sessions.has_active_handoff_offer(USER));
}

#[tokio::test]
async fn rejection_clears_offer_and_falls_through_to_generation() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let h = harness(
        tempdir.path(),
        MockCompletion::with_reply("Entendido, sigo por aqui."),
        empty_index(),
    );

    h.sessions.set_handoff_offer(USER).expect("offer");
    let reply = h
        .orchestrator
        .handle(USER, "não quero por enquanto", CHANNEL, true)
        .await
        .expect("reject");

    assert!(!h.sessions.has_active_handoff_offer(USER));
    assert!(!h.sessions.is_handoff_active(USER));
    // The rejection itself still gets a generated answer.
    assert_eq!(h.completion.calls(), 1);
    assert!(reply.starts_with("Entendido, sigo por aqui."));
}

#[tokio::test]
async fn expired_offer_is_ignored_and_message_treated_normally() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    write_stale_offer(tempdir.path(), USER);
    let h = harness(
        tempdir.path(),
        MockCompletion::with_reply("Resposta comum."),
        empty_index(),
    );

    let reply = h
        .orchestrator
        .handle(USER, "sim", CHANNEL, true)
        .await
        .expect("handle");

    assert!(!h.sessions.is_handoff_active(USER));
    assert_eq!(h.completion.calls(), 1);
    assert!(reply.starts_with("Resposta comum."));
}

#[tokio::test]
async fn generation_without_context_appends_disclaimer() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let h = harness(
        tempdir.path(),
        MockCompletion::with_reply("Em geral o resgate leva alguns dias."),
        empty_index(),
    );

    let reply = h
        .orchestrator
        .handle(USER, "qual o prazo de resgate?", CHANNEL, true)
        .await
        .expect("handle");

    assert!(reply.starts_with("Em geral o resgate leva alguns dias."));
    assert!(reply.ends_with(NO_CONTEXT_DISCLAIMER));
    // Without snippets the rules block stays out of the system prompt.
    assert!(!h.completion.last_system_prompt().contains("Contexto"));
}

#[tokio::test]
async fn generation_with_context_injects_snippets_and_skips_disclaimer() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let h = harness(
        tempdir.path(),
        MockCompletion::with_reply("O prazo varia entre D+1 e D+30."),
        faq_index(),
    );

    let reply = h
        .orchestrator
        .handle(USER, "qual o prazo de resgate?", CHANNEL, true)
        .await
        .expect("handle");

    assert_eq!(reply, "O prazo varia entre D+1 e D+30.");
    let system_prompt = h.completion.last_system_prompt();
    assert!(system_prompt.contains("Contexto (trechos do FAQ):"));
    assert!(system_prompt.contains("[resgate.md]"));
    assert!(system_prompt.contains("Regras: Responda APENAS com base no contexto"));
}

#[tokio::test]
async fn empty_generation_sends_nothing_and_caches_nothing() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let h = harness(tempdir.path(), MockCompletion::with_reply("  "), empty_index());

    let reply = h
        .orchestrator
        .handle(USER, "pergunta sem resposta", CHANNEL, false)
        .await
        .expect("handle");

    assert_eq!(reply, "  ");
    assert!(h.transport.sent().is_empty());
    assert!(h.cache.is_empty());
}

#[tokio::test]
async fn completion_failure_propagates_without_cache_or_send() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let completion = MockCompletion::with_reply("nunca usado");
    completion.fail.store(true, Ordering::SeqCst);
    let h = harness(tempdir.path(), completion, empty_index());

    let result = h
        .orchestrator
        .handle(USER, "qual o prazo de resgate?", CHANNEL, false)
        .await;

    assert!(result.is_err());
    assert!(h.cache.is_empty());
    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn dry_run_applies_state_effects_but_sends_nothing() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let h = harness(
        tempdir.path(),
        MockCompletion::with_reply("Resposta gerada."),
        empty_index(),
    );

    let reply = h
        .orchestrator
        .handle(USER, "qual o prazo de resgate?", CHANNEL, true)
        .await
        .expect("generation");
    assert!(reply.starts_with("Resposta gerada."));
    assert!(!h.cache.is_empty());

    h.orchestrator
        .handle(USER, "oi", CHANNEL, true)
        .await
        .expect("greeting");
    assert!(h.sessions.get(USER).last_intro_at_unix_ms.is_some());

    assert!(h.transport.sent().is_empty());
}

#[tokio::test]
async fn send_failure_is_swallowed_and_logged() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let h = harness(
        tempdir.path(),
        MockCompletion::with_reply("Resposta gerada."),
        empty_index(),
    );
    h.transport.fail.store(true, Ordering::SeqCst);

    let reply = h
        .orchestrator
        .handle(USER, "qual o prazo de resgate?", CHANNEL, false)
        .await
        .expect("handle");

    assert!(reply.starts_with("Resposta gerada."));
    let audit = std::fs::read_to_string(tempdir.path().join("audit.jsonl")).expect("audit");
    assert!(audit.contains("send_failed"));
    let interactions =
        std::fs::read_to_string(tempdir.path().join("interactions.csv")).expect("csv");
    assert!(interactions.contains("qual o prazo de resgate?"));
}

#[tokio::test]
async fn interaction_log_records_processed_messages() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let h = harness(tempdir.path(), MockCompletion::with_reply("x"), empty_index());

    h.orchestrator
        .handle(USER, "oi", CHANNEL, true)
        .await
        .expect("handle");

    let contents =
        std::fs::read_to_string(tempdir.path().join("interactions.csv")).expect("read");
    assert!(contents.contains(USER));
    assert!(contents.contains(CHANNEL));
    assert!(contents.contains("oi"));
}

#[test]
fn escalation_heuristic_needs_verb_and_subject() {
    assert!(reply_suggests_escalation(
        "Posso encaminhar você para um atendente humano."
    ));
    assert!(reply_suggests_escalation(
        "Vou transferir sua solicitação para a equipe."
    ));
    assert!(!reply_suggests_escalation("Posso encaminhar o boleto por email."));
    assert!(!reply_suggests_escalation("Um atendente pode ajudar amanhã."));
    assert!(!reply_suggests_escalation(""));
}
