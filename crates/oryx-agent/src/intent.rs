//! Keyword-list intent classification behind an enumerable interface.
//!
//! The pipeline asks for one intent at a time so guard ordering stays in the
//! orchestrator; the phrase lists are an implementation detail that a
//! model-based classifier could replace without touching that ordering.

use crate::predefined::matches_trigger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// User intents the pipeline reacts to.
pub enum Intent {
    /// The user asks for a human operator.
    WantsHuman,
    /// The user asks to resume automated replies during an active handoff.
    ReturnToBot,
    /// The user accepts a pending handoff offer.
    AcceptOffer,
    /// The user declines a pending handoff offer.
    RejectOffer,
    /// The text opens with a greeting term.
    Greeting,
}

const WANTS_HUMAN_KEYWORDS: &[&str] = &[
    "atendente",
    "humano",
    "atendimento humano",
    "falar com uma pessoa",
    "pessoa de verdade",
];

const RETURN_TO_BOT_PHRASES: &[&str] = &[
    "voltar ao bot",
    "voltar para o bot",
    "falar com o bot",
    "encerrar atendimento",
];

const ACCEPT_OFFER_PHRASES: &[&str] = &["sim", "quero", "pode ser", "aceito", "ok"];

const REJECT_OFFER_PHRASES: &[&str] = &["nao", "não", "depois", "agora nao", "agora não"];

const GREETING_TERMS: &[&str] = &["oi", "ola", "olá", "bom dia", "boa tarde", "boa noite"];

#[derive(Debug, Clone, Copy, Default)]
/// Flat phrase-list classifier over normalized (trimmed, lower-cased) text.
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn matches(&self, intent: Intent, normalized: &str) -> bool {
        match intent {
            Intent::WantsHuman => WANTS_HUMAN_KEYWORDS
                .iter()
                .any(|keyword| normalized.contains(keyword)),
            Intent::ReturnToBot => RETURN_TO_BOT_PHRASES
                .iter()
                .any(|phrase| normalized.contains(phrase)),
            Intent::AcceptOffer => ACCEPT_OFFER_PHRASES
                .iter()
                .any(|phrase| matches_trigger(normalized, phrase)),
            Intent::RejectOffer => REJECT_OFFER_PHRASES
                .iter()
                .any(|phrase| matches_trigger(normalized, phrase)),
            Intent::Greeting => GREETING_TERMS
                .iter()
                .any(|term| matches_trigger(normalized, term)),
        }
    }
}
