//! Decision pipeline for the Oryx support bot.
//!
//! One inbound `(user id, text)` event enters `Orchestrator::handle`, walks a
//! fixed guard order (short input, predefined reply, cache, handoff state,
//! pending offer, explicit human request, intro gating) and either
//! short-circuits with a static or cached reply or falls through to the
//! retrieval-augmented generation branch. Side effects are the transport
//! send, the session mutations, the cache write, and the interaction/audit
//! logs; a dry run suppresses only the send.

mod cache;
mod intent;
mod messages;
mod persona;
mod pipeline;
mod predefined;
mod transport;

#[cfg(test)]
mod tests;

pub use cache::{cache_key, ResponseCache, RESPONSE_CACHE_TTL_MS};
pub use intent::{Intent, IntentClassifier};
pub use messages::{
    CLARIFICATION_MESSAGE, HANDOFF_SENTINEL, INTRO_MESSAGE, NO_CONTEXT_DISCLAIMER,
    RESUME_MESSAGE, TRANSFER_MESSAGE,
};
pub use persona::Tone;
pub use pipeline::{reply_suggests_escalation, Orchestrator, OrchestratorConfig};
pub use predefined::predefined_reply;
pub use transport::ChatTransport;
