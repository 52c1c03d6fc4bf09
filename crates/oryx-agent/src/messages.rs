//! Fixed user-facing texts and sentinel values used by the pipeline.

/// Reply for inputs shorter than two trimmed characters.
pub const CLARIFICATION_MESSAGE: &str =
    "Desculpe, não entendi. Pode me dar mais detalhes sobre o que você precisa?";

/// Sent when a handoff is activated, either on explicit request or on an
/// accepted offer.
pub const TRANSFER_MESSAGE: &str =
    "Certo! Estou transferindo você para um de nossos atendentes. Aguarde um momento, por favor.";

/// Sent when the user asks to come back to the bot during an active handoff.
pub const RESUME_MESSAGE: &str =
    "Pronto! Voltei a te atender por aqui. Como posso ajudar?";

/// Returned (never sent) while a human operator owns the conversation.
pub const HANDOFF_SENTINEL: &str = "__handoff_active__";

/// Introductory side message, gated by the 24h intro window.
pub const INTRO_MESSAGE: &str = "Olá! Eu sou o assistente virtual da Oryx. \
Posso tirar dúvidas sobre investimentos, produtos e atendimento. \
Se preferir falar com uma pessoa, é só pedir para falar com um atendente.";

/// Appended to generated answers produced without any retrieved context.
pub const NO_CONTEXT_DISCLAIMER: &str = "\n\nObservação: esta é uma resposta geral e pode não \
refletir a política exata da Oryx. Recomendo confirmar com um de nossos atendentes.";

/// Rules block appended to the system prompt when context snippets exist.
pub const CONTEXT_RULES: &str = "Regras: Responda APENAS com base no contexto quando aplicável. \
Se faltar informação, diga que não sabe e ofereça encaminhar para um humano.";
