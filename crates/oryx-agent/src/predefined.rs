//! Static trigger-to-reply table for greetings, thanks, and farewells.

/// Lower-case literal triggers paired with their fixed replies. A trigger
/// matches on exact equality or as a prefix followed by a space.
const PREDEFINED_RESPONSES: &[(&str, &str)] = &[
    ("oi", "Oi! Como posso ajudar você hoje?"),
    ("ola", "Olá! Como posso ajudar você hoje?"),
    ("olá", "Olá! Como posso ajudar você hoje?"),
    ("bom dia", "Bom dia! Como posso ajudar você hoje?"),
    ("boa tarde", "Boa tarde! Como posso ajudar você hoje?"),
    ("boa noite", "Boa noite! Como posso ajudar você hoje?"),
    ("obrigado", "De nada! Estou à disposição se precisar de mais alguma coisa."),
    ("obrigada", "De nada! Estou à disposição se precisar de mais alguma coisa."),
    ("valeu", "De nada! Estou à disposição se precisar de mais alguma coisa."),
    ("tchau", "Até logo! Conte com a gente sempre que precisar."),
    ("até logo", "Até logo! Conte com a gente sempre que precisar."),
    ("ate logo", "Até logo! Conte com a gente sempre que precisar."),
    ("até mais", "Até logo! Conte com a gente sempre que precisar."),
    ("ate mais", "Até logo! Conte com a gente sempre que precisar."),
];

/// Looks up a fixed reply for already-normalized (trimmed, lower-cased) text.
pub fn predefined_reply(normalized: &str) -> Option<&'static str> {
    PREDEFINED_RESPONSES
        .iter()
        .find(|(trigger, _)| matches_trigger(normalized, trigger))
        .map(|(_, reply)| *reply)
}

pub(crate) fn matches_trigger(normalized: &str, trigger: &str) -> bool {
    normalized == trigger
        || normalized
            .strip_prefix(trigger)
            .is_some_and(|rest| rest.starts_with(' '))
}
