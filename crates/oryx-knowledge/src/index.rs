use std::collections::HashMap;

use crate::{KnowledgeDoc, PromptContext, Snippet};

const BM25_K1: f32 = 1.2;
const BM25_B: f32 = 0.75;

/// In-memory lexical index over chunked knowledge docs. Ranking uses BM25
/// scoring with an id tiebreak so results are deterministic.
#[derive(Debug, Default)]
pub struct KnowledgeIndex {
    docs: Vec<KnowledgeDoc>,
    doc_tokens: Vec<HashMap<String, usize>>,
    doc_frequencies: HashMap<String, usize>,
    average_doc_len: f32,
}

impl KnowledgeIndex {
    pub fn build(docs: Vec<KnowledgeDoc>) -> Self {
        let mut doc_tokens = Vec::with_capacity(docs.len());
        let mut doc_frequencies = HashMap::<String, usize>::new();
        let mut total_doc_len = 0usize;

        for doc in &docs {
            let tokens = tokenize_text(&doc.content);
            total_doc_len = total_doc_len.saturating_add(tokens.len());
            let mut frequencies = HashMap::<String, usize>::new();
            for token in tokens {
                *frequencies.entry(token).or_default() += 1;
            }
            for term in frequencies.keys() {
                *doc_frequencies.entry(term.clone()).or_default() += 1;
            }
            doc_tokens.push(frequencies);
        }

        let average_doc_len = if docs.is_empty() {
            1.0
        } else {
            (total_doc_len as f32 / docs.len() as f32).max(1.0)
        };

        Self {
            docs,
            doc_tokens,
            doc_frequencies,
            average_doc_len,
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn retrieve(&self, query: &str, top_k: usize) -> Vec<Snippet> {
        if top_k == 0 || self.docs.is_empty() {
            return Vec::new();
        }
        let query_tokens = tokenize_text(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let doc_count = self.docs.len() as f32;
        let mut matches = Vec::new();
        for (doc, frequencies) in self.docs.iter().zip(&self.doc_tokens) {
            let doc_len = frequencies.values().sum::<usize>() as f32;
            if doc_len <= 0.0 {
                continue;
            }
            let mut score = 0.0f32;
            for term in &query_tokens {
                let term_frequency = *frequencies.get(term.as_str()).unwrap_or(&0) as f32;
                if term_frequency <= 0.0 {
                    continue;
                }
                let doc_frequency = *self.doc_frequencies.get(term.as_str()).unwrap_or(&0) as f32;
                if doc_frequency <= 0.0 {
                    continue;
                }
                let idf = (((doc_count - doc_frequency + 0.5) / (doc_frequency + 0.5)) + 1.0).ln();
                let normalization =
                    BM25_K1 * (1.0 - BM25_B + BM25_B * (doc_len / self.average_doc_len));
                let denominator = (term_frequency + normalization).max(f32::EPSILON);
                score += idf * ((term_frequency * (BM25_K1 + 1.0)) / denominator);
            }
            if score > 0.0 {
                matches.push(Snippet {
                    id: doc.id.clone(),
                    file: doc.file.clone(),
                    content: doc.content.clone(),
                    score,
                });
            }
        }

        matches.sort_by(|left, right| {
            right
                .score
                .total_cmp(&left.score)
                .then_with(|| left.id.cmp(&right.id))
        });
        matches.truncate(top_k);
        matches
    }

    pub fn build_prompt_context(&self, query: &str, top_k: usize) -> PromptContext {
        let snippets = self.retrieve(query, top_k);
        let context_text = crate::format_context(&snippets);
        PromptContext {
            snippets,
            context_text,
        }
    }
}

fn tokenize_text(text: &str) -> Vec<String> {
    text.split(|character: char| !character.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect::<Vec<_>>()
}
