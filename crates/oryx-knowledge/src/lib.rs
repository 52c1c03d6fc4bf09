//! Retrieval collaborator for the Oryx bot.
//!
//! Loads FAQ documents from a knowledge directory, splits them into
//! overlapping character chunks, and ranks them lexically for a query. The
//! pipeline only depends on the `retrieve`/`build_prompt_context` surface;
//! the ranking internals are free to change.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

mod chunker;
mod index;

pub use chunker::split_into_chunks;
pub use index::KnowledgeIndex;

pub const DEFAULT_CHUNK_SIZE: usize = 800;
pub const DEFAULT_CHUNK_OVERLAP: usize = 120;
pub const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, Clone)]
/// One indexed chunk of a knowledge document.
pub struct KnowledgeDoc {
    pub id: String,
    pub file: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
/// One ranked retrieval result.
pub struct Snippet {
    pub id: String,
    pub file: String,
    pub content: String,
    pub score: f32,
}

#[derive(Debug, Clone, Default)]
/// Retrieval output packaged for prompt composition.
pub struct PromptContext {
    pub snippets: Vec<Snippet>,
    pub context_text: String,
}

/// Recursively loads `.md`/`.txt` files under `dir` and chunks them.
/// Unreadable files are skipped; a missing directory yields no docs.
pub fn load_knowledge_docs(
    dir: &Path,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<KnowledgeDoc>> {
    let mut docs = Vec::new();
    if !dir.exists() {
        return Ok(docs);
    }

    let mut files = Vec::new();
    collect_knowledge_files(dir, &mut files)
        .with_context(|| format!("failed to scan knowledge directory {}", dir.display()))?;
    files.sort();

    for path in files {
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) => {
                debug!(path = %path.display(), %error, "skipping unreadable knowledge file");
                continue;
            }
        };
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown")
            .to_string();
        for (index, chunk) in split_into_chunks(&raw, chunk_size, chunk_overlap)
            .into_iter()
            .enumerate()
        {
            docs.push(KnowledgeDoc {
                id: format!("{file_name}:{index}"),
                file: file_name.clone(),
                content: chunk,
            });
        }
    }
    Ok(docs)
}

fn collect_knowledge_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            collect_knowledge_files(&path, files)?;
            continue;
        }
        let is_knowledge_file = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);
        if is_knowledge_file {
            files.push(path);
        }
    }
    Ok(())
}

/// Formats ranked snippets into the context block prepended to the system
/// prompt. Empty input yields an empty string so the pipeline can detect
/// the no-context case.
pub fn format_context(snippets: &[Snippet]) -> String {
    if snippets.is_empty() {
        return String::new();
    }
    let body = snippets
        .iter()
        .enumerate()
        .map(|(index, snippet)| format!("({}) [{}] {}", index + 1, snippet.file, snippet.content))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("Contexto (trechos do FAQ):\n{body}")
}
