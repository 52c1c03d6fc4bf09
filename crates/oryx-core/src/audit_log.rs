use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::warn;

/// Append-only JSONL stream of operational events (ignored messages, handoff
/// transitions, send failures). Writes are best-effort: a failed append is
/// logged and swallowed so audit problems never block message processing.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, event: &str, payload: Value) {
        if let Err(error) = self.try_append(event, payload) {
            warn!(event, %error, "audit append failed");
        }
    }

    fn try_append(&self, event: &str, payload: Value) -> Result<()> {
        let mut record = Map::new();
        record.insert("ts".to_string(), Value::String(chrono::Utc::now().to_rfc3339()));
        record.insert("event".to_string(), Value::String(event.to_string()));
        if let Value::Object(fields) = payload {
            for (key, value) in fields {
                record.insert(key, value);
            }
        }
        let line = serde_json::to_string(&Value::Object(record))
            .context("serialize audit record")?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        writeln!(file, "{line}")
            .with_context(|| format!("failed to append {}", self.path.display()))?;
        file.flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        Ok(())
    }
}
