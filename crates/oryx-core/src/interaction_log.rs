use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const CSV_HEADER: &str = "timestamp_iso,from_id,to_channel,user_text,bot_text";

/// One processed message, as recorded in the interaction CSV.
#[derive(Debug, Clone)]
pub struct InteractionRecord {
    pub timestamp_iso: String,
    pub from_id: String,
    pub to_channel: String,
    pub user_text: String,
    pub bot_text: String,
}

impl InteractionRecord {
    pub fn now(
        from_id: impl Into<String>,
        to_channel: impl Into<String>,
        user_text: impl Into<String>,
        bot_text: impl Into<String>,
    ) -> Self {
        Self {
            timestamp_iso: chrono::Utc::now().to_rfc3339(),
            from_id: from_id.into(),
            to_channel: to_channel.into(),
            user_text: user_text.into(),
            bot_text: bot_text.into(),
        }
    }
}

/// Append-only CSV log of every answered (or skipped) inbound message.
#[derive(Debug, Clone)]
pub struct InteractionLog {
    path: PathBuf,
}

impl InteractionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &InteractionRecord) -> Result<()> {
        self.ensure_file()?;
        let row = [
            record.timestamp_iso.as_str(),
            record.from_id.as_str(),
            record.to_channel.as_str(),
            record.user_text.as_str(),
            record.bot_text.as_str(),
        ]
        .iter()
        .map(|field| escape_csv_field(field))
        .collect::<Vec<_>>()
        .join(",");

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        writeln!(file, "{row}")
            .with_context(|| format!("failed to append {}", self.path.display()))?;
        file.flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        Ok(())
    }

    fn ensure_file(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        if !self.path.exists() {
            std::fs::write(&self.path, format!("{CSV_HEADER}\n"))
                .with_context(|| format!("failed to create {}", self.path.display()))?;
        }
        Ok(())
    }
}

fn escape_csv_field(value: &str) -> String {
    if value.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::fs::read_to_string;

    use super::*;

    fn sample(user_text: &str, bot_text: &str) -> InteractionRecord {
        InteractionRecord {
            timestamp_iso: "2026-01-01T00:00:00+00:00".to_string(),
            from_id: "5511999990000".to_string(),
            to_channel: "5511888880000".to_string(),
            user_text: user_text.to_string(),
            bot_text: bot_text.to_string(),
        }
    }

    #[test]
    fn first_append_writes_header() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let log = InteractionLog::new(tempdir.path().join("interactions.csv"));
        log.append(&sample("oi", "ola")).expect("append");

        let contents = read_to_string(log.path()).expect("read");
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(
            lines.next(),
            Some("2026-01-01T00:00:00+00:00,5511999990000,5511888880000,oi,ola")
        );
    }

    #[test]
    fn quotes_fields_with_separators_and_quotes() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let log = InteractionLog::new(tempdir.path().join("interactions.csv"));
        log.append(&sample("qual, o prazo?", "ele disse \"amanha\"\ncerto"))
            .expect("append");

        let contents = read_to_string(log.path()).expect("read");
        assert!(contents.contains("\"qual, o prazo?\""));
        assert!(contents.contains("\"ele disse \"\"amanha\"\"\ncerto\""));
    }

    #[test]
    fn header_written_once_across_appends() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let log = InteractionLog::new(tempdir.path().join("interactions.csv"));
        log.append(&sample("a1", "b1")).expect("append");
        log.append(&sample("a2", "b2")).expect("append");

        let contents = read_to_string(log.path()).expect("read");
        assert_eq!(contents.matches(CSV_HEADER).count(), 1);
        assert_eq!(contents.lines().count(), 3);
    }
}
