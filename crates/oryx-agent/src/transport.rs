use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
/// Outbound edge of the pipeline. Implementations deliver text to the chat
/// channel; tests substitute a recording double.
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, to: &str, text: &str) -> Result<()>;

    /// Marks an inbound message as read. Best-effort; the default does
    /// nothing.
    async fn mark_read(&self, message_id: &str) -> Result<()> {
        let _ = message_id;
        Ok(())
    }
}
