use crate::error::SinkError;
use async_trait::async_trait;
use model::events::sync::SyncMessage;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt, Stdout},
    sync::Mutex,
};

/// Downstream consumer of sync messages, in delivery order.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Delivers one message. Returning `Ok` means the message is handed off
    /// for good; the caller may checkpoint past it.
    async fn emit(&self, message: SyncMessage) -> Result<(), SinkError>;
}

/// Writes one JSON envelope per line and flushes after every message.
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl JsonLinesSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl<W> Sink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn emit(&self, message: SyncMessage) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(&message.to_json())?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Collects messages in memory.
#[derive(Default)]
pub struct MemorySink {
    messages: Mutex<Vec<SyncMessage>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<SyncMessage> {
        self.messages.lock().await.clone()
    }

    pub async fn take(&self) -> Vec<SyncMessage> {
        std::mem::take(&mut *self.messages.lock().await)
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn emit(&self, message: SyncMessage) -> Result<(), SinkError> {
        self.messages.lock().await.push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::identifiers::{StreamId, Version};

    fn activate(v: i64) -> SyncMessage {
        SyncMessage::ActivateVersion {
            stream: StreamId::new("s"),
            version: Version::new(v),
        }
    }

    #[tokio::test]
    async fn json_lines_are_newline_delimited_envelopes() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.emit(activate(1)).await.unwrap();
        sink.emit(activate(2)).await.unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "ACTIVATE_VERSION");
        assert_eq!(lines[1]["version"], 2);
    }

    #[tokio::test]
    async fn memory_sink_keeps_delivery_order() {
        let sink = MemorySink::new();
        sink.emit(activate(1)).await.unwrap();
        sink.emit(activate(2)).await.unwrap();
        assert_eq!(sink.take().await, vec![activate(1), activate(2)]);
        assert!(sink.messages().await.is_empty());
    }
}
