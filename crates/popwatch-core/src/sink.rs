//! Emission sinks: where each cycle's records and failures go.

use std::future::Future;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, mpsc};
use tracing::warn;

use crate::record::EmittedRecord;
use crate::{Error, Result};

/// Receives the output of poll cycles.
pub trait EmissionSink: Send + Sync {
    /// Delivers one cycle's records. Never called with an empty batch.
    fn deliver(&self, batch: Vec<EmittedRecord>) -> impl Future<Output = Result<()>> + Send;

    /// Reports that a cycle failed.
    fn report_failure(&self, error: &Error) -> impl Future<Output = ()> + Send;
}

/// Event sent by [`ChannelSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// A batch of new messages.
    Records(Vec<EmittedRecord>),
    /// A cycle failed with this message.
    Failed(String),
}

/// Forwards cycle output over a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<PollEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiver for its events.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PollEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl EmissionSink for ChannelSink {
    async fn deliver(&self, batch: Vec<EmittedRecord>) -> Result<()> {
        self.tx
            .send(PollEvent::Records(batch))
            .await
            .map_err(|_| Error::Sink("receiver dropped".into()))
    }

    async fn report_failure(&self, error: &Error) {
        if self.tx.send(PollEvent::Failed(error.to_string())).await.is_err() {
            warn!("Failure report dropped: receiver gone");
        }
    }
}

/// Writes each record as one JSON line.
///
/// Failures are logged, not written.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W> JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W> EmissionSink for JsonLinesSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn deliver(&self, batch: Vec<EmittedRecord>) -> Result<()> {
        let mut out = Vec::new();
        for record in &batch {
            serde_json::to_writer(&mut out, record)?;
            out.push(b'\n');
        }

        let mut writer = self.writer.lock().await;
        writer.write_all(&out).await?;
        writer.flush().await?;
        Ok(())
    }

    async fn report_failure(&self, error: &Error) {
        warn!(error = %error, "Poll cycle failed");
    }
}
