// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::config::LokiConfig;
use crate::errors::ShipError;
use crate::loki::buffer::{EntryBuffer, LogEntry};
use crate::loki::labels::Labels;
use crate::loki::payload;
use crate::loki::transport::{HttpTransport, Transport};
use std::sync::Arc;
use tracing::debug;

/// Buffered write sink that pushes batches of lines to Loki.
///
/// `write` is safe to call from any number of tasks. The caller whose write
/// fills the buffer pays for the push: it encodes and sends the detached batch
/// itself and receives the outcome. Pushes are not serialized against each
/// other, so two batches may be in flight at once with no ordering between them.
pub struct LokiShipper {
    buffer: EntryBuffer,
    labels: Arc<Labels>,
    transport: Arc<dyn Transport>,
}

impl LokiShipper {
    #[must_use]
    pub fn new(buffer_size: usize, labels: Labels, transport: Arc<dyn Transport>) -> Self {
        LokiShipper {
            buffer: EntryBuffer::new(buffer_size),
            labels: Arc::new(labels),
            transport,
        }
    }

    /// Builds a shipper that POSTs to the configured endpoint.
    pub fn from_config(config: &LokiConfig) -> Result<Self, ShipError> {
        let transport = HttpTransport::new(config.url.clone(), config.key.clone())?;
        Ok(Self::new(
            config.buffer_size,
            config.labels.clone(),
            Arc::new(transport),
        ))
    }

    /// Number of lines waiting for the next push.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Buffers `line` and, if that fills the buffer, pushes the batch.
    ///
    /// Returns the push outcome only on the call that triggered it. A failed
    /// batch is not requeued.
    pub async fn write(&self, line: &[u8]) -> Result<usize, ShipError> {
        if let Some(batch) = self.buffer.capture(line) {
            self.push(batch).await?;
        }
        Ok(line.len())
    }

    /// Pushes whatever is buffered, regardless of the threshold.
    pub async fn flush(&self) -> Result<(), ShipError> {
        let batch = self.buffer.drain();
        if batch.is_empty() {
            return Ok(());
        }
        self.push(batch).await
    }

    async fn push(&self, batch: Vec<LogEntry>) -> Result<(), ShipError> {
        let count = batch.len();
        // The batch is dropped here whatever happens next.
        let body = payload::encode(&batch, &self.labels)?;
        drop(batch);

        debug!("LOKI | Pushing {count} log lines");
        self.transport.send(body).await
    }
}

impl std::fmt::Debug for LokiShipper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LokiShipper")
            .field("buffer", &self.buffer)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}
