// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Leveled logging facade.
//!
//! Every call renders one JSON line and hands it to a [`Sink`]:
//!
//! ```text
//! {"level":"debug","time":"2024-05-01T10:00:00Z","req":"GET / HTTP/1.1","message":"plugin request"}
//! ```
//!
//! Console lines carry `time`. Lines sent to Loki do not, since each Loki entry
//! already has its own capture timestamp.

use crate::config::{Backend, Config};
use crate::errors::ShipError;
use crate::loki::LokiShipper;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::io::Write;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing::Level;

/// A key/value pair attached to a log line.
pub type Field<'a> = (&'a str, Value);

/// Destination of formatted log lines.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Accepts one formatted line and returns the number of bytes taken.
    async fn write(&self, line: &[u8]) -> Result<usize, ShipError>;

    /// Delivers anything the sink is still holding.
    async fn flush(&self) -> Result<(), ShipError> {
        Ok(())
    }
}

/// Writes lines to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

#[async_trait]
impl Sink for ConsoleSink {
    async fn write(&self, line: &[u8]) -> Result<usize, ShipError> {
        std::io::stderr().lock().write_all(line)?;
        Ok(line.len())
    }

    async fn flush(&self) -> Result<(), ShipError> {
        std::io::stderr().lock().flush()?;
        Ok(())
    }
}

#[async_trait]
impl Sink for LokiShipper {
    async fn write(&self, line: &[u8]) -> Result<usize, ShipError> {
        LokiShipper::write(self, line).await
    }

    async fn flush(&self) -> Result<(), ShipError> {
        LokiShipper::flush(self).await
    }
}

/// Leveled logger writing JSON lines to a [`Sink`].
///
/// Cheap to clone; clones share the sink.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn Sink>,
    level: LevelFilter,
    timestamps: bool,
}

impl Logger {
    #[must_use]
    pub fn new(sink: Arc<dyn Sink>, level: LevelFilter) -> Self {
        Logger {
            sink,
            level,
            timestamps: false,
        }
    }

    /// Logger writing timestamped lines to stderr.
    #[must_use]
    pub fn console(level: LevelFilter) -> Self {
        Logger::new(Arc::new(ConsoleSink), level).with_timestamps(true)
    }

    /// Builds the logger selected by `config`, creating the Loki shipper if needed.
    pub fn from_config(config: &Config) -> Result<Self, ShipError> {
        match config.backend {
            Backend::Console => Ok(Logger::console(config.level)),
            Backend::Loki => {
                let shipper = LokiShipper::from_config(&config.loki)?;
                Ok(Logger::new(Arc::new(shipper), config.level))
            }
        }
    }

    /// Adds an RFC 3339 `time` field to every line.
    #[must_use]
    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }

    #[must_use]
    pub fn level(&self) -> LevelFilter {
        self.level
    }

    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        self.level >= level
    }

    pub async fn trace(&self, msg: &str, fields: &[Field<'_>]) {
        self.log(Level::TRACE, msg, fields).await;
    }

    pub async fn debug(&self, msg: &str, fields: &[Field<'_>]) {
        self.log(Level::DEBUG, msg, fields).await;
    }

    pub async fn info(&self, msg: &str, fields: &[Field<'_>]) {
        self.log(Level::INFO, msg, fields).await;
    }

    pub async fn warn(&self, msg: &str, fields: &[Field<'_>]) {
        self.log(Level::WARN, msg, fields).await;
    }

    pub async fn error(&self, msg: &str, fields: &[Field<'_>]) {
        self.log(Level::ERROR, msg, fields).await;
    }

    /// Formats and writes one line if `level` is enabled.
    ///
    /// Sink errors are dropped: a failing backend loses lines silently.
    pub async fn log(&self, level: Level, msg: &str, fields: &[Field<'_>]) {
        if !self.enabled(level) {
            return;
        }
        let line = self.format(level, msg, fields);
        let _ = self.sink.write(&line).await;
    }

    /// Delivers lines still held by the sink, e.g. before the process exits.
    pub async fn flush(&self) -> Result<(), ShipError> {
        self.sink.flush().await
    }

    fn format(&self, level: Level, msg: &str, fields: &[Field<'_>]) -> Vec<u8> {
        let mut object = Map::with_capacity(fields.len() + 3);
        object.insert(
            "level".to_string(),
            Value::String(level.as_str().to_lowercase()),
        );
        if self.timestamps {
            object.insert(
                "time".to_string(),
                Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
        }
        for (key, value) in fields {
            object.insert((*key).to_string(), value.clone());
        }
        object.insert("message".to_string(), Value::String(msg.to_string()));

        let mut line = Value::Object(object).to_string().into_bytes();
        line.push(b'\n');
        line
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level)
            .field("timestamps", &self.timestamps)
            .finish_non_exhaustive()
    }
}
