// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use plugin_log::{Backend, Config, Logger};
use serde_json::Value;
use std::env;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
pub async fn main() {
    let log_level = env::var("PLUGIN_LOG_TAIL_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("warn".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,{log_level}");

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(&env_filter).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
    }

    let config = Config::from_env();
    let logger = match Logger::from_config(&config) {
        Ok(logger) => logger,
        Err(e) => {
            error!("Error creating logger: {e}");
            return;
        }
    };

    match config.backend {
        Backend::Loki => info!(
            "Shipping stdin to {} in batches of {}",
            config.loki.url, config.loki.buffer_size
        ),
        Backend::Console => info!("Writing stdin to the console"),
    }

    let count = match forward_lines(BufReader::new(io::stdin()), &logger).await {
        Ok(count) => count,
        Err((count, e)) => {
            error!("Failed to read stdin: {e}");
            count
        }
    };

    debug!("Read {count} lines, flushing");
    if let Err(e) = logger.flush().await {
        error!("Failed to flush remaining lines: {e}");
    }
}

/// Logs every line of `reader` at info level and returns how many were forwarded.
///
/// Lines that are not valid UTF-8 are forwarded with replacement characters.
/// A read error stops forwarding and is returned with the count so far.
async fn forward_lines<R>(mut reader: R, logger: &Logger) -> Result<u64, (u64, io::Error)>
where
    R: AsyncBufRead + Unpin,
{
    let mut count: u64 = 0;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => return Ok(count),
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                count += 1;
                logger
                    .info(&String::from_utf8_lossy(&buf), &[("source", Value::from("stdin"))])
                    .await;
            }
            Err(e) => return Err((count, e)),
        }
    }
}
