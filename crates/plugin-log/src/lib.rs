// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Leveled logging for plugin processes, with optional buffered shipping to Loki.
//!
//! ```rust,ignore
//! let config = Config::from_env();
//! let logger = Logger::from_config(&config)?;
//! logger.debug("query data request", &[("refId", "A".into())]).await;
//! logger.flush().await?;
//! ```
//!
//! - [`logger`]: the facade; renders JSON lines and writes them to a sink
//! - [`loki`]: the buffered shipper used when `GF_PLUGIN_LOGGER=loki`
//! - [`http_logger`]: dumps outgoing HTTP traffic through the facade
//! - [`middleware`]: dumps incoming HTTP requests through the facade

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod config;
mod dump;
pub mod errors;
pub mod http_logger;
pub mod logger;
pub mod loki;
pub mod middleware;

pub use config::{Backend, Config, LokiConfig};
pub use errors::ShipError;
pub use logger::{ConsoleSink, Field, Logger, Sink};
