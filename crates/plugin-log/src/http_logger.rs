// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::config::ENV_LOGGER_HTTP;
use crate::dump;
use crate::logger::Logger;
use serde_json::Value;
use std::sync::Arc;

/// Decides, per request, whether traffic is dumped.
pub type EnabledFn = Arc<dyn Fn() -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub struct Options {
    /// Overrides the `GF_PLUGIN_LOGGER_HTTP` check.
    pub enabled_fn: Option<EnabledFn>,
}

/// Outgoing HTTP client that logs each request and response at debug level.
///
/// Request bodies must be in memory (not streamed) to show up in the dump.
/// Dumped responses are rebuilt from the buffered body, so the returned
/// response no longer reports the original URL.
#[derive(Clone)]
pub struct HttpLogger {
    plugin_id: String,
    client: reqwest::Client,
    logger: Logger,
    enabled: EnabledFn,
}

impl HttpLogger {
    #[must_use]
    pub fn new(plugin_id: impl Into<String>, client: reqwest::Client, logger: Logger) -> Self {
        Self::with_options(plugin_id, client, logger, Options::default())
    }

    #[must_use]
    pub fn with_options(
        plugin_id: impl Into<String>,
        client: reqwest::Client,
        logger: Logger,
        options: Options,
    ) -> Self {
        HttpLogger {
            plugin_id: plugin_id.into(),
            client,
            logger,
            enabled: options
                .enabled_fn
                .unwrap_or_else(|| Arc::new(enabled_from_env)),
        }
    }

    /// Sends `request`, dumping it and its response when logging is enabled.
    ///
    /// Transport errors are returned without being logged.
    pub async fn execute(&self, request: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        if !(self.enabled)() {
            return self.client.execute(request).await;
        }

        let request_dump = dump_request(&request);
        let response = self.client.execute(request).await?;

        self.logger
            .debug(
                "http request complete",
                &[
                    ("plugin", Value::from(self.plugin_id.as_str())),
                    ("req", Value::from(request_dump)),
                ],
            )
            .await;

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                self.logger
                    .debug("Could not dump http response", &[("err", Value::from(e.to_string()))])
                    .await;
                return Err(e);
            }
        };

        self.logger
            .debug(
                "http request complete",
                &[
                    ("plugin", Value::from(self.plugin_id.as_str())),
                    ("resp", Value::from(dump::response(status, version, &headers, &body))),
                ],
            )
            .await;

        let mut rebuilt = hyper::http::Response::new(body);
        *rebuilt.status_mut() = status;
        *rebuilt.version_mut() = version;
        *rebuilt.headers_mut() = headers;
        Ok(reqwest::Response::from(rebuilt))
    }
}

impl std::fmt::Debug for HttpLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLogger")
            .field("plugin_id", &self.plugin_id)
            .finish_non_exhaustive()
    }
}

fn enabled_from_env() -> bool {
    std::env::var(ENV_LOGGER_HTTP).is_ok_and(|val| val == "true")
}

fn dump_request(request: &reqwest::Request) -> String {
    let url = request.url();
    let target = match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    };
    let host = url.host_str().map(|host| match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    });
    let body = request
        .body()
        .and_then(reqwest::Body::as_bytes)
        .unwrap_or_default();
    dump::request(
        request.method(),
        &target,
        host.as_deref(),
        request.version(),
        request.headers(),
        body,
    )
}
