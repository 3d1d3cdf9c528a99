// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::errors::ShipError;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use tracing::{debug, error};

/// Fixed per-request timeout for pushes.
pub const PUSH_TIMEOUT: Duration = Duration::from_secs(30);

/// Delivers an encoded payload to the log backend.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, payload: Vec<u8>) -> Result<(), ShipError>;
}

/// Builds a reqwest client with rustls TLS and the given timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, ShipError> {
    reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(timeout)
        .build()
        .map_err(ShipError::Client)
}

/// POSTs payloads to a Loki push endpoint with Basic authorization.
///
/// No retries: every outcome is final for the batch that was sent.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    key: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Result<Self, ShipError> {
        Ok(Self::with_client(build_client(PUSH_TIMEOUT)?, url, key))
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, url: impl Into<String>, key: impl Into<String>) -> Self {
        HttpTransport {
            client,
            url: url.into(),
            key: key.into(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: Vec<u8>) -> Result<(), ShipError> {
        let request = match self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Basic {}", self.key))
            .body(payload)
            .build()
        {
            Ok(request) => request,
            Err(e) => {
                // A bad endpoint or key is reported here and the batch is dropped.
                error!("LOKI | {}", ShipError::RequestBuild(e));
                return Ok(());
            }
        };

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                error!("LOKI | error making http request: {e}");
                return Err(ShipError::Network(e));
            }
        };

        let status = response.status();
        // Drain the body so the connection goes back to the pool.
        if let Err(e) = response.bytes().await {
            debug!("LOKI | Failed to read push response body: {e}");
        }

        if status.as_u16() > 204 {
            error!("LOKI | error making http request: {}", status.as_u16());
            return Err(ShipError::Backend {
                status: status.as_u16(),
            });
        }

        debug!("LOKI | Pushed log batch, status {}", status.as_u16());
        Ok(())
    }
}
