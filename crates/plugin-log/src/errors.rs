// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors raised while shipping a batch of log lines or writing to a sink.
///
/// Every variant is local to the flush (or write) that produced it. None of
/// them cause the batch to be requeued: a failed batch is lost.
#[derive(Debug, thiserror::Error)]
pub enum ShipError {
    /// The drained batch could not be serialized into a push payload.
    #[error("could not encode log payload: {0}")]
    Encode(#[from] serde_json::Error),

    /// The push request could not be constructed (malformed endpoint or key).
    ///
    /// The transport logs this variant and reports success to its caller.
    #[error("could not create request: {0}")]
    RequestBuild(#[source] reqwest::Error),

    /// The HTTP exchange with the backend could not be completed.
    #[error("error making http request: {0}")]
    Network(#[source] reqwest::Error),

    /// The backend answered with a status code above 204.
    #[error("{status}")]
    Backend { status: u16 },

    /// The HTTP client itself could not be built.
    #[error("could not build http client: {0}")]
    Client(#[source] reqwest::Error),

    /// Writing to a local sink (stderr) failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
