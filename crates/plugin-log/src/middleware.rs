// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Request-logging middleware for the plugin's HTTP resource handlers.
//!
//! ```rust,ignore
//! let service = ServiceBuilder::new()
//!     .layer(RequestLogLayer::new(logger.clone(), config.request_logging))
//!     .service(handler);
//! ```

use crate::dump;
use crate::logger::Logger;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::http::header::HOST;
use hyper::http::Request;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Level;

/// Wraps services with [`RequestLog`].
#[derive(Clone, Debug)]
pub struct RequestLogLayer {
    logger: Logger,
    enabled: bool,
}

impl RequestLogLayer {
    #[must_use]
    pub fn new(logger: Logger, enabled: bool) -> Self {
        RequestLogLayer { logger, enabled }
    }
}

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLog<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLog {
            inner,
            logger: self.logger.clone(),
            enabled: self.enabled,
        }
    }
}

/// Logs every incoming request at debug level, then hands it to the inner service.
///
/// The body is buffered so it can be dumped; the inner service receives it
/// as a [`Full`] body with the same bytes.
#[derive(Clone, Debug)]
pub struct RequestLog<S> {
    inner: S,
    logger: Logger,
    enabled: bool,
}

impl<S, B> Service<Request<B>> for RequestLog<S>
where
    S: Service<Request<Full<Bytes>>> + Clone + Send + 'static,
    S::Future: Send,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: std::fmt::Display + Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        // Use the instance that was driven to readiness and leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let logger = self.logger.clone();
        let log_request = self.enabled && logger.enabled(Level::DEBUG);

        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    if log_request {
                        logger
                            .debug("Could not dump http request", &[("err", Value::from(e.to_string()))])
                            .await;
                    }
                    Bytes::new()
                }
            };

            if log_request {
                let target = parts
                    .uri
                    .path_and_query()
                    .map_or("/", |path_and_query| path_and_query.as_str());
                let host = parts
                    .uri
                    .authority()
                    .map(|authority| authority.as_str())
                    .filter(|_| !parts.headers.contains_key(HOST));
                let dumped = dump::request(
                    &parts.method,
                    target,
                    host,
                    parts.version,
                    &parts.headers,
                    &bytes,
                );
                logger.debug("plugin request", &[("req", Value::from(dumped))]).await;
            }

            inner.call(Request::from_parts(parts, Full::new(bytes))).await
        })
    }
}
