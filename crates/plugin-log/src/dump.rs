// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Wire-style text renderings of HTTP messages for debug logs.

use hyper::http::header::HOST;
use hyper::http::{HeaderMap, Method, StatusCode, Version};
use std::fmt::Write;

/// Renders a request the way it would appear on an HTTP/1.x connection.
///
/// `host` is emitted as a `Host` header when the headers do not already carry one.
pub(crate) fn request(
    method: &Method,
    target: &str,
    host: Option<&str>,
    version: Version,
    headers: &HeaderMap,
    body: &[u8],
) -> String {
    let mut out = format!("{method} {target} {version:?}\r\n");
    if let Some(host) = host.filter(|_| !headers.contains_key(HOST)) {
        let _ = write!(out, "Host: {host}\r\n");
    }
    write_headers_and_body(&mut out, headers, body);
    out
}

/// Renders a response status line, headers and body.
pub(crate) fn response(
    status: StatusCode,
    version: Version,
    headers: &HeaderMap,
    body: &[u8],
) -> String {
    let mut out = format!("{version:?} {status}\r\n");
    write_headers_and_body(&mut out, headers, body);
    out
}

fn write_headers_and_body(out: &mut String, headers: &HeaderMap, body: &[u8]) {
    for (name, value) in headers {
        let _ = write!(out, "{name}: {}\r\n", String::from_utf8_lossy(value.as_bytes()));
    }
    out.push_str("\r\n");
    out.push_str(&String::from_utf8_lossy(body));
}
