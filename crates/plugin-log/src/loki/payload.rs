// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Loki push payload encoding.
//!
//! A batch becomes a single stream tagged with the shipper's labels:
//!
//! ```json
//! {"streams":[{"stream":{"app":"x"},"values":[["1700000000000000000","line"]]}]}
//! ```

use crate::errors::ShipError;
use crate::loki::buffer::LogEntry;
use crate::loki::labels::Labels;
use serde::ser::{Error as _, SerializeTuple};
use serde::{Serialize, Serializer};

#[derive(Serialize)]
struct Payload<'a> {
    streams: [Stream<'a>; 1],
}

#[derive(Serialize)]
struct Stream<'a> {
    stream: &'a Labels,
    values: &'a [LogEntry],
}

/// Each entry is a `[timestamp, line]` pair with the timestamp as a decimal string.
impl Serialize for LogEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let line = std::str::from_utf8(&self.value)
            .map_err(|e| S::Error::custom(format!("log line is not valid UTF-8: {e}")))?;
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.timestamp_nanos.to_string())?;
        pair.serialize_element(line)?;
        pair.end()
    }
}

/// Serializes `entries` as one stream labelled with `labels`.
///
/// Lines that are not valid UTF-8 cannot be carried in a JSON string; any such
/// line fails the whole batch.
pub fn encode(entries: &[LogEntry], labels: &Labels) -> Result<Vec<u8>, ShipError> {
    let payload = Payload {
        streams: [Stream {
            stream: labels,
            values: entries,
        }],
    };
    Ok(serde_json::to_vec(&payload)?)
}
