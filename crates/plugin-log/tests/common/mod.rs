// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use async_trait::async_trait;
use plugin_log::{ShipError, Sink};
use serde_json::Value;
use std::sync::Mutex;

/// Sink that keeps every line in memory.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<Vec<u8>>>,
}

impl MemorySink {
    pub fn lines(&self) -> Vec<Value> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .map(|line| serde_json::from_slice(line).expect("line is not JSON"))
            .collect()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn write(&self, line: &[u8]) -> Result<usize, ShipError> {
        self.lines.lock().unwrap().push(line.to_vec());
        Ok(line.len())
    }
}

/// Matches a push body with one stream labelled `labels_json` carrying `lines` in order.
pub fn push_body_regex(labels_json: &str, lines: &[&str]) -> String {
    let values = lines
        .iter()
        .map(|line| format!(r#"\["\d+","{line}"\]"#))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        r#"^\{{"streams":\[\{{"stream":{},"values":\[{values}\]\}}\]\}}$"#,
        regex::escape(labels_json)
    )
}
