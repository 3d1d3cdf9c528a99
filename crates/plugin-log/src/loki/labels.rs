// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use std::collections::BTreeMap;

/// Fixed label set attached to every stream pushed by one shipper.
///
/// Keys are unique and kept sorted so encoded payloads are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    /// Parses a comma-separated list of `key:value` pairs.
    ///
    /// Pairs without a `:` are skipped. Only the segment right after the first
    /// `:` is kept as the value, so `a:b:c` yields `a -> b`. A repeated key keeps
    /// the last value.
    pub fn parse(input: &str) -> Self {
        let mut labels = BTreeMap::new();
        for pair in input.split(',') {
            let mut parts = pair.split(':');
            if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
                labels.insert(key.to_string(), value.to_string());
            }
        }
        Labels(labels)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Labels
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Labels(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
