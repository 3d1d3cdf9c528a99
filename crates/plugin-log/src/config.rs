// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::loki::Labels;
use std::env;
use tracing::level_filters::LevelFilter;

pub const ENV_LOGGER: &str = "GF_PLUGIN_LOGGER";
pub const ENV_LOGGER_URL: &str = "GF_PLUGIN_LOGGER_URL";
pub const ENV_LOGGER_KEY: &str = "GF_PLUGIN_LOGGER_KEY";
pub const ENV_LOGGER_BUFFER: &str = "GF_PLUGIN_LOGGER_BUFFER";
pub const ENV_LOGGER_LEVEL: &str = "GF_PLUGIN_LOGGER_LEVEL";
pub const ENV_LOGGER_LABELS: &str = "GF_PLUGIN_LOGGER_LABELS";
pub const ENV_LOGGER_HTTP: &str = "GF_PLUGIN_LOGGER_HTTP";
pub const ENV_LOGGER_REQUESTS: &str = "GF_PLUGIN_LOGGER_REQUESTS";

/// Where formatted log lines go.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// JSON lines on stderr.
    #[default]
    Console,
    /// Buffered pushes to a Loki endpoint.
    Loki,
}

impl Backend {
    fn parse(value: &str) -> Self {
        if value == "loki" {
            Backend::Loki
        } else {
            Backend::Console
        }
    }
}

/// Settings of the Loki shipper.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LokiConfig {
    /// Push endpoint, e.g. `https://logs.example.com/loki/api/v1/push`
    pub url: String,
    /// Placed verbatim after `Basic ` in the Authorization header
    pub key: String,
    /// Lines buffered before an automatic push; 0 disables automatic pushes
    pub buffer_size: usize,
    pub labels: Labels,
}

/// Logger configuration, resolved once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub backend: Backend,
    pub loki: LokiConfig,
    /// Most verbose level that is still written
    pub level: LevelFilter,
    /// Whether the HTTP round-trip debug logger dumps traffic
    pub http_logging: bool,
    /// Whether the request middleware dumps incoming requests
    pub request_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: Backend::Console,
            loki: LokiConfig::default(),
            level: level_from_verbosity(0),
            http_logging: false,
            request_logging: true,
        }
    }
}

impl Config {
    /// Reads the `GF_PLUGIN_LOGGER*` environment variables.
    ///
    /// Never fails: missing or unparsable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolves the configuration through `lookup` instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = lookup(ENV_LOGGER)
            .map(|val| Backend::parse(&val))
            .unwrap_or_default();

        let buffer_size = lookup(ENV_LOGGER_BUFFER)
            .and_then(|val| val.parse::<i64>().ok())
            .and_then(|val| usize::try_from(val).ok())
            .unwrap_or(0);

        let verbosity = lookup(ENV_LOGGER_LEVEL)
            .and_then(|val| val.parse::<i8>().ok())
            .unwrap_or(0);

        Config {
            backend,
            loki: LokiConfig {
                url: lookup(ENV_LOGGER_URL).unwrap_or_default(),
                key: lookup(ENV_LOGGER_KEY).unwrap_or_default(),
                buffer_size,
                labels: lookup(ENV_LOGGER_LABELS)
                    .map(|val| Labels::parse(&val))
                    .unwrap_or_default(),
            },
            level: level_from_verbosity(verbosity),
            http_logging: lookup(ENV_LOGGER_HTTP).is_some_and(|val| val == "true"),
            request_logging: lookup(ENV_LOGGER_REQUESTS)
                .map(|val| val.to_lowercase() != "false")
                .unwrap_or(true),
        }
    }
}

/// Maps a numeric verbosity onto a level filter.
///
/// `-1` (and below) is trace, `0` debug, `1` info, `2` warn, `3` to `5` error,
/// and `6` or more disables logging.
#[must_use]
pub fn level_from_verbosity(verbosity: i8) -> LevelFilter {
    match verbosity {
        i8::MIN..=-1 => LevelFilter::TRACE,
        0 => LevelFilter::DEBUG,
        1 => LevelFilter::INFO,
        2 => LevelFilter::WARN,
        3..=5 => LevelFilter::ERROR,
        6..=i8::MAX => LevelFilter::OFF,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
        assert_eq!(config.backend, Backend::Console);
        assert_eq!(config.level, LevelFilter::DEBUG);
        assert_eq!(config.loki.buffer_size, 0);
        assert!(config.loki.labels.is_empty());
        assert!(!config.http_logging);
        assert!(config.request_logging);
    }

    #[test]
    fn test_loki_backend() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_LOGGER, "loki"),
            (ENV_LOGGER_URL, "https://logs.example.com/loki/api/v1/push"),
            (ENV_LOGGER_KEY, "dXNlcjpwYXNz"),
            (ENV_LOGGER_BUFFER, "5"),
            (ENV_LOGGER_LEVEL, "1"),
            (ENV_LOGGER_LABELS, "env:prod,team"),
        ]));

        assert_eq!(config.backend, Backend::Loki);
        assert_eq!(config.loki.url, "https://logs.example.com/loki/api/v1/push");
        assert_eq!(config.loki.key, "dXNlcjpwYXNz");
        assert_eq!(config.loki.buffer_size, 5);
        assert_eq!(config.level, LevelFilter::INFO);
        assert_eq!(config.loki.labels, Labels::parse("env:prod"));
    }

    #[test]
    fn test_any_other_backend_is_console() {
        for value in ["console", "Loki", "", "stdout"] {
            let config = Config::from_lookup(lookup_from(&[(ENV_LOGGER, value)]));
            assert_eq!(config.backend, Backend::Console, "value {value:?}");
        }
    }

    #[test]
    fn test_buffer_size_falls_back_to_zero() {
        for value in ["abc", "-3", "0", ""] {
            let config = Config::from_lookup(lookup_from(&[(ENV_LOGGER_BUFFER, value)]));
            assert_eq!(config.loki.buffer_size, 0, "value {value:?}");
        }
        let config = Config::from_lookup(lookup_from(&[(ENV_LOGGER_BUFFER, "1000")]));
        assert_eq!(config.loki.buffer_size, 1000);
    }

    #[test]
    fn test_unparsable_level_is_debug() {
        for value in ["verbose", "300", "1.5"] {
            let config = Config::from_lookup(lookup_from(&[(ENV_LOGGER_LEVEL, value)]));
            assert_eq!(config.level, LevelFilter::DEBUG, "value {value:?}");
        }
    }

    #[test]
    fn test_level_from_verbosity() {
        assert_eq!(level_from_verbosity(-5), LevelFilter::TRACE);
        assert_eq!(level_from_verbosity(-1), LevelFilter::TRACE);
        assert_eq!(level_from_verbosity(0), LevelFilter::DEBUG);
        assert_eq!(level_from_verbosity(1), LevelFilter::INFO);
        assert_eq!(level_from_verbosity(2), LevelFilter::WARN);
        assert_eq!(level_from_verbosity(3), LevelFilter::ERROR);
        assert_eq!(level_from_verbosity(5), LevelFilter::ERROR);
        assert_eq!(level_from_verbosity(6), LevelFilter::OFF);
        assert_eq!(level_from_verbosity(7), LevelFilter::OFF);
    }

    #[test]
    fn test_http_logging_requires_exact_true() {
        let enabled = Config::from_lookup(lookup_from(&[(ENV_LOGGER_HTTP, "true")]));
        assert!(enabled.http_logging);
        for value in ["TRUE", "1", "yes"] {
            let config = Config::from_lookup(lookup_from(&[(ENV_LOGGER_HTTP, value)]));
            assert!(!config.http_logging, "value {value:?}");
        }
    }

    #[test]
    fn test_request_logging_can_be_disabled() {
        let config = Config::from_lookup(lookup_from(&[(ENV_LOGGER_REQUESTS, "FALSE")]));
        assert!(!config.request_logging);
        let config = Config::from_lookup(lookup_from(&[(ENV_LOGGER_REQUESTS, "true")]));
        assert!(config.request_logging);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var(ENV_LOGGER, "loki");
        env::set_var(ENV_LOGGER_BUFFER, "5");
        env::set_var(ENV_LOGGER_LABELS, "app:grafana");

        let config = Config::from_env();
        assert_eq!(config.backend, Backend::Loki);
        assert_eq!(config.loki.buffer_size, 5);
        assert_eq!(config.loki.labels.get("app"), Some("grafana"));

        env::remove_var(ENV_LOGGER);
        env::remove_var(ENV_LOGGER_BUFFER);
        env::remove_var(ENV_LOGGER_LABELS);
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        env::remove_var(ENV_LOGGER);
        env::remove_var(ENV_LOGGER_LEVEL);
        let config = Config::from_env();
        assert_eq!(config.backend, Backend::Console);
        assert_eq!(config.level, LevelFilter::DEBUG);
    }
}
