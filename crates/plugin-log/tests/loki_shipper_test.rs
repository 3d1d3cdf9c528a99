// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod common;

use common::push_body_regex;
use mockito::{Matcher, Server};
use plugin_log::config::{Backend, Config, LokiConfig};
use plugin_log::loki::{Labels, LokiShipper};
use plugin_log::{Logger, ShipError};
use std::sync::Arc;
use tracing::level_filters::LevelFilter;

fn loki_config(url: String, buffer_size: usize, labels: &str) -> LokiConfig {
    LokiConfig {
        url,
        key: "dXNlcjpwYXNz".to_string(),
        buffer_size,
        labels: Labels::parse(labels),
    }
}

#[tokio::test]
async fn ships_one_stream_when_threshold_is_reached() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/loki/api/v1/push")
        .match_header("content-type", "application/json")
        .match_header("authorization", "Basic dXNlcjpwYXNz")
        .match_body(Matcher::Regex(push_body_regex(
            r#"{"app":"x"}"#,
            &["a", "b", "c"],
        )))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let shipper = LokiShipper::from_config(&loki_config(
        format!("{}/loki/api/v1/push", server.url()),
        3,
        "app:x",
    ))
    .expect("failed to create shipper");

    for line in ["a", "b", "c"] {
        assert!(shipper.write(line.as_bytes()).await.is_ok());
    }

    mock.assert_async().await;
    assert_eq!(shipper.buffered(), 0);
}

#[tokio::test]
async fn backend_error_is_returned_to_the_triggering_write_only() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/loki/api/v1/push")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let shipper = LokiShipper::from_config(&loki_config(
        format!("{}/loki/api/v1/push", server.url()),
        2,
        "app:x",
    ))
    .expect("failed to create shipper");

    assert!(shipper.write(b"first").await.is_ok());
    let error = shipper.write(b"second").await.unwrap_err();
    assert!(matches!(error, ShipError::Backend { status: 500 }));
    assert!(error.to_string().contains("500"));
    assert_eq!(shipper.buffered(), 0);

    // a lost batch is not retried
    assert!(shipper.write(b"third").await.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_error() {
    let shipper = LokiShipper::from_config(&loki_config(
        "http://127.0.0.1:1/loki/api/v1/push".to_string(),
        2,
        "app:x",
    ))
    .expect("failed to create shipper");

    assert!(shipper.write(b"first").await.is_ok());
    let error = shipper.write(b"second").await.unwrap_err();
    assert!(matches!(error, ShipError::Network(_)), "got {error:?}");
    assert!(shipper.write(b"third").await.is_ok());
    assert_eq!(shipper.buffered(), 1);
}

#[tokio::test]
async fn flush_pushes_boundary_entries() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/push")
        .match_body(Matcher::Regex(push_body_regex(
            r#"{"env":"prod","team":"core"}"#,
            &["left over"],
        )))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let shipper = LokiShipper::from_config(&loki_config(
        format!("{}/push", server.url()),
        10,
        "team:core,env:prod,broken",
    ))
    .expect("failed to create shipper");

    shipper.write(b"left over").await.unwrap();
    shipper.flush().await.unwrap();
    shipper.flush().await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn logger_lines_reach_loki_without_time_field() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/loki/api/v1/push")
        .match_body(Matcher::Regex(
            r#"\["\d+","\{\\"level\\":\\"info\\",\\"plugin\\":\\"loki\\",\\"message\\":\\"started\\"\}\\n"\]"#
                .to_string(),
        ))
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let config = Config {
        backend: Backend::Loki,
        loki: loki_config(format!("{}/loki/api/v1/push", server.url()), 2, "app:x"),
        level: LevelFilter::INFO,
        ..Default::default()
    };
    let logger = Logger::from_config(&config).expect("failed to create logger");

    logger.debug("filtered out", &[]).await;
    logger.info("started", &[("plugin", "loki".into())]).await;
    logger.info("second", &[]).await;

    mock.assert_async().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_push_floor_of_total_batches() {
    const TASKS: usize = 6;
    const WRITES: usize = 20;
    const THRESHOLD: usize = 7;

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/push")
        .with_status(204)
        .expect((TASKS * WRITES) / THRESHOLD)
        .create_async()
        .await;

    let shipper = Arc::new(
        LokiShipper::from_config(&loki_config(format!("{}/push", server.url()), THRESHOLD, "app:x"))
            .expect("failed to create shipper"),
    );

    let handles = (0..TASKS)
        .map(|task| {
            let shipper = Arc::clone(&shipper);
            tokio::spawn(async move {
                for i in 0..WRITES {
                    shipper
                        .write(format!("task {task} line {i}").as_bytes())
                        .await
                        .expect("push failed");
                }
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.await.expect("writer task panicked");
    }

    mock.assert_async().await;
    assert_eq!(shipper.buffered(), (TASKS * WRITES) % THRESHOLD);
}
