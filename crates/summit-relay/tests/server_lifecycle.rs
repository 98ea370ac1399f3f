// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Tests for the relay server over real TCP connections

mod common;

use axum::http::StatusCode;
use common::helpers::test_config;
use common::mocks::MockBackend;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use summit_relay::server::RelayServer;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_server_serves_and_shuts_down() {
    let intake = MockBackend::start(StatusCode::ACCEPTED).await;
    let config = Arc::new(test_config(intake.url()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown_token = CancellationToken::new();
    let server = RelayServer::new(config, shutdown_token.clone());
    let server_handle = tokio::spawn(async move { server.serve(listener).await });

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/api/drain"))
        .body("{\"message\":\"from the edge\"}\n")
        .send()
        .await
        .expect("request to relay failed");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "success": true, "count": 1 }));
    assert_eq!(intake.requests().len(), 1);

    shutdown_token.cancel();
    let result = timeout(Duration::from_secs(5), server_handle)
        .await
        .expect("server did not shut down")
        .expect("server task panicked");
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_start_fails_when_port_taken() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = test_config("http://127.0.0.1:1");
    config.host = "127.0.0.1".to_string();
    config.port = taken.local_addr().unwrap().port();

    let server = RelayServer::new(Arc::new(config), CancellationToken::new());
    assert!(server.start().await.is_err());
}
