// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use summit_relay::config::RelayConfig;
use summit_relay::server::{make_router, RelayState};
use tower::ServiceExt;

/// Port nothing listens on, for unreachable upstreams
#[allow(dead_code)]
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1";

pub const TEST_API_KEY: &str = "test-api-key";

/// Relay configuration pointed at a mock logs intake
pub fn test_config(logs_intake_url: &str) -> RelayConfig {
    RelayConfig {
        api_key: Some(TEST_API_KEY.to_string()),
        logs_intake_url: logs_intake_url.to_string(),
        request_timeout_secs: 2,
        ..Default::default()
    }
}

pub fn router(config: RelayConfig) -> Router {
    let state = RelayState::new(Arc::new(config)).expect("Failed to build relay state");
    make_router(state)
}

/// Response pieces a test inspects
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Drives one request through the router without binding a socket
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    body: impl Into<Body>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(body.into()).expect("Failed to build request");

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");

    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body")
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

/// POSTs a JSON body
#[allow(dead_code)]
pub async fn post_json(router: &Router, uri: &str, body: &Value) -> TestResponse {
    send(
        router,
        Method::POST,
        uri,
        &[("content-type", "application/json")],
        body.to_string(),
    )
    .await
}
