// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mock upstreams standing in for the logs intake and the order webhook

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Request captured by a [`MockBackend`]
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct CapturedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    #[allow(dead_code)]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("captured body is not JSON")
    }
}

#[derive(Clone)]
struct BackendState {
    status: StatusCode,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// Upstream that records every request and answers with a fixed status
pub struct MockBackend {
    url: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

#[allow(dead_code)]
impl MockBackend {
    pub async fn start(status: StatusCode) -> Self {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let state = BackendState {
            status,
            captured: Arc::clone(&captured),
        };

        let app = Router::new().fallback(Self::handler).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("mock backend has no address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock backend server failed");
        });

        MockBackend {
            url: format!("http://{addr}"),
            captured,
        }
    }

    async fn handler(
        State(state): State<BackendState>,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> (StatusCode, &'static str) {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        state.captured.lock().unwrap().push(CapturedRequest {
            method,
            path: uri.path().to_string(),
            headers,
            body: body.to_vec(),
        });

        (state.status, "{}")
    }

    /// Base URL, without a trailing slash
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }
}
