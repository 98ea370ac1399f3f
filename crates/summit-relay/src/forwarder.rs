// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Outbound calls made by the relay endpoints.
//!
//! Every endpoint makes at most one call to the logs intake and, for orders,
//! one call to the webhook. Calls are not retried. Endpoints that treat a call
//! as best-effort go through [`BestEffort`], which logs the outcome and hands
//! nothing back to the caller.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::http_utils::build_client;
use crate::log_record::LogRecord;

/// Posts JSON bodies to a single URL
#[derive(Debug, Clone)]
pub struct JsonForwarder {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
}

impl JsonForwarder {
    pub fn new(
        url: String,
        headers: HeaderMap,
        proxy_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, RelayError> {
        let client =
            build_client(proxy_url, timeout).map_err(|e| RelayError::Client(e.to_string()))?;
        Ok(JsonForwarder {
            client,
            url,
            headers,
        })
    }

    /// Sends one POST; any 2xx is success.
    pub async fn post<T: Serialize + ?Sized>(&self, body: &T) -> Result<(), RelayError> {
        let time = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            debug!(
                "RELAY | Request to {} succeeded with {status} in {} ms",
                self.url,
                time.elapsed().as_millis()
            );
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(RelayError::Rejected { status, body })
    }
}

/// Client for the Datadog logs intake
#[derive(Debug, Clone)]
pub struct LogsIntake {
    forwarder: JsonForwarder,
    has_api_key: bool,
}

impl LogsIntake {
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        // A missing key is sent as an empty header; the intake rejects it.
        let api_key = config.api_key.as_deref().unwrap_or_default();
        let api_key = HeaderValue::from_str(api_key)
            .map_err(|e| RelayError::Client(format!("invalid DD_API_KEY: {e}")))?;
        headers.insert("DD-API-KEY", api_key);

        let forwarder = JsonForwarder::new(
            config.logs_endpoint(),
            headers,
            config.https_proxy.as_deref(),
            config.request_timeout(),
        )?;
        Ok(LogsIntake {
            forwarder,
            has_api_key: config.api_key.is_some(),
        })
    }

    /// Sends a batch of records in one call
    pub async fn send(&self, records: &[LogRecord]) -> Result<(), RelayError> {
        if !self.has_api_key {
            warn!("RELAY | DD_API_KEY not set, sending logs without an API key");
        }
        self.forwarder.post(records).await
    }
}

/// Client for the optional order webhook
#[derive(Debug, Clone)]
pub struct OrderWebhook {
    forwarder: JsonForwarder,
}

impl OrderWebhook {
    /// Returns `None` when no webhook URL is configured
    pub fn from_config(config: &RelayConfig) -> Result<Option<Self>, RelayError> {
        let Some(url) = config.order_webhook_url.clone() else {
            return Ok(None);
        };
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let forwarder = JsonForwarder::new(
            url,
            headers,
            config.https_proxy.as_deref(),
            config.request_timeout(),
        )?;
        Ok(Some(OrderWebhook { forwarder }))
    }

    pub async fn send<T: Serialize + ?Sized>(&self, payload: &T) -> Result<(), RelayError> {
        self.forwarder.post(payload).await
    }
}

/// A delivery whose result is logged and never propagated
pub struct BestEffort {
    label: &'static str,
}

impl BestEffort {
    pub const fn new(label: &'static str) -> Self {
        BestEffort { label }
    }

    pub async fn deliver<F>(&self, delivery: F)
    where
        F: Future<Output = Result<(), RelayError>>,
    {
        match delivery.await {
            Ok(()) => debug!("{} | Delivered", self.label),
            Err(e @ RelayError::Rejected { .. }) => {
                error!("{} | Delivery rejected: {e}", self.label)
            }
            Err(e) => error!("{} | Delivery failed: {e}", self.label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_record::IntakeFields;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use tracing_test::traced_test;

    fn config_for(url: String) -> RelayConfig {
        RelayConfig {
            api_key: Some("mock-api-key".to_string()),
            logs_intake_url: url,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn logs_intake_sends_api_key_and_batch() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/logs")
            .match_header("DD-API-KEY", "mock-api-key")
            .match_header("Content-Type", "application/json")
            .match_body(Matcher::Json(json!([{
                "message": "m",
                "ddsource": "vercel",
                "service": "datadog-game",
                "status": "info"
            }])))
            .with_status(202)
            .create_async()
            .await;

        let intake = LogsIntake::new(&config_for(server.url())).unwrap();
        let record = LogRecord::intake_only(IntakeFields {
            message: "m".to_string(),
            ddsource: "vercel",
            service: "datadog-game",
            status: json!("info"),
            ..Default::default()
        });
        intake.send(&[record]).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    #[traced_test]
    async fn logs_intake_missing_key_sends_empty_header() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/logs")
            .match_header("DD-API-KEY", "")
            .with_status(403)
            .create_async()
            .await;

        let config = RelayConfig {
            api_key: None,
            ..config_for(server.url())
        };
        let intake = LogsIntake::new(&config).unwrap();
        let result = intake.send(&[]).await;
        mock.assert_async().await;
        match result {
            Err(RelayError::Rejected { status, .. }) => assert_eq!(status, 403),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(logs_contain("DD_API_KEY not set"));
    }

    #[tokio::test]
    async fn webhook_absent_without_url() {
        let webhook = OrderWebhook::from_config(&RelayConfig::default()).unwrap();
        assert!(webhook.is_none());
    }

    #[tokio::test]
    async fn webhook_connection_refused_is_transport_error() {
        let config = RelayConfig {
            order_webhook_url: Some("http://127.0.0.1:1/hook".to_string()),
            ..Default::default()
        };
        let webhook = OrderWebhook::from_config(&config).unwrap().unwrap();
        let result = webhook.send(&json!({ "orderId": "ORD-000000000000" })).await;
        assert!(matches!(result, Err(RelayError::Transport(_))));
    }

    #[tokio::test]
    #[traced_test]
    async fn best_effort_logs_rejection() {
        BestEffort::new("ORDERS")
            .deliver(async {
                Err(RelayError::Rejected {
                    status: reqwest::StatusCode::BAD_GATEWAY,
                    body: "upstream down".to_string(),
                })
            })
            .await;
        assert!(logs_contain("ORDERS | Delivery rejected"));
        assert!(logs_contain("upstream down"));
    }
}
