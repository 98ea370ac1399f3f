// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP server wiring for the relay endpoints.
//!
//! # Endpoints
//!
//! - `POST/OPTIONS /api/log` - game telemetry relay
//! - `POST/OPTIONS /api/auth-log` - auth lifecycle relay
//! - `POST /api/drain` - NDJSON log drain
//! - `POST/OPTIONS /api/orders` - order intake
//! - `GET /api/admin/orders` - admin order view
//!
//! Handlers are stateless apart from [`RelayState`], which is built once from
//! the configuration and shared read-only.

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware::map_response,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::RelayConfig;
use crate::error::{method_not_allowed, RelayError};
use crate::forwarder::{LogsIntake, OrderWebhook};
use crate::http_utils::{cors, order_cors, preflight};
use crate::{admin, auth_events, drain, events, orders};

pub const EVENTS_PATH: &str = "/api/log";
pub const AUTH_EVENTS_PATH: &str = "/api/auth-log";
pub const DRAIN_PATH: &str = "/api/drain";
pub const ORDERS_PATH: &str = "/api/orders";
pub const ADMIN_ORDERS_PATH: &str = "/api/admin/orders";

type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// Shared, read-only state handed to every handler
#[derive(Debug, Clone)]
pub struct RelayState {
    pub config: Arc<RelayConfig>,
    pub logs: Arc<LogsIntake>,
    pub webhook: Option<Arc<OrderWebhook>>,
}

impl RelayState {
    pub fn new(config: Arc<RelayConfig>) -> Result<Self, RelayError> {
        let logs = Arc::new(LogsIntake::new(&config)?);
        let webhook = OrderWebhook::from_config(&config)?.map(Arc::new);
        Ok(RelayState {
            config,
            logs,
            webhook,
        })
    }
}

pub async fn handler_not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

pub fn make_router(state: RelayState) -> Router {
    let body_limit = state.config.max_request_content_length;

    let events_route = post(events::relay_event)
        .options(preflight)
        .fallback(method_not_allowed)
        .layer(map_response(cors));

    let auth_route = post(auth_events::relay_auth_event)
        .options(preflight)
        .fallback(method_not_allowed)
        .layer(map_response(cors));

    let orders_route = post(orders::submit_order)
        .options(preflight)
        .fallback(method_not_allowed)
        .layer(map_response(order_cors));

    Router::new()
        .route(EVENTS_PATH, events_route)
        .route(AUTH_EVENTS_PATH, auth_route)
        .route(
            DRAIN_PATH,
            post(drain::drain_logs).fallback(method_not_allowed),
        )
        .route(ORDERS_PATH, orders_route)
        .route(
            ADMIN_ORDERS_PATH,
            get(admin::view_orders)
                .head(method_not_allowed)
                .fallback(method_not_allowed),
        )
        .fallback(handler_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub struct RelayServer {
    config: Arc<RelayConfig>,
    shutdown_token: CancellationToken,
}

impl RelayServer {
    pub fn new(config: Arc<RelayConfig>, shutdown_token: CancellationToken) -> Self {
        RelayServer {
            config,
            shutdown_token,
        }
    }

    /// Binds the configured address and serves until shutdown
    pub async fn start(&self) -> Result<(), ServerError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        self.serve(listener).await
    }

    /// Serves on an already bound listener until the shutdown token is cancelled
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let now = Instant::now();

        let state = RelayState::new(Arc::clone(&self.config))?;
        debug!("RELAY | Logs intake: {}", self.config.logs_endpoint());
        match &state.webhook {
            Some(_) => debug!("RELAY | Order webhook configured"),
            None => debug!("RELAY | No order webhook configured"),
        }
        if let Some(email) = &self.config.order_notify_email {
            debug!("RELAY | ORDER_NOTIFY_EMAIL set to {email}, email notifications are not sent");
        }

        let router = make_router(state);
        info!("RELAY | Listening on {}", listener.local_addr()?);
        debug!("RELAY | Time taken to start: {} ms", now.elapsed().as_millis());

        axum::serve(listener, router)
            .with_graceful_shutdown(Self::graceful_shutdown(self.shutdown_token.clone()))
            .await?;
        Ok(())
    }

    async fn graceful_shutdown(shutdown_token: CancellationToken) {
        shutdown_token.cancelled().await;
        debug!("RELAY | Shutdown signal received, shutting down");
    }
}
