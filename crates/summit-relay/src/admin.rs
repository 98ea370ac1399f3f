// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Token-gated operator endpoint.
//!
//! There is no order store to query: accepted orders only exist in the log
//! output and at the webhook, so this endpoint answers with instructions for
//! finding them there.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http_utils::header_str;
use crate::server::RelayState;

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    pub token: Option<String>,
}

/// `token` query parameter when non-empty, else the `x-admin-token` header
fn presented_token<'a>(query: &'a AdminQuery, headers: &'a HeaderMap) -> Option<&'a str> {
    query
        .token
        .as_deref()
        .filter(|token| !token.is_empty())
        .or_else(|| header_str(headers, ADMIN_TOKEN_HEADER))
}

pub async fn view_orders(
    State(state): State<RelayState>,
    query: Result<Query<AdminQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    // An unreadable query string presents no token.
    let query = match query {
        Ok(Query(query)) => query,
        Err(e) => {
            debug!("ADMIN | Ignoring query string: {e}");
            AdminQuery::default()
        }
    };

    let Some(expected) = state.config.admin_token.as_deref() else {
        return Err(ApiError::Misconfigured {
            error: "ADMIN_TOKEN not configured. Set it in the relay environment.".to_string(),
            hint: "Export ADMIN_TOKEN before starting summit-relay-server".to_string(),
        });
    };

    if presented_token(&query, &headers) != Some(expected) {
        warn!("ADMIN | Rejected order view request with an invalid token");
        return Err(ApiError::Forbidden(
            "Unauthorized. Invalid admin token.".to_string(),
        ));
    }

    debug!("ADMIN | Serving order view instructions");
    Ok(Json(json!({
        "message": "Order viewing endpoint",
        "instructions": [
            "1. Orders are written to the relay log output",
            "2. Search the output for \"ORDERS | New order received\"",
            "3. Or find them in Datadog Log Explorer if the relay output is collected",
            "4. To persist orders, set ORDER_WEBHOOK_URL to a Google Sheets/Airtable webhook"
        ],
        "tip": "Set ORDER_WEBHOOK_URL in env vars to auto-send orders to Google Sheets"
    })))
}
