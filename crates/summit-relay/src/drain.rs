// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log drain proxy: NDJSON batches in, one logs intake call out.
//!
//! Unlike the browser-facing relays, delivery here is not best-effort: an
//! intake failure is reported to the drain source as a 500.

use axum::{body::Bytes, extract::State, Json};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info};

use crate::error::{ApiError, RelayError};
use crate::log_record::{now_iso8601, truthy, IntakeFields, LogRecord};
use crate::server::RelayState;

const DDSOURCE: &str = "vercel";
const DDTAGS: &str = "env:production,service:datadog-game,project:pm-summit";
const HOSTNAME: &str = "game.pm-summit.xyz";
const SERVICE: &str = "datadog-game";
const FORWARD_FAILED: &str = "Failed to forward to Datadog";

/// Converts one drain line into a log record.
///
/// Object lines are laid over the drain defaults and win on collision. A line
/// that fails to parse, or parses to `null`, becomes a bare record carrying the
/// raw text. Other JSON values keep the defaults and add no fields.
pub fn parse_line(line: &str) -> LogRecord {
    let parsed = match serde_json::from_str::<Value>(line) {
        Ok(Value::Null) | Err(_) => return raw_record(line),
        Ok(parsed) => parsed,
    };

    let empty = Map::new();
    let fields = parsed.as_object().unwrap_or(&empty);
    let intake = IntakeFields {
        message: match truthy(fields, "message") {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => parsed.to_string(),
        },
        ddsource: DDSOURCE,
        ddtags: Some(DDTAGS.to_string()),
        hostname: Some(HOSTNAME),
        service: SERVICE,
        status: truthy(fields, "level")
            .cloned()
            .unwrap_or_else(|| Value::from("info")),
        timestamp: Some(
            truthy(fields, "timestamp")
                .cloned()
                .unwrap_or_else(|| Value::from(now_iso8601())),
        ),
    };

    match parsed {
        Value::Object(fields) => LogRecord::compose(intake, fields),
        _ => LogRecord::intake_only(intake),
    }
}

fn raw_record(line: &str) -> LogRecord {
    LogRecord::intake_only(IntakeFields {
        message: line.to_string(),
        ddsource: DDSOURCE,
        service: SERVICE,
        status: Value::from("info"),
        ..Default::default()
    })
}

/// Splits an NDJSON body into records, skipping blank lines
pub fn parse_batch(body: &str) -> Vec<LogRecord> {
    body.split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect()
}

pub async fn drain_logs(
    State(state): State<RelayState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let body = String::from_utf8_lossy(&body);
    let records = parse_batch(&body);
    debug!("DRAIN | Parsed {} records", records.len());

    match state.logs.send(&records).await {
        Ok(()) => {
            info!("DRAIN | Forwarded {} logs to Datadog", records.len());
            Ok(Json(json!({ "success": true, "count": records.len() })))
        }
        Err(RelayError::Rejected { status, body }) => {
            error!("DRAIN | Datadog error {status}: {body}");
            Err(ApiError::Upstream(FORWARD_FAILED.to_string()))
        }
        Err(e) => {
            error!("DRAIN | Drain error: {e}");
            Err(ApiError::Internal(e.to_string()))
        }
    }
}
