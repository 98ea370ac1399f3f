// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Game telemetry relay: one client event in, one log record out.

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{error, info};

use crate::error::ApiError;
use crate::forwarder::BestEffort;
use crate::http_utils::{client_ip, event_id, parse_json_fields, user_agent};
use crate::log_record::{display_value, now_iso8601, truthy, truthy_or, IntakeFields, LogRecord};
use crate::server::RelayState;

const DDSOURCE: &str = "vercel-game";
const DDTAGS_PREFIX: &str = "env:production,service:datadog-game,project:pm-summit-game";
const HOSTNAME: &str = "game.pm-summit.xyz";
const SERVICE: &str = "datadog-game";
const FAILURE_MESSAGE: &str = "Failed to log event";
const CLICK_TEXT_LIMIT: usize = 30;

const RELAY: BestEffort = BestEffort::new("EVENTS");

/// A normalized game event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    pub timestamp: Value,
    pub event: Value,
    pub session_id: Value,
    pub page: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<Value>,
    pub ip: String,
    pub data: Value,
}

impl GameEvent {
    pub fn from_request(fields: &Map<String, Value>, headers: &HeaderMap) -> Self {
        GameEvent {
            timestamp: truthy(fields, "timestamp")
                .cloned()
                .unwrap_or_else(|| Value::from(now_iso8601())),
            event: truthy_or(fields, "event", "unknown"),
            session_id: truthy_or(fields, "sessionId", "anonymous"),
            page: truthy_or(fields, "page", "/"),
            user_agent: user_agent(fields, headers),
            ip: client_ip(headers),
            data: truthy(fields, "data")
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new())),
        }
    }

    pub fn name(&self) -> String {
        display_value(&self.event)
    }

    fn entry(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// The line written to process output for log capture
    pub fn console_line(&self) -> Value {
        let mut line = Map::new();
        line.insert("level".into(), Value::from("info"));
        line.insert(
            "message".into(),
            Value::from(format!("[GAME_EVENT] {}", self.name())),
        );
        line.extend(self.entry());
        Value::Object(line)
    }

    pub fn log_record(&self) -> LogRecord {
        let name = self.name();
        let intake = IntakeFields {
            message: format!("[GAME_EVENT] {name}: {}", self.data),
            ddsource: DDSOURCE,
            ddtags: Some(format!("{DDTAGS_PREFIX},event_type:{name}")),
            hostname: Some(HOSTNAME),
            service: SERVICE,
            status: Value::from("info"),
            timestamp: None,
        };
        LogRecord::compose(intake, self.entry())
    }
}

/// Human-readable summary of well-known event types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetail {
    pub is_error: bool,
    pub line: String,
}

fn data_field(data: &Value, key: &str) -> String {
    data.get(key)
        .map(display_value)
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn describe_event(event: &str, data: &Value) -> EventDetail {
    let line = match event {
        "page_view" => format!(
            "PAGE_VIEW: User viewed {}",
            data.get("page")
                .filter(|v| crate::log_record::is_truthy(v))
                .map(display_value)
                .unwrap_or_else(|| "game page".to_string())
        ),
        "game_start" => format!("GAME_START: User started {}", data_field(data, "game")),
        "game_action" => format!(
            "GAME_ACTION: {} - {}",
            data_field(data, "game"),
            data_field(data, "action")
        ),
        "game_complete" => format!(
            "GAME_COMPLETE: User completed {} - Score: {}",
            data_field(data, "game"),
            data_field(data, "score")
        ),
        "button_click" => format!("BUTTON_CLICK: {} clicked", data_field(data, "button")),
        "modal_open" => format!("MODAL_OPEN: {} modal opened", data_field(data, "modal")),
        "modal_close" => format!("MODAL_CLOSE: {} modal closed", data_field(data, "modal")),
        "clue_submit" => "CLUE_SUBMIT: User submitted clues".to_string(),
        "click" => {
            let text: String = data_field(data, "text")
                .chars()
                .take(CLICK_TEXT_LIMIT)
                .collect();
            format!("CLICK: {} - {text}", data_field(data, "element"))
        }
        "error" => {
            return EventDetail {
                is_error: true,
                line: format!("ERROR: {}", data_field(data, "message")),
            }
        }
        other => format!("EVENT: {other}"),
    };
    EventDetail {
        is_error: false,
        line,
    }
}

pub async fn relay_event(
    State(state): State<RelayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let fields = parse_json_fields(&body).map_err(|e| {
        error!("EVENTS | LOGGING_ERROR: {e}");
        ApiError::Internal(FAILURE_MESSAGE.to_string())
    })?;

    let event = GameEvent::from_request(&fields, &headers);
    info!("{}", event.console_line());

    let record = event.log_record();
    RELAY
        .deliver(state.logs.send(std::slice::from_ref(&record)))
        .await;

    let detail = describe_event(&event.name(), &event.data);
    if detail.is_error {
        error!("EVENTS | {}", detail.line);
    } else {
        info!("EVENTS | {}", detail.line);
    }

    Ok(Json(json!({
        "success": true,
        "message": "Event logged to Datadog",
        "eventId": event_id(None),
    })))
}
