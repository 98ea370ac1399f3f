// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::forwarder::BestEffort;
use crate::http_utils::{client_ip, event_id, parse_json_fields, user_agent};
use crate::log_record::{
    display_value, is_truthy, now_iso8601, truthy, truthy_or, IntakeFields, LogRecord,
};
use crate::server::RelayState;

const SOURCE: &str = "pm-summit-landing-page";
const DDSOURCE: &str = "vercel-function";
const HOSTNAME: &str = "pm-summit.xyz";
const FAILURE_MESSAGE: &str = "Failed to log auth event";

const RELAY: BestEffort = BestEffort::new("AUTH");

/// A normalized authentication lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthEvent {
    pub timestamp: Value,
    pub event: Value,
    pub email: Value,
    pub name: Value,
    pub domain: Value,
    /// As sent, or `false` when absent or null
    pub success: Value,
    pub error_message: Value,
    pub session_id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<Value>,
    pub ip: String,
    pub source: &'static str,
}

impl AuthEvent {
    pub fn from_request(fields: &Map<String, Value>, headers: &HeaderMap) -> Self {
        let success = match fields.get("success") {
            None | Some(Value::Null) => Value::Bool(false),
            Some(value) => value.clone(),
        };
        AuthEvent {
            timestamp: truthy(fields, "timestamp")
                .cloned()
                .unwrap_or_else(|| Value::from(now_iso8601())),
            event: truthy_or(fields, "event", "auth_unknown"),
            email: truthy_or(fields, "email", "unknown"),
            name: truthy_or(fields, "name", "unknown"),
            domain: truthy_or(fields, "domain", "unknown"),
            success,
            error_message: truthy(fields, "errorMessage").cloned().unwrap_or(Value::Null),
            session_id: truthy_or(fields, "sessionId", "anonymous"),
            user_agent: user_agent(fields, headers),
            ip: client_ip(headers),
            source: SOURCE,
        }
    }

    pub fn succeeded(&self) -> bool {
        is_truthy(&self.success)
    }

    fn outcome(&self) -> &'static str {
        if self.succeeded() {
            "SUCCESS"
        } else {
            "FAILED"
        }
    }

    fn status(&self) -> &'static str {
        if self.succeeded() {
            "info"
        } else {
            "warn"
        }
    }

    fn entry(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn console_line(&self) -> Value {
        let mut line = Map::new();
        line.insert("level".into(), Value::from(self.status()));
        line.insert(
            "message".into(),
            Value::from(format!(
                "[AUTH_EVENT] {} - {} - {}",
                display_value(&self.event),
                display_value(&self.email),
                self.outcome()
            )),
        );
        line.extend(self.entry());
        Value::Object(line)
    }

    pub fn log_record(&self) -> LogRecord {
        let event = display_value(&self.event);
        let mut message = format!(
            "[AUTH_EVENT] {event}: {} - {}",
            display_value(&self.email),
            self.outcome()
        );
        if is_truthy(&self.error_message) {
            message.push_str(" - ");
            message.push_str(&display_value(&self.error_message));
        }
        let intake = IntakeFields {
            message,
            ddsource: DDSOURCE,
            ddtags: Some(format!(
                "env:production,event_type:{event},success:{}",
                display_value(&self.success)
            )),
            hostname: Some(HOSTNAME),
            service: SOURCE,
            status: Value::from(self.status()),
            timestamp: None,
        };
        LogRecord::compose(intake, self.entry())
    }

    /// Human-readable summary of the lifecycle step
    pub fn detail(&self) -> String {
        let name = display_value(&self.name);
        let email = display_value(&self.email);
        match display_value(&self.event).as_str() {
            "login_success" => format!("LOGIN SUCCESS: {name} ({email}) logged in successfully"),
            "login_failed" => format!(
                "LOGIN FAILED: {email} - Reason: {}",
                display_value(&self.error_message)
            ),
            "login_attempt" => "LOGIN ATTEMPT: User initiated Google Sign-In".to_string(),
            "logout" => format!("LOGOUT: {name} ({email}) logged out"),
            "session_restored" => {
                format!("SESSION RESTORED: {name} ({email}) restored from local storage")
            }
            other => format!("AUTH EVENT: {other} - {email}"),
        }
    }
}

pub async fn relay_auth_event(
    State(state): State<RelayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let fields = parse_json_fields(&body).map_err(|e| {
        error!("AUTH | AUTH_LOGGING_ERROR: {e}");
        ApiError::Internal(FAILURE_MESSAGE.to_string())
    })?;

    let event = AuthEvent::from_request(&fields, &headers);
    if event.succeeded() {
        info!("{}", event.console_line());
    } else {
        warn!("{}", event.console_line());
    }

    let record = event.log_record();
    RELAY
        .deliver(state.logs.send(std::slice::from_ref(&record)))
        .await;
    info!("AUTH | {}", event.detail());

    Ok(Json(json!({
        "success": true,
        "message": "Auth event logged",
        "eventId": event_id(Some("auth")),
    })))
}
