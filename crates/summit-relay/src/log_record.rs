// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log records in the shape accepted by the Datadog logs intake.
//!
//! A record is composed from two layers:
//!
//! 1. the intake fields (`message`, `ddsource`, `ddtags`, `hostname`, `service`,
//!    `status` and optionally `timestamp`), written first;
//! 2. the payload fields (the normalized event entry, or a parsed drain line),
//!    written second.
//!
//! On a key collision the payload layer wins. Every relay builds its records
//! through [`LogRecord::compose`] so this rule holds everywhere.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Intake-level fields of a log record
#[derive(Debug, Clone, Default)]
pub struct IntakeFields {
    pub message: String,
    pub ddsource: &'static str,
    pub ddtags: Option<String>,
    pub hostname: Option<&'static str>,
    pub service: &'static str,
    pub status: Value,
    pub timestamp: Option<Value>,
}

impl IntakeFields {
    fn into_map(self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("message".into(), Value::String(self.message));
        map.insert("ddsource".into(), Value::from(self.ddsource));
        if let Some(ddtags) = self.ddtags {
            map.insert("ddtags".into(), Value::String(ddtags));
        }
        if let Some(hostname) = self.hostname {
            map.insert("hostname".into(), Value::from(hostname));
        }
        map.insert("service".into(), Value::from(self.service));
        map.insert("status".into(), self.status);
        if let Some(timestamp) = self.timestamp {
            map.insert("timestamp".into(), timestamp);
        }
        map
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LogRecord(Map<String, Value>);

impl LogRecord {
    /// Lays `payload` over `intake`; payload keys replace intake keys.
    pub fn compose(intake: IntakeFields, payload: Map<String, Value>) -> Self {
        let mut fields = intake.into_map();
        for (key, value) in payload {
            fields.insert(key, value);
        }
        LogRecord(fields)
    }

    /// A record made of intake fields only
    pub fn intake_only(intake: IntakeFields) -> Self {
        LogRecord(intake.into_map())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// JavaScript truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Returns the field when present and truthy
pub fn truthy<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|v| is_truthy(v))
}

/// `fields[key] || default`, as a JSON value
pub fn truthy_or(fields: &Map<String, Value>, key: &str, default: &str) -> Value {
    truthy(fields, key)
        .cloned()
        .unwrap_or_else(|| Value::from(default))
}

/// Renders a value the way it reads inside an interpolated string: strings
/// unquoted, everything else as JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Current time as an ISO-8601 UTC string with millisecond precision
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
