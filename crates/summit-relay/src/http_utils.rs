// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use core::time::Duration;
use rand::Rng;
use serde_json::{Map, Value};
use std::error::Error;

/// Headers browsers may send to the events and auth relays
pub const CORS_ALLOW_HEADERS: &str = "Content-Type";
/// Headers browsers may send to order intake
pub const ORDER_CORS_ALLOW_HEADERS: &str = "Content-Type, X-Instance-ID";
const CORS_ALLOW_METHODS: &str = "POST, OPTIONS";

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Builds a reqwest client with optional proxy configuration and timeout.
/// Uses rustls TLS.
pub fn build_client(
    proxy_url: Option<&str>,
    timeout: Duration,
) -> Result<reqwest::Client, Box<dyn Error>> {
    let mut builder = reqwest::Client::builder().timeout(timeout);
    if let Some(proxy) = proxy_url {
        builder = builder.proxy(reqwest::Proxy::https(proxy)?);
    }
    Ok(builder.build()?)
}

/// Adds the permissive CORS headers to a response
pub fn apply_cors(headers: &mut HeaderMap, allow_headers: &'static str) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(allow_headers),
    );
}

pub async fn cors(mut response: Response) -> Response {
    apply_cors(response.headers_mut(), CORS_ALLOW_HEADERS);
    response
}

pub async fn order_cors(mut response: Response) -> Response {
    apply_cors(response.headers_mut(), ORDER_CORS_ALLOW_HEADERS);
    response
}

/// CORS preflight: a bare 200
pub async fn preflight() -> Response {
    StatusCode::OK.into_response()
}

/// Returns a header value if present, valid UTF-8 and non-empty
pub fn header_str<'a>(headers: &'a HeaderMap, name: impl header::AsHeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// `X-Forwarded-For || X-Real-IP || "unknown"`, unparsed
pub fn client_ip(headers: &HeaderMap) -> String {
    header_str(headers, X_FORWARDED_FOR)
        .or_else(|| header_str(headers, X_REAL_IP))
        .unwrap_or("unknown")
        .to_string()
}

/// Body user agent when truthy, else the request's `User-Agent` header
pub fn user_agent(fields: &Map<String, Value>, headers: &HeaderMap) -> Option<Value> {
    crate::log_record::truthy(fields, "userAgent")
        .cloned()
        .or_else(|| header_str(headers, header::USER_AGENT).map(Value::from))
}

/// Parses a JSON request body into its top-level fields.
///
/// `null` and unparseable bodies are errors. Any other non-object value yields
/// no fields.
pub fn parse_json_fields(body: &[u8]) -> Result<Map<String, Value>, serde_json::Error> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Object(map) => Ok(map),
        Value::Null => Err(serde::de::Error::custom("request body is null")),
        _ => Ok(Map::new()),
    }
}

/// `<epoch-millis>-<9 base36 chars>`, with an optional prefix
pub fn event_id(prefix: Option<&str>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    let millis = chrono::Utc::now().timestamp_millis();
    match prefix {
        Some(prefix) => format!("{prefix}-{millis}-{suffix}"),
        None => format!("{millis}-{suffix}"),
    }
}
