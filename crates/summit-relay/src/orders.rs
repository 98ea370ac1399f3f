// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Order intake for the swag store instances.
//!
//! Orders are not stored. An accepted order is written to the log output and,
//! when `ORDER_WEBHOOK_URL` is set, copied to the webhook on a best-effort
//! basis.

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use rand::RngCore;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt::Write;
use tracing::{debug, error, info};

use crate::error::ApiError;
use crate::forwarder::BestEffort;
use crate::http_utils::{header_str, parse_json_fields};
use crate::log_record::{display_value, now_iso8601, truthy};
use crate::server::RelayState;

const MISSING_FIELDS: &str = "Missing required fields: email, items, shippingAddress";
const INCOMPLETE_ADDRESS: &str = "Incomplete shipping address";
const ITEMS_NOT_ARRAY: &str = "items must be an array";
const ITEM_NOT_OBJECT: &str = "Each item must be an object";
const FAILURE_MESSAGE: &str = "Failed to process order. Please try again.";
const SUCCESS_MESSAGE: &str = "Order received! We'll ship your swag soon. 🎉";
const ORDER_ID_BYTES: usize = 6;

const WEBHOOK: BestEffort = BestEffort::new("ORDERS");

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Value>,
    pub quantity: Value,
}

impl OrderItem {
    fn from_value(item: &Value) -> Result<Self, ApiError> {
        let fields = item
            .as_object()
            .ok_or_else(|| ApiError::BadRequest(ITEM_NOT_OBJECT.to_string()))?;
        Ok(OrderItem {
            name: fields.get("name").filter(|v| !v.is_null()).cloned(),
            size: truthy(fields, "selectedSize")
                .or_else(|| fields.get("size").filter(|v| !v.is_null()))
                .cloned(),
            quantity: truthy(fields, "quantity")
                .cloned()
                .unwrap_or_else(|| Value::from(1)),
        })
    }

    fn summary(&self) -> String {
        let render = |v: &Option<Value>| v.as_ref().map(display_value).unwrap_or_default();
        format!("{} ({})", render(&self.name), render(&self.size))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: Value,
    pub last_name: Value,
    pub address: Value,
    pub apartment: Value,
    pub city: Value,
    pub state: Value,
    pub zip_code: Value,
    pub country: Value,
}

impl ShippingAddress {
    const REQUIRED: [&'static str; 6] =
        ["firstName", "lastName", "address", "city", "zipCode", "country"];

    fn from_fields(fields: &Map<String, Value>) -> Result<Self, ApiError> {
        if Self::REQUIRED
            .iter()
            .any(|key| truthy(fields, key).is_none())
        {
            return Err(ApiError::BadRequest(INCOMPLETE_ADDRESS.to_string()));
        }
        let required = |key: &str| fields.get(key).cloned().unwrap_or(Value::Null);
        let optional = |key: &str| {
            truthy(fields, key)
                .cloned()
                .unwrap_or_else(|| Value::from(""))
        };
        Ok(ShippingAddress {
            first_name: required("firstName"),
            last_name: required("lastName"),
            address: required("address"),
            apartment: optional("apartment"),
            city: required("city"),
            state: optional("state"),
            zip_code: required("zipCode"),
            country: required("country"),
        })
    }

    /// Single-line rendering for spreadsheet-style webhooks
    pub fn full_address(&self) -> String {
        format!(
            "{} {}, {}, {}, {} {}, {}",
            display_value(&self.first_name),
            display_value(&self.last_name),
            display_value(&self.address),
            display_value(&self.city),
            display_value(&self.state),
            display_value(&self.zip_code),
            display_value(&self.country),
        )
    }
}

/// An accepted order. Built once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub instance_id: Value,
    pub email: Value,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub bugs_fixed: Value,
    pub submitted_at: String,
    pub status: &'static str,
}

impl Order {
    /// Validates a submitted order and builds the accepted form of it
    pub fn from_request(fields: &Map<String, Value>, headers: &HeaderMap) -> Result<Self, ApiError> {
        let (Some(email), Some(items), Some(address)) = (
            truthy(fields, "email"),
            truthy(fields, "items"),
            truthy(fields, "shippingAddress"),
        ) else {
            return Err(ApiError::BadRequest(MISSING_FIELDS.to_string()));
        };

        let empty = Map::new();
        let shipping_address =
            ShippingAddress::from_fields(address.as_object().unwrap_or(&empty))?;

        let items = items
            .as_array()
            .ok_or_else(|| ApiError::BadRequest(ITEMS_NOT_ARRAY.to_string()))?
            .iter()
            .map(OrderItem::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        let instance_id = header_str(headers, "x-instance-id")
            .map(Value::from)
            .or_else(|| truthy(fields, "instanceId").cloned())
            .unwrap_or_else(|| Value::from("unknown"));

        Ok(Order {
            order_id: generate_order_id(),
            instance_id,
            email: email.clone(),
            items,
            shipping_address,
            bugs_fixed: truthy(fields, "bugsFixed")
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new())),
            submitted_at: now_iso8601(),
            status: "pending",
        })
    }

    pub fn items_summary(&self) -> String {
        self.items
            .iter()
            .map(OrderItem::summary)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn webhook_payload(&self) -> WebhookPayload<'_> {
        WebhookPayload {
            order: self,
            items_summary: self.items_summary(),
            full_address: self.shipping_address.full_address(),
        }
    }
}

/// The order plus flattened fields for spreadsheet integrations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload<'a> {
    #[serde(flatten)]
    pub order: &'a Order,
    pub items_summary: String,
    pub full_address: String,
}

/// `ORD-` followed by 12 uppercase hex characters from a CSPRNG
pub fn generate_order_id() -> String {
    let mut bytes = [0u8; ORDER_ID_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    let mut id = String::with_capacity(4 + ORDER_ID_BYTES * 2);
    id.push_str("ORD-");
    for byte in bytes {
        let _ = write!(id, "{byte:02X}");
    }
    id
}

pub async fn submit_order(
    State(state): State<RelayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let fields = parse_json_fields(&body).map_err(|e| {
        error!("ORDERS | Order submission error: {e}");
        ApiError::Internal(FAILURE_MESSAGE.to_string())
    })?;

    let order = Order::from_request(&fields, &headers)?;

    match serde_json::to_string_pretty(&order) {
        Ok(pretty) => info!("ORDERS | New order received: {}\n{pretty}", order.order_id),
        Err(e) => error!("ORDERS | Unable to serialize order {}: {e}", order.order_id),
    }

    match &state.webhook {
        Some(webhook) => {
            WEBHOOK
                .deliver(webhook.send(&order.webhook_payload()))
                .await
        }
        None => debug!("ORDERS | ORDER_WEBHOOK_URL not set, skipping webhook"),
    }

    Ok(Json(json!({
        "success": true,
        "orderId": order.order_id,
        "message": SUCCESS_MESSAGE,
    })))
}
