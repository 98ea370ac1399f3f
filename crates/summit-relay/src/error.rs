// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Errors that can occur while loading the relay configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Outcome of a failed outbound call to the logs intake or the order webhook
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("upstream responded with status {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("unable to build HTTP client: {0}")]
    Client(String),
}

/// Errors surfaced to the caller of a relay endpoint.
///
/// Each variant maps onto one HTTP status and renders as `{"error": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{error}")]
    Misconfigured { error: String, hint: String },

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Misconfigured { .. } | ApiError::Upstream(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!("HTTP | {status}: {self}");
        let body = match &self {
            ApiError::Misconfigured { error, hint } => json!({ "error": error, "hint": hint }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// 405 fallback shared by every route's method table
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_display() {
        let error = ConfigError::InvalidConfig("port must be greater than 0".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid configuration: port must be greater than 0"
        );
        assert_eq!(ApiError::MethodNotAllowed.to_string(), "Method not allowed");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MethodNotAllowed.status(), 405);
        assert_eq!(ApiError::BadRequest("x".into()).status(), 400);
        assert_eq!(ApiError::Forbidden("x".into()).status(), 403);
        assert_eq!(ApiError::Upstream("x".into()).status(), 500);
        assert_eq!(ApiError::Internal("x".into()).status(), 500);
        let misconfigured = ApiError::Misconfigured {
            error: "x".into(),
            hint: "y".into(),
        };
        assert_eq!(misconfigured.status(), 500);
    }

    #[tokio::test]
    async fn test_method_not_allowed_body() {
        let response = method_not_allowed().await.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Method not allowed" })
        );
    }

    #[tokio::test]
    async fn test_misconfigured_body_carries_hint() {
        let response = ApiError::Misconfigured {
            error: "secret missing".into(),
            hint: "set it".into(),
        }
        .into_response();
        assert_eq!(
            body_json(response).await,
            json!({ "error": "secret missing", "hint": "set it" })
        );
    }
}
