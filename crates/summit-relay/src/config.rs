// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::ConfigError;
use std::env;
use std::time::Duration;

const DEFAULT_SITE: &str = "datadoghq.com";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const LOGS_INTAKE_PATH: &str = "/api/v2/logs";

/// Configuration for the relay endpoints.
///
/// Read once at process start and shared immutably with every handler.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Datadog API key sent with every logs intake call
    pub api_key: Option<String>,
    /// Datadog site (e.g., datadoghq.com, datadoghq.eu)
    pub site: String,
    /// Logs intake base URL, without the `/api/v2/logs` path
    pub logs_intake_url: String,
    /// Secret guarding the admin order view
    pub admin_token: Option<String>,
    /// Webhook receiving a copy of every accepted order
    pub order_webhook_url: Option<String>,
    /// Address meant for order notifications. Nothing sends mail yet.
    pub order_notify_email: Option<String>,
    /// HTTPS proxy URL
    pub https_proxy: Option<String>,
    pub host: String,
    pub port: u16,
    /// Timeout for each outbound call, in seconds
    pub request_timeout_secs: u64,
    pub max_request_content_length: usize,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            site: DEFAULT_SITE.to_string(),
            logs_intake_url: logs_intake_url(DEFAULT_SITE),
            admin_token: None,
            order_webhook_url: None,
            order_notify_email: None,
            https_proxy: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_request_content_length: 10 * 1024 * 1024, // 10MB in Bytes
            log_level: "info".to_string(),
        }
    }
}

/// Builds the logs intake base URL for a Datadog site
pub fn logs_intake_url(site: &str) -> String {
    format!("https://http-intake.logs.{site}")
}

/// Reads an env var, treating an empty value as unset
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|val| !val.is_empty())
}

impl RelayConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let site = env::var("DD_SITE").unwrap_or_else(|_| DEFAULT_SITE.to_string());

        // DD_LOGS_DD_URL will primarily be used for integration tests
        // overrides the entire logs intake url prefix
        let logs_intake_url = match env::var("DD_LOGS_DD_URL") {
            Ok(prefix) => prefix.trim_end_matches('/').to_string(),
            Err(_) => logs_intake_url(&site),
        };

        let port = match env::var("SUMMIT_RELAY_PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|_| {
                ConfigError::InvalidConfig(format!("SUMMIT_RELAY_PORT '{raw}' is not a valid port"))
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let request_timeout_secs = env::var("SUMMIT_RELAY_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let config = Self {
            api_key: non_empty_var("DD_API_KEY"),
            site,
            logs_intake_url,
            admin_token: non_empty_var("ADMIN_TOKEN"),
            order_webhook_url: non_empty_var("ORDER_WEBHOOK_URL"),
            order_notify_email: non_empty_var("ORDER_NOTIFY_EMAIL"),
            https_proxy: env::var("DD_PROXY_HTTPS")
                .or_else(|_| env::var("HTTPS_PROXY"))
                .ok(),
            host: env::var("SUMMIT_RELAY_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port,
            request_timeout_secs,
            log_level: env::var("DD_LOG_LEVEL")
                .map(|val| val.to_lowercase())
                .unwrap_or_else(|_| "info".to_string()),
            ..Default::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "port must be greater than 0".to_string(),
            ));
        }

        if self.site.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "DD_SITE cannot be empty".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "request timeout must be greater than 0".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Full URL of the logs intake endpoint
    pub fn logs_endpoint(&self) -> String {
        format!("{}{LOGS_INTAKE_PATH}", self.logs_intake_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
