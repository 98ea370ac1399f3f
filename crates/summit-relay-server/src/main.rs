// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use summit_relay::{config::RelayConfig, logger::Formatter, server::RelayServer};

#[tokio::main]
pub async fn main() {
    let log_level = env::var("DD_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .event_format(Formatter)
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match RelayConfig::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Error creating config on summit relay startup: {e}");
            return;
        }
    };

    let shutdown_token = CancellationToken::new();
    let server = RelayServer::new(Arc::clone(&config), shutdown_token.clone());

    let server_handle = tokio::spawn(async move {
        let res = server.start().await;
        if let Err(e) = res {
            error!("Error when starting summit relay server: {e:?}");
        }
    });

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!("Unable to listen for shutdown signal: {e}"),
    }
    shutdown_token.cancel();

    if let Err(e) = server_handle.await {
        error!("Summit relay server task failed: {e}");
    }
}
