// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod admin;
pub mod auth_events;
pub mod config;
pub mod drain;
pub mod error;
pub mod events;
pub mod forwarder;
pub mod http_utils;
pub mod log_record;
pub mod logger;
pub mod orders;
pub mod server;
