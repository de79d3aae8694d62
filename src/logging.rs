// ABOUTME: Tracing subscriber setup for the LMS server and CLI
// ABOUTME: EnvFilter driven, with pretty or JSON output selected by configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::{LogFormat, LoggingConfig};
use crate::errors::{AppError, AppResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber
///
/// # Errors
///
/// Returns a config error if the filter directive is invalid or a global
/// subscriber is already installed
pub fn init(config: &LoggingConfig) -> AppResult<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| AppError::config(format!("Invalid log filter '{}': {e}", config.filter)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
    };

    result.map_err(|e| AppError::config(format!("Failed to install tracing subscriber: {e}")))
}
