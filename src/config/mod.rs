// ABOUTME: Configuration module entry point for the LMS server
// ABOUTME: Environment-driven settings for HTTP, database, primary site and logging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Environment-based server configuration
pub mod environment;

pub use environment::{DatabaseConfig, LogFormat, LoggingConfig, ServerConfig};
