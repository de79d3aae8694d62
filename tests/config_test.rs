// ABOUTME: Tests for environment-driven server configuration
// ABOUTME: Serialized because they mutate process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::env;

use lms_server::config::{LogFormat, ServerConfig};
use lms_server::constants::sites;
use lms_server::errors::ErrorCode;
use serial_test::serial;

const VARS: [&str; 5] = [
    "HTTP_PORT",
    "DATABASE_URL",
    "LMS_PRIMARY_SITE",
    "LOG_FORMAT",
    "RUST_LOG",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_uses_defaults() {
    clear_env();
    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.http_port, 8081);
    assert_eq!(config.primary_site, sites::MAIN.id);
    assert!(!config.database.is_in_memory());
}

#[test]
#[serial]
fn test_from_env_reads_overrides() {
    clear_env();
    env::set_var("HTTP_PORT", "9100");
    env::set_var("DATABASE_URL", "sqlite::memory:");
    env::set_var("LMS_PRIMARY_SITE", sites::NORTH.id.to_string());
    env::set_var("LOG_FORMAT", "json");
    env::set_var("RUST_LOG", "lms_server=debug");

    let config = ServerConfig::from_env().unwrap();
    clear_env();

    assert_eq!(config.http_port, 9100);
    assert!(config.database.is_in_memory());
    assert_eq!(config.primary_site, sites::NORTH.id);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.logging.filter, "lms_server=debug");
}

#[test]
#[serial]
fn test_from_env_rejects_invalid_values() {
    clear_env();
    env::set_var("DATABASE_URL", "postgres://localhost/lms");
    let err = ServerConfig::from_env().unwrap_err();
    clear_env();
    assert_eq!(err.code, ErrorCode::ConfigError);

    env::set_var("HTTP_PORT", "70000");
    let err = ServerConfig::from_env().unwrap_err();
    clear_env();
    assert_eq!(err.code, ErrorCode::ConfigError);
}
