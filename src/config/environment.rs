// ABOUTME: Environment-based configuration loading for the LMS server
// ABOUTME: Parses HTTP_PORT, DATABASE_URL, LMS_PRIMARY_SITE, LOG_FORMAT and RUST_LOG
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Server configuration is read from the process environment only. Every
//! variable has a default; a present but unparseable value is a startup
//! error rather than being silently replaced.

use crate::constants::{database, http, sites};
use crate::errors::{AppError, AppResult};
use lms_core::models::TenantId;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(AppError::config(format!(
                "LOG_FORMAT must be 'pretty' or 'json', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// `EnvFilter` directive
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "info".to_owned(),
        }
    }
}

/// Database settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `SQLite` URL, e.g. `sqlite:./data/lms.db` or `sqlite::memory:`
    pub url: String,
}

impl DatabaseConfig {
    /// Whether the URL names an in-memory database
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:")
    }
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listening port
    pub http_port: u16,
    /// Database settings
    pub database: DatabaseConfig,
    /// Site that owns master courses for course sync
    pub primary_site: TenantId,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: http::DEFAULT_PORT,
            database: DatabaseConfig {
                url: database::DEFAULT_URL.to_owned(),
            },
            primary_site: sites::MAIN.id,
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a config error if any variable is present but invalid
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns a config error if any variable is present but invalid
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let defaults = Self::default();

        let http_port = match lookup("HTTP_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| AppError::config(format!("Invalid HTTP_PORT '{raw}': {e}")))?,
            None => defaults.http_port,
        };

        let url = lookup("DATABASE_URL").unwrap_or(defaults.database.url);
        if !url.starts_with("sqlite:") {
            return Err(AppError::config(format!(
                "DATABASE_URL must be a sqlite URL, got '{url}'"
            )));
        }

        let primary_site = match lookup("LMS_PRIMARY_SITE") {
            Some(raw) => raw
                .parse::<TenantId>()
                .map_err(|e| AppError::config(format!("Invalid LMS_PRIMARY_SITE '{raw}': {e}")))?,
            None => defaults.primary_site,
        };

        let format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            http_port,
            database: DatabaseConfig { url },
            primary_site,
            logging: LoggingConfig {
                format,
                filter: lookup("RUST_LOG").unwrap_or(defaults.logging.filter),
            },
        })
    }
}
