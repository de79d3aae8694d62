// ABOUTME: Server health checks: service liveness plus database reachability
// ABOUTME: Comprehensive results are cached briefly so probes do not hammer the database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Health check model and checker

use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::constants::service::{API_VERSION, SERVICE_NAME};
use crate::database::Database;

/// Overall health status
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Critical systems failing
    Unhealthy,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: HealthStatus,
    /// Service information
    pub service: ServiceInfo,
    /// Individual component checks
    pub checks: Vec<ComponentHealth>,
    /// Response timestamp (RFC 3339)
    pub timestamp: String,
    /// Response time in milliseconds
    pub response_time_ms: u64,
}

/// Service information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Service name
    pub name: String,
    /// Crate version
    pub version: String,
    /// API version
    pub api_version: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
}

/// Individual component health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Status description
    pub message: String,
    /// Check duration in milliseconds
    pub duration_ms: u64,
    /// Additional metadata
    pub metadata: Option<Value>,
}

/// Health checker for the LMS server
pub struct HealthChecker {
    start_time: Instant,
    database: Database,
    cached_status: RwLock<Option<(HealthResponse, Instant)>>,
    cache_ttl: Duration,
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl HealthChecker {
    /// Create a new health checker
    #[must_use]
    pub fn new(database: Database) -> Self {
        Self {
            start_time: Instant::now(),
            database,
            cached_status: RwLock::new(None),
            cache_ttl: Duration::from_secs(5),
        }
    }

    fn service_info(&self) -> ServiceInfo {
        ServiceInfo {
            name: SERVICE_NAME.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            api_version: API_VERSION.to_owned(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Liveness only, no I/O
    #[must_use]
    pub fn basic_health(&self) -> HealthResponse {
        let start = Instant::now();
        HealthResponse {
            status: HealthStatus::Healthy,
            service: self.service_info(),
            checks: vec![ComponentHealth {
                name: "service".into(),
                status: HealthStatus::Healthy,
                message: "Service is running".into(),
                duration_ms: 0,
                metadata: None,
            }],
            timestamp: Utc::now().to_rfc3339(),
            response_time_ms: elapsed_ms(start),
        }
    }

    /// Liveness plus a database round trip
    pub async fn comprehensive_health(&self) -> HealthResponse {
        let start = Instant::now();

        {
            let cached = self.cached_status.read().await;
            if let Some((response, cached_at)) = cached.as_ref() {
                if cached_at.elapsed() < self.cache_ttl {
                    return response.clone();
                }
            }
        }

        debug!("Performing comprehensive health check");
        let checks = vec![self.check_database().await];
        let status = if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Healthy
        };

        let response = HealthResponse {
            status,
            service: self.service_info(),
            checks,
            timestamp: Utc::now().to_rfc3339(),
            response_time_ms: elapsed_ms(start),
        };

        {
            let mut cached = self.cached_status.write().await;
            *cached = Some((response.clone(), Instant::now()));
        }

        response
    }

    async fn check_database(&self) -> ComponentHealth {
        let start = Instant::now();

        let probe: Result<i64, sqlx::Error> = sqlx::query_scalar("SELECT COUNT(*) FROM tenants")
            .fetch_one(self.database.pool())
            .await;

        match probe {
            Ok(sites) => ComponentHealth {
                name: "database".into(),
                status: HealthStatus::Healthy,
                message: "Database is accessible and responsive".into(),
                duration_ms: elapsed_ms(start),
                metadata: Some(serde_json::json!({ "sites": sites })),
            },
            Err(e) => {
                error!("Database health check failed: {}", e);
                ComponentHealth {
                    name: "database".into(),
                    status: HealthStatus::Unhealthy,
                    message: format!("Database check failed: {e}"),
                    duration_ms: elapsed_ms(start),
                    metadata: None,
                }
            }
        }
    }
}
