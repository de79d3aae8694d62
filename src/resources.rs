// ABOUTME: Shared server resources handed to every route as axum state
// ABOUTME: Holds the database, the learning engines, the authenticator and the health checker
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::auth::{HeaderSessionAuthenticator, SessionAuthenticator};
use crate::config::ServerConfig;
use crate::database::Database;
use crate::health::HealthChecker;
use crate::learning::{
    AssessmentEngine, CertificateIssuer, CourseSyncEngine, ProgressTracker, RetrainingEngine,
};
use lms_core::models::TenantId;
use std::sync::Arc;

/// Everything a request handler needs
pub struct ServerResources {
    /// Database handle
    pub database: Database,
    /// Site that owns master courses
    pub primary_site: TenantId,
    /// Caller authentication
    pub authenticator: Arc<dyn SessionAuthenticator>,
    /// Assessment engine
    pub assessments: AssessmentEngine,
    /// Progress tracker
    pub progress: ProgressTracker,
    /// Certificate issuer
    pub certificates: CertificateIssuer,
    /// Course sync engine
    pub sync: CourseSyncEngine,
    /// Retraining engine
    pub retraining: RetrainingEngine,
    /// Health checker
    pub health: HealthChecker,
}

impl ServerResources {
    /// Build resources with the gateway header authenticator
    #[must_use]
    pub fn new(database: Database, config: &ServerConfig) -> Self {
        let authenticator = Arc::new(HeaderSessionAuthenticator::new(database.clone()));
        Self::with_authenticator(database, config.primary_site, authenticator)
    }

    /// Build resources with a custom authenticator
    #[must_use]
    pub fn with_authenticator(
        database: Database,
        primary_site: TenantId,
        authenticator: Arc<dyn SessionAuthenticator>,
    ) -> Self {
        Self {
            assessments: AssessmentEngine::new(database.clone()),
            progress: ProgressTracker::new(database.clone()),
            certificates: CertificateIssuer::new(database.clone()),
            sync: CourseSyncEngine::new(database.clone(), primary_site),
            retraining: RetrainingEngine::new(database.clone()),
            health: HealthChecker::new(database.clone()),
            authenticator,
            primary_site,
            database,
        }
    }
}
