// ABOUTME: SQLite persistence for sites, users, courses, progress, attempts and certificates
// ABOUTME: Owns the connection pool, embedded migrations and shared row-decoding helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database
//!
//! Every tenant-owned query takes a [`TenantId`] as its first domain argument.
//! Managers expose pool-backed methods for standalone reads and writes, and
//! associated functions taking `&mut SqliteConnection` for use inside a
//! [`SqliteTransactionGuard`]. Code holding a transaction must only use the
//! transaction's connection: in-memory databases have a single connection.

/// Assessment attempt logs and assessment cycles
pub mod attempts;
/// Certificate rows and their signatory snapshots
pub mod certificates;
/// Courses with their module and lesson trees
pub mod courses;
/// User/course enrollment
pub mod enrollments;
/// Per-lesson completion rows
pub mod progress;
/// Signatory pools and course signing sets
pub mod signatories;
/// Sites (tenants)
pub mod tenants;
/// Transaction guard with rollback on drop
pub mod transactions;
/// Site users
pub mod users;

pub use attempts::{AttemptManager, AttemptSubject, CycleReason};
pub use certificates::{
    CertificateDetails, CertificateManager, CertificateRecord, CertificateRef, SignatorySnapshot,
};
pub use courses::{CourseDraft, CourseManager, CourseTree, LessonDraft, ModuleDraft};
pub use enrollments::EnrollmentManager;
pub use progress::ProgressManager;
pub use signatories::{CreateSignatoryRequest, Signatory, SignatoryManager};
pub use tenants::{Site, TenantManager};
pub use transactions::SqliteTransactionGuard;
pub use users::{CreateUserRequest, User, UserManager, UserRole};

use crate::config::DatabaseConfig;
use crate::constants::database::FILE_POOL_SIZE;
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use lms_core::models::TenantId;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

/// Database handle
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and apply embedded migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails, or a
    /// migration fails
    pub async fn new(config: &DatabaseConfig) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| AppError::config(format!("Invalid DATABASE_URL '{}': {e}", config.url)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if config.is_in_memory() {
            // One long-lived connection so every caller sees the same database
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
        } else {
            if let Some(parent) = options.get_filename().parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        AppError::config(format!(
                            "Failed to create database directory {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }
            SqlitePoolOptions::new()
                .max_connections(FILE_POOL_SIZE)
                .connect_with(options)
                .await
        }
        .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::database(format!("Database migration failed: {e}")))?;

        info!(url = %config.url, "Database ready");
        Ok(Self { pool })
    }

    /// Wrap an existing pool (migrations must already be applied)
    #[must_use]
    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started
    pub async fn begin(&self) -> AppResult<SqliteTransactionGuard> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;
        Ok(SqliteTransactionGuard::new(tx))
    }

    /// Site manager
    #[must_use]
    pub fn tenants(&self) -> TenantManager {
        TenantManager::new(self.pool.clone())
    }

    /// User manager
    #[must_use]
    pub fn users(&self) -> UserManager {
        UserManager::new(self.pool.clone())
    }

    /// Signatory manager
    #[must_use]
    pub fn signatories(&self) -> SignatoryManager {
        SignatoryManager::new(self.pool.clone())
    }

    /// Course manager
    #[must_use]
    pub fn courses(&self) -> CourseManager {
        CourseManager::new(self.pool.clone())
    }

    /// Enrollment manager
    #[must_use]
    pub fn enrollments(&self) -> EnrollmentManager {
        EnrollmentManager::new(self.pool.clone())
    }

    /// Progress manager
    #[must_use]
    pub fn progress(&self) -> ProgressManager {
        ProgressManager::new(self.pool.clone())
    }

    /// Certificate manager
    #[must_use]
    pub fn certificates(&self) -> CertificateManager {
        CertificateManager::new(self.pool.clone())
    }
}

/// Decode a UUID column
pub(crate) fn parse_uuid(raw: &str, column: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| AppError::integrity(format!("Invalid {column} '{raw}': {e}")))
}

/// Decode a tenant id column
pub(crate) fn parse_tenant(raw: &str) -> AppResult<TenantId> {
    parse_uuid(raw, "tenant_id").map(TenantId::from)
}

/// Decode an RFC 3339 timestamp column
pub(crate) fn parse_timestamp(raw: &str, column: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::integrity(format!("Invalid {column} '{raw}': {e}")))
}

/// Decode an optional RFC 3339 timestamp column
pub(crate) fn parse_optional_timestamp(
    raw: Option<String>,
    column: &str,
) -> AppResult<Option<DateTime<Utc>>> {
    raw.map(|value| parse_timestamp(&value, column)).transpose()
}

/// Whether `err` is a unique constraint violation, optionally on a named column
pub(crate) fn is_unique_violation(err: &sqlx::Error, column: Option<&str>) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation()
                && match column {
                    Some(c) => db.message().contains(c),
                    None => true,
                }
        }
        _ => false,
    }
}
