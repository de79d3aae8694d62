// ABOUTME: Site user persistence with per-site unique usernames
// ABOUTME: Roles are employee or admin; super admins may additionally manage sites
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{is_unique_violation, parse_tenant, parse_timestamp, parse_uuid};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use lms_core::models::TenantId;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use std::fmt;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

/// User role within a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Learner
    #[default]
    Employee,
    /// Site administrator
    Admin,
}

impl UserRole {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Admin => "admin",
        }
    }

    /// Whether this role grants administrator access
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "employee" => Ok(Self::Employee),
            "admin" => Ok(Self::Admin),
            other => Err(AppError::invalid_input(format!("Unknown role '{other}'"))),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user belonging to one site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// User identifier
    pub id: Uuid,
    /// Owning site
    pub tenant_id: TenantId,
    /// Login name, unique within the site
    pub username: String,
    /// Name printed on certificates
    pub display_name: String,
    /// Role
    pub role: UserRole,
    /// May manage sites
    pub is_super_admin: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Request to create a user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    /// Login name
    pub username: String,
    /// Name printed on certificates
    pub display_name: String,
    /// Role (defaults to employee)
    #[serde(default)]
    pub role: UserRole,
    /// Super admin flag
    #[serde(default)]
    pub is_super_admin: bool,
}

/// User database operations manager
pub struct UserManager {
    pool: SqlitePool,
}

impl UserManager {
    /// Create a new user manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a user in a site
    ///
    /// # Errors
    ///
    /// Returns invalid-input for blank names and a conflict if the username
    /// is already taken in the site
    pub async fn create_user(
        &self,
        tenant_id: TenantId,
        request: &CreateUserRequest,
    ) -> AppResult<User> {
        let username = request.username.trim();
        let display_name = request.display_name.trim();
        if username.is_empty() {
            return Err(AppError::missing_field("username"));
        }
        if display_name.is_empty() {
            return Err(AppError::missing_field("display_name"));
        }

        let user = User {
            id: Uuid::new_v4(),
            tenant_id,
            username: username.to_owned(),
            display_name: display_name.to_owned(),
            role: request.role,
            is_super_admin: request.is_super_admin,
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO users
                (id, tenant_id, username, display_name, role, is_super_admin, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(user.id.to_string())
        .bind(tenant_id.to_string())
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(user.is_super_admin)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, Some("username")) {
                AppError::conflict(format!("Username '{}' already exists", user.username))
            } else {
                AppError::database(format!("Failed to create user: {e}"))
            }
        })?;

        info!(tenant_id = %tenant_id, user_id = %user.id, role = %user.role, "Created user");
        Ok(user)
    }

    /// Get a user of a site
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn get_user(&self, tenant_id: TenantId, user_id: Uuid) -> AppResult<Option<User>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;
        Self::get_user_in(&mut conn, tenant_id, user_id).await
    }

    /// Get a user of a site on an existing connection
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn get_user_in(
        conn: &mut SqliteConnection,
        tenant_id: TenantId,
        user_id: Uuid,
    ) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, tenant_id, username, display_name, role, is_super_admin, created_at
            FROM users
            WHERE tenant_id = $1 AND id = $2
            ",
        )
        .bind(tenant_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.as_ref().map(row_to_user).transpose()
    }
}

fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: parse_uuid(&row.try_get::<String, _>("id")?, "user id")?,
        tenant_id: parse_tenant(&row.try_get::<String, _>("tenant_id")?)?,
        username: row.try_get("username")?,
        display_name: row.try_get("display_name")?,
        role: role
            .parse()
            .map_err(|_| AppError::integrity(format!("Unknown stored role '{role}'")))?,
        is_super_admin: row.try_get("is_super_admin")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?, "created_at")?,
    })
}
