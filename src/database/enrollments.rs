// ABOUTME: Enrollment persistence; an enrollment row grants a user access to a course
// ABOUTME: Enrolling twice is a no-op so admin bulk enrollment can be replayed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::courses::CourseManager;
use super::users::UserManager;
use crate::errors::{AppError, AppResult};
use chrono::Utc;
use lms_core::models::TenantId;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

/// Enrollment database operations manager
pub struct EnrollmentManager {
    pool: SqlitePool,
}

impl EnrollmentManager {
    /// Create a new enrollment manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Enroll a user in a course of the same site
    ///
    /// Returns `true` when a new enrollment was created.
    ///
    /// # Errors
    ///
    /// Returns not-found if the user or course does not belong to the site
    pub async fn enroll(
        &self,
        tenant_id: TenantId,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<bool> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;

        if UserManager::get_user_in(&mut conn, tenant_id, user_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found(format!("User {user_id}")));
        }
        if !CourseManager::course_exists_in(&mut conn, tenant_id, course_id).await? {
            return Err(AppError::not_found(format!("Course {course_id}")));
        }

        let created = sqlx::query(
            r"
            INSERT INTO enrollments (id, tenant_id, user_id, course_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, course_id) DO NOTHING
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(tenant_id.to_string())
        .bind(user_id.to_string())
        .bind(course_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to enroll user: {e}")))?
        .rows_affected()
            > 0;

        if created {
            info!(
                tenant_id = %tenant_id,
                user_id = %user_id,
                course_id = %course_id,
                "Enrolled user"
            );
        }
        Ok(created)
    }

    /// Whether a user is enrolled in a course of the site
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn is_enrolled_in(
        conn: &mut SqliteConnection,
        tenant_id: TenantId,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM enrollments
            WHERE tenant_id = $1 AND user_id = $2 AND course_id = $3
            ",
        )
        .bind(tenant_id.to_string())
        .bind(user_id.to_string())
        .bind(course_id.to_string())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to check enrollment: {e}")))?;

        Ok(count > 0)
    }
}
