// ABOUTME: Per-lesson completion rows keyed by (user, lesson)
// ABOUTME: Upserts are idempotent; rows are only deleted in bulk by progress resets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::parse_uuid;
use crate::errors::{AppError, AppResult};
use chrono::Utc;
use lms_core::models::TenantId;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

/// Progress database operations manager
pub struct ProgressManager {
    pool: SqlitePool,
}

impl ProgressManager {
    /// Create a new progress manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Completed lesson ids of a course for a user
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn completed_lessons(&self, user_id: Uuid, course_id: Uuid) -> AppResult<Vec<Uuid>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;
        Self::completed_lessons_in(&mut conn, user_id, course_id).await
    }

    /// Mark a lesson complete. Returns `true` if the row changed.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn mark_complete_in(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<bool> {
        let changed = sqlx::query(
            r"
            INSERT INTO user_progress (id, user_id, lesson_id, completed, completed_at)
            VALUES ($1, $2, $3, 1, $4)
            ON CONFLICT (user_id, lesson_id) DO UPDATE SET
                completed = 1,
                completed_at = COALESCE(user_progress.completed_at, excluded.completed_at)
            WHERE user_progress.completed = 0
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id.to_string())
        .bind(lesson_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to record lesson progress: {e}")))?
        .rows_affected();

        Ok(changed > 0)
    }

    /// Completed lesson ids of a course for a user, in course order
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn completed_lessons_in(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<Vec<Uuid>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r"
            SELECT p.lesson_id
            FROM user_progress p
            JOIN lessons l ON l.id = p.lesson_id
            JOIN course_modules m ON m.id = l.module_id
            WHERE p.user_id = $1 AND m.course_id = $2 AND p.completed = 1
            ORDER BY m.module_order, l.lesson_order
            ",
        )
        .bind(user_id.to_string())
        .bind(course_id.to_string())
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to load progress: {e}")))?;

        ids.iter().map(|id| parse_uuid(id, "lesson id")).collect()
    }

    /// `(completed, total)` lesson counts of a course for a user
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn lesson_counts_in(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<(u64, u64)> {
        let (completed, total): (i64, i64) = sqlx::query_as(
            r"
            SELECT
                COUNT(p.id) AS completed,
                COUNT(l.id) AS total
            FROM lessons l
            JOIN course_modules m ON m.id = l.module_id
            LEFT JOIN user_progress p
                ON p.lesson_id = l.id AND p.user_id = $1 AND p.completed = 1
            WHERE m.course_id = $2
            ",
        )
        .bind(user_id.to_string())
        .bind(course_id.to_string())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to count progress: {e}")))?;

        Ok((
            u64::try_from(completed).unwrap_or(0),
            u64::try_from(total).unwrap_or(0),
        ))
    }

    /// Delete a user's progress rows for every lesson of a course
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn delete_for_course_in(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<u64> {
        let deleted = sqlx::query(
            r"
            DELETE FROM user_progress
            WHERE user_id = $1
              AND lesson_id IN (
                  SELECT l.id FROM lessons l
                  JOIN course_modules m ON m.id = l.module_id
                  WHERE m.course_id = $2
              )
            ",
        )
        .bind(user_id.to_string())
        .bind(course_id.to_string())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to reset progress: {e}")))?
        .rows_affected();

        Ok(deleted)
    }

    /// Users of the site with at least one completed lesson in the course
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn users_with_progress_in(
        conn: &mut SqliteConnection,
        tenant_id: TenantId,
        course_id: Uuid,
    ) -> AppResult<Vec<Uuid>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r"
            SELECT DISTINCT p.user_id
            FROM user_progress p
            JOIN users u ON u.id = p.user_id
            JOIN lessons l ON l.id = p.lesson_id
            JOIN course_modules m ON m.id = l.module_id
            WHERE u.tenant_id = $1 AND m.course_id = $2 AND p.completed = 1
            ORDER BY p.user_id
            ",
        )
        .bind(tenant_id.to_string())
        .bind(course_id.to_string())
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to list learners: {e}")))?;

        ids.iter().map(|id| parse_uuid(id, "user id")).collect()
    }
}
