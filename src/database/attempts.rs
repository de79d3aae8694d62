// ABOUTME: Append-only logs of pre-test, lesson quiz and final assessment attempts
// ABOUTME: Final attempts are counted per assessment cycle; cycles open on retake or retraining
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::{AppError, AppResult};
use chrono::Utc;
use lms_core::models::{ScoreSummary, TenantId};
use serde::Serialize;
use sqlx::SqliteConnection;
use std::fmt;
use uuid::Uuid;

/// Why a new assessment cycle was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleReason {
    /// Learner re-completed the course after exhausting attempts
    Retake,
    /// Administrator-initiated retraining
    Retraining,
}

impl CycleReason {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Retake => "retake",
            Self::Retraining => "retraining",
        }
    }
}

impl fmt::Display for CycleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who and what an attempt row is about
#[derive(Debug, Clone, Copy)]
pub struct AttemptSubject {
    /// Site of the course
    pub tenant_id: TenantId,
    /// Learner
    pub user_id: Uuid,
    /// Course
    pub course_id: Uuid,
}

/// Attempt log operations; every write happens inside a submission transaction
pub struct AttemptManager;

impl AttemptManager {
    /// Append a lesson quiz attempt
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn record_quiz_attempt_in(
        conn: &mut SqliteConnection,
        subject: AttemptSubject,
        lesson_id: Uuid,
        summary: &ScoreSummary,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO quiz_attempts
                (id, tenant_id, user_id, course_id, lesson_id, score, total, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(subject.tenant_id.to_string())
        .bind(subject.user_id.to_string())
        .bind(subject.course_id.to_string())
        .bind(lesson_id.to_string())
        .bind(i64::from(summary.score))
        .bind(i64::from(summary.total))
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to record quiz attempt: {e}")))?;
        Ok(())
    }

    /// Whether the learner already took the course's pre-test
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn has_pre_test_attempt_in(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM pre_test_attempts WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id.to_string())
        .bind(course_id.to_string())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to check pre-test attempts: {e}")))?;
        Ok(count > 0)
    }

    /// Append the single pre-test attempt
    ///
    /// # Errors
    ///
    /// Returns a conflict if an attempt already exists
    pub async fn record_pre_test_attempt_in(
        conn: &mut SqliteConnection,
        subject: AttemptSubject,
        summary: &ScoreSummary,
        passed: bool,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO pre_test_attempts
                (id, tenant_id, user_id, course_id, score, total, passed, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(subject.tenant_id.to_string())
        .bind(subject.user_id.to_string())
        .bind(subject.course_id.to_string())
        .bind(i64::from(summary.score))
        .bind(i64::from(summary.total))
        .bind(passed)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if super::is_unique_violation(&e, None) {
                AppError::conflict("Pre-test already submitted")
            } else {
                AppError::database(format!("Failed to record pre-test attempt: {e}"))
            }
        })?;
        Ok(())
    }

    /// Current assessment cycle (0 until a retake or retraining opens one)
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn current_cycle_in(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<u32> {
        let cycle: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(cycle) FROM assessment_cycles WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user_id.to_string())
        .bind(course_id.to_string())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to read assessment cycle: {e}")))?;

        cycle.map_or(Ok(0), |c| {
            u32::try_from(c).map_err(|_| AppError::integrity(format!("Invalid stored cycle {c}")))
        })
    }

    /// Open the next assessment cycle and return its number
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn start_cycle_in(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        course_id: Uuid,
        reason: CycleReason,
    ) -> AppResult<u32> {
        let next = Self::current_cycle_in(conn, user_id, course_id).await? + 1;
        sqlx::query(
            r"
            INSERT INTO assessment_cycles (user_id, course_id, cycle, started_at, reason)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(user_id.to_string())
        .bind(course_id.to_string())
        .bind(i64::from(next))
        .bind(Utc::now().to_rfc3339())
        .bind(reason.as_str())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to open assessment cycle: {e}")))?;
        Ok(next)
    }

    /// Final assessment attempts made in a cycle
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn count_final_attempts_in(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        course_id: Uuid,
        cycle: u32,
    ) -> AppResult<u32> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM final_assessment_attempts
            WHERE user_id = $1 AND course_id = $2 AND cycle = $3
            ",
        )
        .bind(user_id.to_string())
        .bind(course_id.to_string())
        .bind(i64::from(cycle))
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to count final attempts: {e}")))?;

        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    /// Append a final assessment attempt
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn record_final_attempt_in(
        conn: &mut SqliteConnection,
        subject: AttemptSubject,
        cycle: u32,
        summary: &ScoreSummary,
        passed: bool,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO final_assessment_attempts
                (id, tenant_id, user_id, course_id, cycle, score, total, passed, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(subject.tenant_id.to_string())
        .bind(subject.user_id.to_string())
        .bind(subject.course_id.to_string())
        .bind(i64::from(cycle))
        .bind(i64::from(summary.score))
        .bind(i64::from(summary.total))
        .bind(passed)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to record final attempt: {e}")))?;
        Ok(())
    }
}
