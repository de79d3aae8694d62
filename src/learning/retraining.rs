// ABOUTME: Retraining engine: resets lesson progress for every learner who completed a course
// ABOUTME: Certificates are kept; each reset learner starts a fresh assessment cycle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::progress::ProgressTracker;
use crate::database::{AttemptManager, CourseManager, CycleReason, Database, ProgressManager};
use crate::errors::{AppError, AppResult};
use lms_core::models::TenantId;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Result of a retraining run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrainingReport {
    /// Site
    pub tenant_id: TenantId,
    /// Course
    pub course_id: Uuid,
    /// Learners whose progress was reset
    pub reset_user_ids: Vec<Uuid>,
    /// Progress rows deleted
    pub progress_rows_deleted: u64,
}

/// Retraining engine
#[derive(Clone)]
pub struct RetrainingEngine {
    database: Database,
}

impl RetrainingEngine {
    /// Create a new retraining engine
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    /// Reset progress for every learner of the site who completed the course
    ///
    /// # Errors
    ///
    /// Returns not-found for a course outside the site
    pub async fn retrain_completed_users(
        &self,
        tenant_id: TenantId,
        course_id: Uuid,
    ) -> AppResult<RetrainingReport> {
        let mut guard = self.database.begin().await?;
        let conn = guard.executor()?;

        if !CourseManager::course_exists_in(conn, tenant_id, course_id).await? {
            return Err(AppError::not_found(format!("Course {course_id}")));
        }

        let mut reset_user_ids = Vec::new();
        let mut progress_rows_deleted = 0;
        for user_id in ProgressManager::users_with_progress_in(conn, tenant_id, course_id).await? {
            if !ProgressTracker::is_course_complete_in(conn, user_id, course_id).await? {
                continue;
            }
            progress_rows_deleted +=
                ProgressTracker::reset_progress_in(conn, user_id, course_id).await?;
            AttemptManager::start_cycle_in(conn, user_id, course_id, CycleReason::Retraining)
                .await?;
            reset_user_ids.push(user_id);
        }
        guard.commit().await?;

        info!(
            tenant_id = %tenant_id,
            course_id = %course_id,
            users = reset_user_ids.len(),
            progress_rows_deleted,
            "Retraining reset completed learners"
        );

        Ok(RetrainingReport {
            tenant_id,
            course_id,
            reset_user_ids,
            progress_rows_deleted,
        })
    }
}
