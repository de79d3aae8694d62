// ABOUTME: Progress tracker: idempotent lesson completion, next lesson, course completion
// ABOUTME: Completing the last lesson of a course without a final assessment issues its certificate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::certificates::CertificateIssuer;
use super::{ensure_enrolled, Actor};
use crate::database::{CourseManager, CourseTree, Database, ProgressManager, UserManager};
use crate::errors::{AppError, AppResult};
use lms_core::models::{next_in_order, Course, LessonKind, TenantId};
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;

/// Result of completing a lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCompletion {
    /// Completed lesson
    pub lesson_id: Uuid,
    /// Lesson after this one in course order; `None` for the last lesson
    pub next_lesson_id: Option<Uuid>,
    /// Every lesson of the course is now complete
    pub course_complete: bool,
    /// Completion certificate, when the course issues one on lesson completion
    pub certificate_id: Option<Uuid>,
    /// Number of that certificate
    pub certificate_number: Option<String>,
}

/// A learner's progress through a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    /// Course
    pub course_id: Uuid,
    /// Completed lessons in course order
    pub completed_lesson_ids: Vec<Uuid>,
    /// Number of completed lessons
    pub completed_lessons: u64,
    /// Number of lessons in the course
    pub total_lessons: u64,
    /// All lessons complete (never true for an empty course)
    pub is_complete: bool,
    /// First lesson in order not yet completed
    pub next_lesson_id: Option<Uuid>,
}

/// Progress tracker
#[derive(Clone)]
pub struct ProgressTracker {
    database: Database,
}

impl ProgressTracker {
    /// Create a new progress tracker
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    /// Mark a non-quiz lesson complete for the caller
    ///
    /// Calling this again for a completed lesson changes nothing and returns
    /// the same certificate reference.
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown course or lesson, permission-denied
    /// when the caller is not enrolled, and invalid-input for quiz lessons
    pub async fn complete_lesson(
        &self,
        actor: &Actor,
        course_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<LessonCompletion> {
        let mut guard = self.database.begin().await?;
        let conn = guard.executor()?;

        let course = CourseManager::get_course_in(conn, actor.tenant_id, course_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Course {course_id}")))?;
        let lesson = CourseManager::get_lesson_in(conn, actor.tenant_id, course_id, lesson_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Lesson {lesson_id}")))?;
        ensure_enrolled(conn, actor, course_id).await?;

        if lesson.content.kind() == LessonKind::Quiz {
            return Err(AppError::invalid_input(
                "Quiz lessons are completed by passing their quiz",
            ));
        }

        let completion = Self::record_completion_in(conn, actor, &course, lesson_id).await?;
        guard.commit().await?;
        Ok(completion)
    }

    /// Record a completion and run the course-completion path on the
    /// caller's transaction
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation or certificate issuance fails
    pub(crate) async fn record_completion_in(
        conn: &mut SqliteConnection,
        actor: &Actor,
        course: &Course,
        lesson_id: Uuid,
    ) -> AppResult<LessonCompletion> {
        let changed = ProgressManager::mark_complete_in(conn, actor.user_id, lesson_id).await?;
        let order = CourseManager::lesson_ids_in_order(conn, course.id).await?;
        let next_lesson_id = next_in_order(&order, lesson_id);
        let course_complete = Self::is_course_complete_in(conn, actor.user_id, course.id).await?;

        let certificate = if course_complete && course.final_assessment.is_none() {
            Some(
                CertificateIssuer::issue_completion_in(
                    conn,
                    actor.tenant_id,
                    actor.user_id,
                    course.id,
                )
                .await?,
            )
        } else {
            None
        };

        if changed {
            info!(
                tenant_id = %actor.tenant_id,
                user_id = %actor.user_id,
                course_id = %course.id,
                lesson_id = %lesson_id,
                course_complete,
                "Lesson completed"
            );
        }

        Ok(LessonCompletion {
            lesson_id,
            next_lesson_id,
            course_complete,
            certificate_id: certificate.as_ref().map(|c| c.id),
            certificate_number: certificate.map(|c| c.certificate_number),
        })
    }

    /// Lesson following `lesson_id` in `(module order, lesson order)`
    ///
    /// # Errors
    ///
    /// Returns not-found if the lesson is not part of the site's course
    pub async fn find_next_lesson(
        &self,
        tenant_id: TenantId,
        course_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<Option<Uuid>> {
        let mut conn = self
            .database
            .pool()
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;

        if CourseManager::get_lesson_in(&mut conn, tenant_id, course_id, lesson_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found(format!("Lesson {lesson_id}")));
        }
        let order = CourseManager::lesson_ids_in_order(&mut conn, course_id).await?;
        Ok(next_in_order(&order, lesson_id))
    }

    /// Whether the user completed every lesson of a non-empty course
    ///
    /// # Errors
    ///
    /// Returns not-found for a course outside the site
    pub async fn is_course_complete(
        &self,
        tenant_id: TenantId,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<bool> {
        let mut conn = self
            .database
            .pool()
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;

        if !CourseManager::course_exists_in(&mut conn, tenant_id, course_id).await? {
            return Err(AppError::not_found(format!("Course {course_id}")));
        }
        Self::is_course_complete_in(&mut conn, user_id, course_id).await
    }

    /// Completion check on an existing connection
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub(crate) async fn is_course_complete_in(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<bool> {
        let (completed, total) = ProgressManager::lesson_counts_in(conn, user_id, course_id).await?;
        Ok(total > 0 && completed == total)
    }

    /// Course tree as seen by an enrolled learner or an administrator
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown course and permission-denied when
    /// the caller is not enrolled
    pub async fn course_outline(&self, actor: &Actor, course_id: Uuid) -> AppResult<CourseTree> {
        let mut conn = self
            .database
            .pool()
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;

        let tree = CourseManager::get_course_tree_in(&mut conn, actor.tenant_id, course_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Course {course_id}")))?;
        ensure_enrolled(&mut conn, actor, course_id).await?;
        Ok(tree)
    }

    /// The caller's progress through a course
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown course and permission-denied when
    /// the caller is not enrolled
    pub async fn course_progress(
        &self,
        actor: &Actor,
        course_id: Uuid,
    ) -> AppResult<CourseProgress> {
        let mut conn = self
            .database
            .pool()
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;

        if !CourseManager::course_exists_in(&mut conn, actor.tenant_id, course_id).await? {
            return Err(AppError::not_found(format!("Course {course_id}")));
        }
        ensure_enrolled(&mut conn, actor, course_id).await?;

        let order = CourseManager::lesson_ids_in_order(&mut conn, course_id).await?;
        let completed =
            ProgressManager::completed_lessons_in(&mut conn, actor.user_id, course_id).await?;
        let next_lesson_id = order.iter().find(|id| !completed.contains(id)).copied();
        let total_lessons = order.len() as u64;
        let completed_lessons = completed.len() as u64;

        Ok(CourseProgress {
            course_id,
            completed_lesson_ids: completed,
            completed_lessons,
            total_lessons,
            is_complete: total_lessons > 0 && completed_lessons == total_lessons,
            next_lesson_id,
        })
    }

    /// Delete a user's progress for every lesson of a course; certificates stay
    ///
    /// # Errors
    ///
    /// Returns not-found if the user or course is not in the site
    pub async fn reset_progress(
        &self,
        tenant_id: TenantId,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<u64> {
        let mut guard = self.database.begin().await?;
        let conn = guard.executor()?;

        if !CourseManager::course_exists_in(conn, tenant_id, course_id).await? {
            return Err(AppError::not_found(format!("Course {course_id}")));
        }
        if UserManager::get_user_in(conn, tenant_id, user_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found(format!("User {user_id}")));
        }

        let deleted = Self::reset_progress_in(conn, user_id, course_id).await?;
        guard.commit().await?;
        Ok(deleted)
    }

    /// Progress reset on the caller's transaction
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub(crate) async fn reset_progress_in(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<u64> {
        let deleted = ProgressManager::delete_for_course_in(conn, user_id, course_id).await?;
        info!(user_id = %user_id, course_id = %course_id, deleted, "Reset lesson progress");
        Ok(deleted)
    }
}
