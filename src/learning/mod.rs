// ABOUTME: Learning engines: assessment, progress, certificates, course sync and retraining
// ABOUTME: Each engine wraps its multi-statement writes in a single transaction per call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Learning engines
//!
//! The engines sit between the HTTP routes and the database managers. A
//! learner submission flows through the [`AssessmentEngine`], which calls the
//! [`ProgressTracker`] for lesson quizzes and the [`CertificateIssuer`] on a
//! qualifying completion, all on the same transaction. Course sync and
//! retraining are administrator batch operations over the same schema.

/// Pre-test, lesson quiz and final assessment scoring and policy
pub mod assessment;
/// Certificate numbering, issuance, validation and listing
pub mod certificates;
/// Lesson completion and course completion
pub mod progress;
/// Bulk progress reset for learners who completed a course
pub mod retraining;
/// Master course replication into branch sites
pub mod sync;

pub use assessment::{
    AssessmentEngine, FinalAssessmentOutcome, PreTestOutcome, QuizOutcome, RetakeOutcome,
};
pub use certificates::{CertificateIssuer, IssuedCertificate};
pub use progress::{CourseProgress, LessonCompletion, ProgressTracker};
pub use retraining::{RetrainingEngine, RetrainingReport};
pub use sync::{CourseSyncEngine, SyncOutcome, SyncReport, TargetResult, TargetStatus};

use crate::database::EnrollmentManager;
use crate::errors::{AppError, AppResult};
use lms_core::models::TenantId;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// The authenticated caller of an engine operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Caller's site; every query is scoped to it
    pub tenant_id: TenantId,
    /// Caller
    pub user_id: Uuid,
    /// Administrators may act without an enrollment
    pub is_admin: bool,
}

impl Actor {
    /// A learner without administrator rights
    #[must_use]
    pub const fn learner(tenant_id: TenantId, user_id: Uuid) -> Self {
        Self {
            tenant_id,
            user_id,
            is_admin: false,
        }
    }
}

/// Reject callers who are neither enrolled nor administrators
pub(crate) async fn ensure_enrolled(
    conn: &mut SqliteConnection,
    actor: &Actor,
    course_id: Uuid,
) -> AppResult<()> {
    if actor.is_admin
        || EnrollmentManager::is_enrolled_in(conn, actor.tenant_id, actor.user_id, course_id)
            .await?
    {
        return Ok(());
    }
    Err(AppError::permission_denied("Not enrolled in this course"))
}
