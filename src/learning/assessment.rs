// ABOUTME: Assessment engine: pre-test, lesson quiz and final assessment submissions
// ABOUTME: Scores answers, applies pass and attempt-limit policy, triggers completion and certificates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Assessment engine
//!
//! Three call sites share one scoring routine ([`QuizContent::score`]):
//!
//! - **Pre-test**: one attempt per learner and course, scored against the
//!   pre-test passing rate. Passing never issues a certificate.
//! - **Lesson quiz**: unlimited attempts, passes only on a perfect score. A
//!   pass completes the lesson through the [`ProgressTracker`].
//! - **Final assessment**: limited attempts per assessment cycle, scored
//!   against the course passing rate. The first pass issues the completion
//!   certificate; a failing last attempt resets the learner's progress.
//!
//! Every submission runs in one transaction: the attempt row, progress,
//! certificate and signatory rows commit together or not at all.

use super::certificates::CertificateIssuer;
use super::progress::ProgressTracker;
use super::{ensure_enrolled, Actor};
use crate::database::{
    AttemptManager, AttemptSubject, CourseManager, CycleReason, Database, ProgressManager,
};
use crate::errors::{AppError, AppResult};
use lms_core::models::{Answers, AssessmentPolicy, Course, QuizContent};
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of the single pre-test attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreTestOutcome {
    /// Correct answers
    pub score: u32,
    /// Questions
    pub total: u32,
    /// Score in percent
    pub percentage: f64,
    /// Reached the passing rate
    pub passed: bool,
    /// Passing rate applied
    pub passing_rate: u8,
}

/// Result of a lesson quiz submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOutcome {
    /// Correct answers
    pub score: u32,
    /// Questions
    pub total: u32,
    /// Every question answered correctly
    pub passed: bool,
    /// Indices of correctly answered questions
    pub correct_questions: Vec<usize>,
    /// Lesson after the quiz when passed; `None` when failed or last
    pub next_lesson_id: Option<Uuid>,
    /// Every lesson of the course is complete
    pub course_complete: bool,
    /// Completion certificate issued or reused through lesson completion
    pub certificate_id: Option<Uuid>,
}

/// Result of a final assessment submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalAssessmentOutcome {
    /// Correct answers
    pub score: u32,
    /// Questions
    pub total: u32,
    /// Score in percent
    pub percentage: f64,
    /// Reached the passing rate
    pub passed: bool,
    /// Completion certificate (new or existing) when passed
    pub certificate_id: Option<Uuid>,
    /// Number of that certificate
    pub certificate_number: Option<String>,
    /// Attempts are exhausted and lesson progress was reset
    pub retake_required: bool,
    /// Attempts used in the current cycle, including this one
    pub attempts_used: u32,
    /// Attempts allowed per cycle
    pub max_attempts: u32,
}

/// Result of starting a retake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetakeOutcome {
    /// Newly opened assessment cycle
    pub cycle: u32,
    /// Attempts available in the new cycle
    pub attempts_remaining: u32,
}

/// Assessment engine
#[derive(Clone)]
pub struct AssessmentEngine {
    database: Database,
}

impl AssessmentEngine {
    /// Create a new assessment engine
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    /// Score the caller's one pre-test attempt
    ///
    /// # Errors
    ///
    /// Returns not-found when the course has no pre-test, permission-denied
    /// when not enrolled, and a conflict on a second submission
    pub async fn submit_pre_test(
        &self,
        actor: &Actor,
        course_id: Uuid,
        answers: &Answers,
    ) -> AppResult<PreTestOutcome> {
        let mut guard = self.database.begin().await?;
        let conn = guard.executor()?;

        let course = load_course(conn, actor, course_id).await?;
        let pre_test = course
            .pre_test
            .ok_or_else(|| AppError::not_found("Pre-test"))?;
        ensure_enrolled(conn, actor, course_id).await?;

        if AttemptManager::has_pre_test_attempt_in(conn, actor.user_id, course_id).await? {
            return Err(AppError::conflict("Pre-test already submitted"));
        }

        let summary = pre_test.content.score(answers);
        let passed = summary.meets(pre_test.passing_rate);
        AttemptManager::record_pre_test_attempt_in(
            conn,
            subject(actor, course_id),
            &summary,
            passed,
        )
        .await?;
        guard.commit().await?;

        info!(
            tenant_id = %actor.tenant_id,
            user_id = %actor.user_id,
            course_id = %course_id,
            score = summary.score,
            total = summary.total,
            passed,
            "Pre-test submitted"
        );

        Ok(PreTestOutcome {
            score: summary.score,
            total: summary.total,
            percentage: summary.percentage(),
            passed,
            passing_rate: pre_test.passing_rate,
        })
    }

    /// Score a lesson quiz; a perfect score completes the lesson
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown course or lesson, invalid-input when
    /// the lesson is not a quiz, and permission-denied when not enrolled
    pub async fn submit_lesson_quiz(
        &self,
        actor: &Actor,
        course_id: Uuid,
        lesson_id: Uuid,
        answers: &Answers,
    ) -> AppResult<QuizOutcome> {
        let mut guard = self.database.begin().await?;
        let conn = guard.executor()?;

        let course = load_course(conn, actor, course_id).await?;
        let lesson = CourseManager::get_lesson_in(conn, actor.tenant_id, course_id, lesson_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Lesson {lesson_id}")))?;
        let quiz: &QuizContent = lesson
            .content
            .quiz()
            .ok_or_else(|| AppError::invalid_input("Lesson is not a quiz"))?;
        ensure_enrolled(conn, actor, course_id).await?;

        let summary = quiz.score(answers);
        AttemptManager::record_quiz_attempt_in(conn, subject(actor, course_id), lesson_id, &summary)
            .await?;

        let passed = summary.is_perfect();
        let completion = if passed {
            Some(ProgressTracker::record_completion_in(conn, actor, &course, lesson_id).await?)
        } else {
            None
        };
        guard.commit().await?;

        info!(
            tenant_id = %actor.tenant_id,
            user_id = %actor.user_id,
            lesson_id = %lesson_id,
            score = summary.score,
            total = summary.total,
            passed,
            "Lesson quiz submitted"
        );

        Ok(QuizOutcome {
            score: summary.score,
            total: summary.total,
            passed,
            correct_questions: summary.correct_questions,
            next_lesson_id: completion.as_ref().and_then(|c| c.next_lesson_id),
            course_complete: completion.as_ref().is_some_and(|c| c.course_complete),
            certificate_id: completion.and_then(|c| c.certificate_id),
        })
    }

    /// Score a final assessment attempt
    ///
    /// # Errors
    ///
    /// Returns not-found when the course has no final assessment,
    /// permission-denied when not enrolled or lessons are incomplete, and
    /// attempt-limit when the current cycle's attempts are used up (no
    /// attempt is recorded in that case)
    pub async fn submit_final_assessment(
        &self,
        actor: &Actor,
        course_id: Uuid,
        answers: &Answers,
    ) -> AppResult<FinalAssessmentOutcome> {
        let mut guard = self.database.begin().await?;
        let conn = guard.executor()?;

        let course = load_course(conn, actor, course_id).await?;
        let policy = final_policy(&course)?;
        ensure_enrolled(conn, actor, course_id).await?;
        ensure_lessons_complete(conn, actor, course_id, "before the final assessment").await?;

        let cycle = AttemptManager::current_cycle_in(conn, actor.user_id, course_id).await?;
        let used =
            AttemptManager::count_final_attempts_in(conn, actor.user_id, course_id, cycle).await?;
        if used >= policy.max_attempts {
            return Err(AppError::attempt_limit("Maximum attempts reached"));
        }

        let summary = policy.content.score(answers);
        let passed = summary.meets(policy.passing_rate);
        AttemptManager::record_final_attempt_in(
            conn,
            subject(actor, course_id),
            cycle,
            &summary,
            passed,
        )
        .await?;
        let attempts_used = used + 1;

        let certificate = if passed {
            Some(
                CertificateIssuer::issue_completion_in(
                    conn,
                    actor.tenant_id,
                    actor.user_id,
                    course_id,
                )
                .await?,
            )
        } else {
            None
        };

        let retake_required = !passed && attempts_used >= policy.max_attempts;
        if retake_required {
            ProgressTracker::reset_progress_in(conn, actor.user_id, course_id).await?;
            warn!(
                tenant_id = %actor.tenant_id,
                user_id = %actor.user_id,
                course_id = %course_id,
                cycle,
                "Final assessment attempts exhausted, progress reset"
            );
        }
        guard.commit().await?;

        info!(
            tenant_id = %actor.tenant_id,
            user_id = %actor.user_id,
            course_id = %course_id,
            score = summary.score,
            total = summary.total,
            passed,
            attempts_used,
            "Final assessment submitted"
        );

        Ok(FinalAssessmentOutcome {
            score: summary.score,
            total: summary.total,
            percentage: summary.percentage(),
            passed,
            certificate_id: certificate.as_ref().map(|c| c.id),
            certificate_number: certificate.map(|c| c.certificate_number),
            retake_required,
            attempts_used,
            max_attempts: policy.max_attempts,
        })
    }

    /// Open a new assessment cycle after attempts ran out and every lesson
    /// was completed again
    ///
    /// # Errors
    ///
    /// Returns a conflict while attempts remain and permission-denied until
    /// the lessons are re-completed
    pub async fn start_retake(&self, actor: &Actor, course_id: Uuid) -> AppResult<RetakeOutcome> {
        let mut guard = self.database.begin().await?;
        let conn = guard.executor()?;

        let course = load_course(conn, actor, course_id).await?;
        let policy = final_policy(&course)?;
        ensure_enrolled(conn, actor, course_id).await?;

        let cycle = AttemptManager::current_cycle_in(conn, actor.user_id, course_id).await?;
        let used =
            AttemptManager::count_final_attempts_in(conn, actor.user_id, course_id, cycle).await?;
        if used < policy.max_attempts {
            return Err(AppError::conflict(format!(
                "{} attempt(s) remain in the current cycle",
                policy.max_attempts - used
            )));
        }
        ensure_lessons_complete(conn, actor, course_id, "before retaking the assessment").await?;

        let cycle =
            AttemptManager::start_cycle_in(conn, actor.user_id, course_id, CycleReason::Retake)
                .await?;
        guard.commit().await?;

        info!(
            tenant_id = %actor.tenant_id,
            user_id = %actor.user_id,
            course_id = %course_id,
            cycle,
            "Assessment retake started"
        );
        Ok(RetakeOutcome {
            cycle,
            attempts_remaining: policy.max_attempts,
        })
    }
}

const fn subject(actor: &Actor, course_id: Uuid) -> AttemptSubject {
    AttemptSubject {
        tenant_id: actor.tenant_id,
        user_id: actor.user_id,
        course_id,
    }
}

async fn load_course(
    conn: &mut SqliteConnection,
    actor: &Actor,
    course_id: Uuid,
) -> AppResult<Course> {
    CourseManager::get_course_in(conn, actor.tenant_id, course_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Course {course_id}")))
}

fn final_policy(course: &Course) -> AppResult<&AssessmentPolicy> {
    course
        .final_assessment
        .as_ref()
        .ok_or_else(|| AppError::not_found("Final assessment"))
}

async fn ensure_lessons_complete(
    conn: &mut SqliteConnection,
    actor: &Actor,
    course_id: Uuid,
    context: &str,
) -> AppResult<()> {
    let (completed, total) =
        ProgressManager::lesson_counts_in(conn, actor.user_id, course_id).await?;
    if completed < total {
        return Err(AppError::permission_denied(format!(
            "Complete every lesson {context} ({completed}/{total} done)"
        ))
        .with_details(serde_json::json!({ "completed": completed, "total": total })));
    }
    Ok(())
}
