// ABOUTME: Integration tests for the retraining batch reset
// ABOUTME: Only learners who completed the course are reset; certificates survive and attempts reopen
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{
    actor, answers_with_score, correct_answers, course_draft, create_course, create_learner,
    create_test_database, enroll, lesson_ids, quiz, with_final_assessment, MAIN, NORTH,
};
use lms_server::errors::ErrorCode;
use lms_server::learning::{AssessmentEngine, ProgressTracker, RetrainingEngine};

#[tokio::test]
async fn test_only_complete_learners_are_reset() {
    let database = create_test_database().await;
    let tracker = ProgressTracker::new(database.clone());
    let engine = RetrainingEngine::new(database.clone());
    let course = create_course(&database, MAIN, &course_draft("Fire safety", &[1, 2])).await;
    let lessons = lesson_ids(&course);

    let done = create_learner(&database, MAIN, "ada").await;
    let halfway = create_learner(&database, MAIN, "alan").await;
    for learner in [&done, &halfway] {
        enroll(&database, learner, course.course.id).await;
    }
    for &lesson in &lessons {
        tracker
            .complete_lesson(&actor(&done), course.course.id, lesson)
            .await
            .unwrap();
    }
    tracker
        .complete_lesson(&actor(&halfway), course.course.id, lessons[0])
        .await
        .unwrap();

    let report = engine
        .retrain_completed_users(MAIN, course.course.id)
        .await
        .unwrap();
    assert_eq!(report.reset_user_ids, vec![done.id]);
    assert_eq!(report.progress_rows_deleted, 3);

    let reset = tracker
        .course_progress(&actor(&done), course.course.id)
        .await
        .unwrap();
    assert_eq!(reset.completed_lessons, 0);
    let untouched = tracker
        .course_progress(&actor(&halfway), course.course.id)
        .await
        .unwrap();
    assert_eq!(untouched.completed_lessons, 1);

    // The completion certificate is historical and stays
    assert_eq!(
        database
            .certificates()
            .count_completions(done.id, course.course.id)
            .await
            .unwrap(),
        1
    );

    // Nothing left to reset on a second run
    let again = engine
        .retrain_completed_users(MAIN, course.course.id)
        .await
        .unwrap();
    assert!(again.reset_user_ids.is_empty());
    assert_eq!(again.progress_rows_deleted, 0);
}

#[tokio::test]
async fn test_retraining_reopens_final_assessment_attempts() {
    let database = create_test_database().await;
    let tracker = ProgressTracker::new(database.clone());
    let assessments = AssessmentEngine::new(database.clone());
    let engine = RetrainingEngine::new(database.clone());
    let draft = with_final_assessment(course_draft("Hazmat", &[1]), 4, 100, 1);
    let course = create_course(&database, MAIN, &draft).await;
    let learner = create_learner(&database, MAIN, "grace").await;
    enroll(&database, &learner, course.course.id).await;
    let lesson = lesson_ids(&course)[0];

    tracker
        .complete_lesson(&actor(&learner), course.course.id, lesson)
        .await
        .unwrap();
    let passed = assessments
        .submit_final_assessment(&actor(&learner), course.course.id, &correct_answers(&quiz(4)))
        .await
        .unwrap();
    assert!(passed.passed);

    engine
        .retrain_completed_users(MAIN, course.course.id)
        .await
        .unwrap();

    tracker
        .complete_lesson(&actor(&learner), course.course.id, lesson)
        .await
        .unwrap();
    let retry = assessments
        .submit_final_assessment(
            &actor(&learner),
            course.course.id,
            &answers_with_score(&quiz(4), 2),
        )
        .await
        .unwrap();
    assert_eq!(retry.attempts_used, 1);
    assert!(!retry.passed);
    assert!(retry.retake_required);
    assert_eq!(
        database
            .certificates()
            .count_completions(learner.id, course.course.id)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_retraining_is_site_scoped() {
    let database = create_test_database().await;
    let engine = RetrainingEngine::new(database.clone());
    let course = create_course(&database, MAIN, &course_draft("Knots", &[1])).await;

    let err = engine
        .retrain_completed_users(NORTH, course.course.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}
