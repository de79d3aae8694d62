// ABOUTME: Integration tests for replicating a master course into branch sites
// ABOUTME: Covers tree replication, preserved local fields, signatories and per-target failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{
    course_draft, create_course, create_global_signatory, create_site_signatory,
    create_test_database, with_final_assessment, MAIN, NORTH, SOUTH,
};
use lms_server::database::{CourseTree, Database};
use lms_server::errors::ErrorCode;
use lms_server::learning::{CourseSyncEngine, SyncOutcome, TargetStatus};
use lms_server::models::TenantId;
use uuid::Uuid;

const TITLE: &str = "Fire safety";

async fn master_course(database: &Database) -> CourseTree {
    let signatory = create_global_signatory(database, "Grace").await;
    let mut draft = with_final_assessment(course_draft(TITLE, &[2, 3]), 5, 80, 3);
    draft.description = Some("Master description".to_owned());
    draft.venue = Some("Hall A".to_owned());
    draft.price_cents = 10_000;
    draft.signatory_ids = vec![signatory.id];
    create_course(database, MAIN, &draft).await
}

async fn branch_course(database: &Database, tenant_id: TenantId) -> CourseTree {
    let mut draft = course_draft(TITLE, &[1]);
    draft.description = Some("Stale description".to_owned());
    draft.price_cents = 2_500;
    create_course(database, tenant_id, &draft).await
}

async fn tree(database: &Database, tenant_id: TenantId, course_id: Uuid) -> CourseTree {
    database
        .courses()
        .get_course_tree(tenant_id, course_id)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_sync_replicates_tree_into_every_target() {
    let database = create_test_database().await;
    let engine = CourseSyncEngine::new(database.clone(), MAIN);
    let master = master_course(&database).await;
    let north = branch_course(&database, NORTH).await;
    let south = branch_course(&database, SOUTH).await;

    let report = engine
        .sync_course(master.course.id, &[NORTH, SOUTH])
        .await
        .unwrap();
    assert_eq!(report.outcome, SyncOutcome::Success);
    assert_eq!(report.targets.len(), 2);

    for (result, branch) in report.targets.iter().zip([&north, &south]) {
        assert_eq!(result.status, TargetStatus::Synced);
        assert_eq!(result.target_course_id, Some(branch.course.id));
        assert_eq!(result.modules, 2);
        assert_eq!(result.lessons, 5);

        let synced = tree(&database, result.tenant_id, branch.course.id).await;
        assert_eq!(synced.modules.len(), 2);
        assert_eq!(synced.lesson_count(), 5);
        let titles: Vec<_> = synced
            .modules
            .iter()
            .flat_map(|m| m.lessons.iter().map(|l| l.title.clone()))
            .collect();
        let master_titles: Vec<_> = master
            .modules
            .iter()
            .flat_map(|m| m.lessons.iter().map(|l| l.title.clone()))
            .collect();
        assert_eq!(titles, master_titles);

        assert_eq!(synced.course.title, TITLE);
        assert_eq!(synced.course.price_cents, 2_500);
        assert_eq!(synced.course.description.as_deref(), Some("Master description"));
        assert_eq!(synced.course.venue.as_deref(), Some("Hall A"));
        assert_eq!(synced.course.final_assessment, master.course.final_assessment);
        assert_eq!(synced.signatory_ids, master.signatory_ids);
    }

    // Master is untouched
    let after = tree(&database, MAIN, master.course.id).await;
    assert_eq!(after, master);
}

#[tokio::test]
async fn test_missing_target_course_gives_partial_outcome() {
    let database = create_test_database().await;
    let engine = CourseSyncEngine::new(database.clone(), MAIN);
    let master = master_course(&database).await;
    branch_course(&database, NORTH).await;

    let report = engine
        .sync_course(master.course.id, &[NORTH, SOUTH])
        .await
        .unwrap();
    assert_eq!(report.outcome, SyncOutcome::Partial);
    assert_eq!(report.targets[0].status, TargetStatus::Synced);
    assert_eq!(report.targets[1].tenant_id, SOUTH);
    assert_eq!(report.targets[1].status, TargetStatus::Failed);
    assert!(report.targets[1].error.is_some());
    assert_eq!(report.targets[1].lessons, 0);
}

#[tokio::test]
async fn test_target_failures_leave_target_untouched() {
    let database = create_test_database().await;
    let engine = CourseSyncEngine::new(database.clone(), MAIN);
    let main_only = create_site_signatory(&database, MAIN, "Margaret").await;
    let mut draft = course_draft(TITLE, &[2]);
    draft.signatory_ids = vec![main_only.id];
    let master = create_course(&database, MAIN, &draft).await;
    let north = branch_course(&database, NORTH).await;

    let report = engine
        .sync_course(master.course.id, &[NORTH, MAIN, TenantId::new()])
        .await
        .unwrap();
    assert_eq!(report.outcome, SyncOutcome::Failed);
    assert!(report
        .targets
        .iter()
        .all(|t| t.status == TargetStatus::Failed));

    // Rolled back: the branch keeps its own tree
    let unchanged = tree(&database, NORTH, north.course.id).await;
    assert_eq!(unchanged, north);
}

#[tokio::test]
async fn test_duplicate_targets_are_synced_once() {
    let database = create_test_database().await;
    let engine = CourseSyncEngine::new(database.clone(), MAIN);
    let master = master_course(&database).await;
    branch_course(&database, NORTH).await;

    let report = engine
        .sync_course(master.course.id, &[NORTH, NORTH])
        .await
        .unwrap();
    assert_eq!(report.targets.len(), 1);
    assert_eq!(report.outcome, SyncOutcome::Success);
}

#[tokio::test]
async fn test_sync_rejects_bad_requests() {
    let database = create_test_database().await;
    let engine = CourseSyncEngine::new(database.clone(), MAIN);
    let master = master_course(&database).await;
    let north = branch_course(&database, NORTH).await;

    let err = engine.sync_course(master.course.id, &[]).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);

    let err = engine
        .sync_course(Uuid::new_v4(), &[NORTH])
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    // A branch course is not a master course
    let err = engine
        .sync_course(north.course.id, &[SOUTH])
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}
