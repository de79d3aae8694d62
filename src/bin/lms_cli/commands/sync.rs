// ABOUTME: Course sync command for lms-cli
// ABOUTME: Runs the sync engine and prints one line per target; fails if no target synced
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use lms_server::database::Database;
use lms_server::errors::{AppError, AppResult};
use lms_server::learning::{CourseSyncEngine, SyncOutcome, TargetStatus};
use lms_server::models::TenantId;
use tracing::warn;
use uuid::Uuid;

/// Sync a master course into the target sites
pub async fn run(
    database: &Database,
    primary_site: TenantId,
    course: Uuid,
    targets: &[TenantId],
) -> AppResult<()> {
    let engine = CourseSyncEngine::new(database.clone(), primary_site);
    let report = engine.sync_course(course, targets).await?;

    for target in &report.targets {
        match target.status {
            TargetStatus::Synced => println!(
                "ok     {}  course {}  ({} modules, {} lessons)",
                target.tenant_id,
                target
                    .target_course_id
                    .map_or_else(|| "-".to_owned(), |id| id.to_string()),
                target.modules,
                target.lessons
            ),
            TargetStatus::Failed => println!(
                "failed {}  {}",
                target.tenant_id,
                target.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    match report.outcome {
        SyncOutcome::Success => Ok(()),
        SyncOutcome::Partial => {
            warn!("Some targets failed to sync");
            Ok(())
        }
        SyncOutcome::Failed => Err(AppError::internal("No target site was synced")),
    }
}
