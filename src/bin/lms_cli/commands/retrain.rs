// ABOUTME: Retraining command for lms-cli
// ABOUTME: Resets progress of every learner of a site who completed the given course
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use lms_server::database::Database;
use lms_server::errors::AppResult;
use lms_server::learning::RetrainingEngine;
use lms_server::models::TenantId;
use uuid::Uuid;

/// Run retraining for one course of one site
pub async fn run(database: &Database, site: TenantId, course: Uuid) -> AppResult<()> {
    let report = RetrainingEngine::new(database.clone())
        .retrain_completed_users(site, course)
        .await?;

    println!(
        "Reset {} learner(s), {} progress row(s) removed",
        report.reset_user_ids.len(),
        report.progress_rows_deleted
    );
    for user_id in &report.reset_user_ids {
        println!("  {user_id}");
    }
    Ok(())
}
