// ABOUTME: Course sync engine: replicates a master course tree into branch sites
// ABOUTME: Targets are processed sequentially, one transaction each, failures do not stop the run
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Course sync
//!
//! The master course lives in the primary site. Each target site must
//! already hold a course with exactly the same title. Sync overwrites the
//! target's descriptive fields, assessment content, module/lesson tree and
//! signing set, but keeps the target's own title and price. Re-running a sync
//! is a full overwrite; nothing is versioned.
//!
//! The signing set is copied by id, so every master signatory must be in the
//! target site's pool. Only global signatories are in every pool: a master
//! signed by a primary-site signatory fails for every branch target and
//! leaves it untouched. Master courses meant for sync should be signed by
//! global signatories.

use crate::database::{
    CourseManager, CourseTree, Database, ModuleDraft, SignatoryManager, TenantManager,
};
use crate::errors::{AppError, AppResult};
use lms_core::models::TenantId;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

/// Outcome for one target site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    /// Target course now mirrors the master
    Synced,
    /// Target left unchanged
    Failed,
}

/// Per-target detail of a sync run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetResult {
    /// Target site
    pub tenant_id: TenantId,
    /// Outcome
    pub status: TargetStatus,
    /// Matched course in the target site
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_course_id: Option<Uuid>,
    /// Modules written
    pub modules: usize,
    /// Lessons written
    pub lessons: usize,
    /// Why the target failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate outcome of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Every target synced
    Success,
    /// Some targets synced, some failed
    Partial,
    /// No target synced
    Failed,
}

/// Report of a sync run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Master course in the primary site
    pub master_course_id: Uuid,
    /// Aggregate outcome
    pub outcome: SyncOutcome,
    /// Per-target results in request order
    pub targets: Vec<TargetResult>,
}

impl SyncReport {
    fn from_results(master_course_id: Uuid, targets: Vec<TargetResult>) -> Self {
        let synced = targets
            .iter()
            .filter(|t| t.status == TargetStatus::Synced)
            .count();
        let outcome = if synced == targets.len() {
            SyncOutcome::Success
        } else if synced == 0 {
            SyncOutcome::Failed
        } else {
            SyncOutcome::Partial
        };
        Self {
            master_course_id,
            outcome,
            targets,
        }
    }
}

/// Course sync engine
#[derive(Clone)]
pub struct CourseSyncEngine {
    database: Database,
    primary_site: TenantId,
}

impl CourseSyncEngine {
    /// Create a new sync engine for the given primary site
    #[must_use]
    pub const fn new(database: Database, primary_site: TenantId) -> Self {
        Self {
            database,
            primary_site,
        }
    }

    /// Site that owns master courses
    #[must_use]
    pub const fn primary_site(&self) -> TenantId {
        self.primary_site
    }

    /// Replicate a master course into each target site
    ///
    /// # Errors
    ///
    /// Returns invalid-input for an empty target list and not-found when the
    /// master course is not in the primary site. Per-target failures are
    /// reported in the returned [`SyncReport`]; a master signatory outside a
    /// target's pool (any site-scoped signatory) fails that target.
    pub async fn sync_course(
        &self,
        master_course_id: Uuid,
        targets: &[TenantId],
    ) -> AppResult<SyncReport> {
        if targets.is_empty() {
            return Err(AppError::invalid_input("At least one target site is required"));
        }

        let master = self
            .database
            .courses()
            .get_course_tree(self.primary_site, master_course_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Master course {master_course_id}")))?;
        let drafts: Vec<ModuleDraft> = master.modules.iter().map(ModuleDraft::from).collect();

        let mut seen = HashSet::new();
        let mut results = Vec::with_capacity(targets.len());
        for &target in targets.iter().filter(|t| seen.insert(**t)) {
            let result = match self.sync_target(&master, &drafts, target).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(
                        master_course_id = %master_course_id,
                        tenant_id = %target,
                        error = %e,
                        "Course sync failed for target"
                    );
                    TargetResult {
                        tenant_id: target,
                        status: TargetStatus::Failed,
                        target_course_id: None,
                        modules: 0,
                        lessons: 0,
                        error: Some(e.message),
                    }
                }
            };
            results.push(result);
        }

        let report = SyncReport::from_results(master_course_id, results);
        info!(
            master_course_id = %master_course_id,
            outcome = ?report.outcome,
            targets = report.targets.len(),
            "Course sync finished"
        );
        Ok(report)
    }

    async fn sync_target(
        &self,
        master: &CourseTree,
        drafts: &[ModuleDraft],
        target: TenantId,
    ) -> AppResult<TargetResult> {
        if target == self.primary_site {
            return Err(AppError::invalid_input(
                "The primary site holds the master course and cannot be a sync target",
            ));
        }

        let mut guard = self.database.begin().await?;
        let conn = guard.executor()?;

        TenantManager::resolve_in(conn, target).await?;
        let target_course_id = CourseManager::find_by_title_in(conn, target, &master.course.title)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Course '{}' in site {target}",
                    master.course.title
                ))
            })?;
        SignatoryManager::load_from_pool(conn, target, &master.signatory_ids).await?;

        CourseManager::apply_master_fields_in(conn, target, target_course_id, &master.course)
            .await?;
        let removed_lessons = CourseManager::delete_tree_in(conn, target_course_id).await?;
        CourseManager::insert_tree_in(conn, target_course_id, drafts).await?;
        SignatoryManager::replace_course_signatories(conn, target_course_id, &master.signatory_ids)
            .await?;
        guard.commit().await?;

        let lessons = master.lesson_count();
        info!(
            tenant_id = %target,
            course_id = %target_course_id,
            modules = drafts.len(),
            lessons,
            removed_lessons,
            "Synced course into target site"
        );

        Ok(TargetResult {
            tenant_id: target,
            status: TargetStatus::Synced,
            target_course_id: Some(target_course_id),
            modules: drafts.len(),
            lessons,
            error: None,
        })
    }
}
