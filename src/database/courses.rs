// ABOUTME: Course persistence with full module/lesson tree create, replace and read
// ABOUTME: Lesson payloads and quiz content are decoded once on read and encoded once on write
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::signatories::SignatoryManager;
use super::transactions::SqliteTransactionGuard;
use super::{parse_optional_timestamp, parse_tenant, parse_timestamp, parse_uuid};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use lms_core::models::{
    AssessmentPolicy, Course, CourseAudience, CourseModule, Lesson, LessonContent, PreTest,
    QuizContent, TenantId,
};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

/// Highest passing rate, in percent
const MAX_PASSING_RATE: u8 = 100;

const COURSE_SELECT: &str = r"
    SELECT id, tenant_id, title, description, category, image_url, venue, starts_at, ends_at,
           is_internal, is_public, price_cents,
           pre_test_content, pre_test_passing_rate,
           final_assessment_content, final_assessment_passing_rate, final_assessment_max_attempts,
           created_at, updated_at
    FROM courses
";

/// A lesson as submitted by an administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonDraft {
    /// Display title
    pub title: String,
    /// Kind-specific payload (`type` tag plus fields)
    #[serde(flatten)]
    pub content: LessonContent,
}

/// A module as submitted by an administrator; order follows list position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDraft {
    /// Display title
    pub title: String,
    /// Lessons in order
    #[serde(default)]
    pub lessons: Vec<LessonDraft>,
}

impl From<&CourseModule> for ModuleDraft {
    fn from(module: &CourseModule) -> Self {
        let mut lessons: Vec<&Lesson> = module.lessons.iter().collect();
        lessons.sort_by_key(|l| l.order);
        Self {
            title: module.title.clone(),
            lessons: lessons
                .into_iter()
                .map(|l| LessonDraft {
                    title: l.title.clone(),
                    content: l.content.clone(),
                })
                .collect(),
        }
    }
}

const fn default_true() -> bool {
    true
}

/// Complete course definition used by create and full replace
#[derive(Debug, Clone, Deserialize)]
pub struct CourseDraft {
    /// Title
    pub title: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Category
    #[serde(default)]
    pub category: Option<String>,
    /// Cover image URL
    #[serde(default)]
    pub image_url: Option<String>,
    /// Venue
    #[serde(default)]
    pub venue: Option<String>,
    /// Scheduling window start
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    /// Scheduling window end
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    /// Visible to internal employees
    #[serde(default = "default_true")]
    pub is_internal: bool,
    /// Visible to external users
    #[serde(default)]
    pub is_public: bool,
    /// Price in minor units
    #[serde(default)]
    pub price_cents: i64,
    /// Optional pre-test
    #[serde(default)]
    pub pre_test: Option<PreTest>,
    /// Optional final assessment
    #[serde(default)]
    pub final_assessment: Option<AssessmentPolicy>,
    /// Modules in order
    #[serde(default)]
    pub modules: Vec<ModuleDraft>,
    /// Default signing set, in order
    #[serde(default)]
    pub signatory_ids: Vec<Uuid>,
}

impl CourseDraft {
    /// Check the rules serde cannot express
    ///
    /// # Errors
    ///
    /// Returns invalid-input describing the first violation
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::missing_field("title"));
        }
        if self.price_cents < 0 {
            return Err(AppError::invalid_input("Price cannot be negative"));
        }
        if let (Some(start), Some(end)) = (self.starts_at, self.ends_at) {
            if end < start {
                return Err(AppError::invalid_input("Course ends before it starts"));
            }
        }
        if let Some(pre_test) = &self.pre_test {
            check_passing_rate("pre_test", pre_test.passing_rate)?;
        }
        if let Some(final_assessment) = &self.final_assessment {
            check_passing_rate("final_assessment", final_assessment.passing_rate)?;
            if final_assessment.max_attempts == 0 {
                return Err(AppError::invalid_input(
                    "final_assessment.max_attempts must be at least 1",
                ));
            }
        }
        for (m, module) in self.modules.iter().enumerate() {
            if module.title.trim().is_empty() {
                return Err(AppError::invalid_input(format!(
                    "Module {} has no title",
                    m + 1
                )));
            }
            for (l, lesson) in module.lessons.iter().enumerate() {
                if lesson.title.trim().is_empty() {
                    return Err(AppError::invalid_input(format!(
                        "Lesson {} of module {} has no title",
                        l + 1,
                        m + 1
                    )));
                }
            }
        }
        Ok(())
    }
}

fn check_passing_rate(field: &str, rate: u8) -> AppResult<()> {
    if rate > MAX_PASSING_RATE {
        return Err(AppError::invalid_input(format!(
            "{field}.passing_rate must be between 0 and {MAX_PASSING_RATE}"
        )));
    }
    Ok(())
}

/// A course with its ordered modules, lessons and default signatories
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseTree {
    /// Course fields
    #[serde(flatten)]
    pub course: Course,
    /// Modules ordered by `order`, lessons likewise
    pub modules: Vec<CourseModule>,
    /// Default signing set, in order
    pub signatory_ids: Vec<Uuid>,
}

impl CourseTree {
    /// Total number of lessons
    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }
}

/// Course database operations manager
pub struct CourseManager {
    pool: SqlitePool,
}

impl CourseManager {
    /// Create a new course manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a course with its full tree and signing set in one transaction
    ///
    /// # Errors
    ///
    /// Returns invalid-input for draft violations or signatories outside the
    /// site's pool, and a database error if a write fails
    pub async fn create_course(
        &self,
        tenant_id: TenantId,
        draft: &CourseDraft,
    ) -> AppResult<CourseTree> {
        draft.validate()?;

        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;
        let mut guard = SqliteTransactionGuard::new(tx);
        let conn = guard.executor()?;

        SignatoryManager::load_from_pool(conn, tenant_id, &draft.signatory_ids).await?;

        let course_id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        let (pre_test_content, pre_test_rate) = encode_pre_test(draft.pre_test.as_ref())?;
        let (final_content, final_rate, final_max) =
            encode_final_assessment(draft.final_assessment.as_ref())?;

        sqlx::query(
            r"
            INSERT INTO courses (
                id, tenant_id, title, description, category, image_url, venue,
                starts_at, ends_at, is_internal, is_public, price_cents,
                pre_test_content, pre_test_passing_rate,
                final_assessment_content, final_assessment_passing_rate,
                final_assessment_max_attempts,
                created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18, $18
            )
            ",
        )
        .bind(course_id.to_string())
        .bind(tenant_id.to_string())
        .bind(draft.title.trim())
        .bind(&draft.description)
        .bind(&draft.category)
        .bind(&draft.image_url)
        .bind(&draft.venue)
        .bind(draft.starts_at.map(|t| t.to_rfc3339()))
        .bind(draft.ends_at.map(|t| t.to_rfc3339()))
        .bind(draft.is_internal)
        .bind(draft.is_public)
        .bind(draft.price_cents)
        .bind(pre_test_content)
        .bind(pre_test_rate)
        .bind(final_content)
        .bind(final_rate)
        .bind(final_max)
        .bind(&now)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to create course: {e}")))?;

        Self::insert_tree_in(conn, course_id, &draft.modules).await?;
        SignatoryManager::replace_course_signatories(conn, course_id, &draft.signatory_ids)
            .await?;

        let tree = Self::get_course_tree_in(conn, tenant_id, course_id)
            .await?
            .ok_or_else(|| AppError::internal("Created course vanished inside its transaction"))?;
        guard.commit().await?;

        info!(
            tenant_id = %tenant_id,
            course_id = %course_id,
            modules = tree.modules.len(),
            lessons = tree.lesson_count(),
            "Created course"
        );
        Ok(tree)
    }

    /// Replace every field and the whole tree of an existing course
    ///
    /// Lesson rows are recreated, so progress recorded against the old
    /// lessons is removed with them.
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown course and invalid-input for draft
    /// violations
    pub async fn replace_course(
        &self,
        tenant_id: TenantId,
        course_id: Uuid,
        draft: &CourseDraft,
    ) -> AppResult<CourseTree> {
        draft.validate()?;

        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;
        let mut guard = SqliteTransactionGuard::new(tx);
        let conn = guard.executor()?;

        if !Self::course_exists_in(conn, tenant_id, course_id).await? {
            return Err(AppError::not_found(format!("Course {course_id}")));
        }
        SignatoryManager::load_from_pool(conn, tenant_id, &draft.signatory_ids).await?;

        let (pre_test_content, pre_test_rate) = encode_pre_test(draft.pre_test.as_ref())?;
        let (final_content, final_rate, final_max) =
            encode_final_assessment(draft.final_assessment.as_ref())?;

        sqlx::query(
            r"
            UPDATE courses SET
                title = $3, description = $4, category = $5, image_url = $6, venue = $7,
                starts_at = $8, ends_at = $9, is_internal = $10, is_public = $11, price_cents = $12,
                pre_test_content = $13, pre_test_passing_rate = $14,
                final_assessment_content = $15, final_assessment_passing_rate = $16,
                final_assessment_max_attempts = $17, updated_at = $18
            WHERE tenant_id = $1 AND id = $2
            ",
        )
        .bind(tenant_id.to_string())
        .bind(course_id.to_string())
        .bind(draft.title.trim())
        .bind(&draft.description)
        .bind(&draft.category)
        .bind(&draft.image_url)
        .bind(&draft.venue)
        .bind(draft.starts_at.map(|t| t.to_rfc3339()))
        .bind(draft.ends_at.map(|t| t.to_rfc3339()))
        .bind(draft.is_internal)
        .bind(draft.is_public)
        .bind(draft.price_cents)
        .bind(pre_test_content)
        .bind(pre_test_rate)
        .bind(final_content)
        .bind(final_rate)
        .bind(final_max)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to update course: {e}")))?;

        Self::delete_tree_in(conn, course_id).await?;
        Self::insert_tree_in(conn, course_id, &draft.modules).await?;
        SignatoryManager::replace_course_signatories(conn, course_id, &draft.signatory_ids)
            .await?;

        let tree = Self::get_course_tree_in(conn, tenant_id, course_id)
            .await?
            .ok_or_else(|| AppError::internal("Replaced course vanished inside its transaction"))?;
        guard.commit().await?;

        info!(tenant_id = %tenant_id, course_id = %course_id, "Replaced course");
        Ok(tree)
    }

    /// Course with its ordered tree
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails or stored content is corrupt
    pub async fn get_course_tree(
        &self,
        tenant_id: TenantId,
        course_id: Uuid,
    ) -> AppResult<Option<CourseTree>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;
        Self::get_course_tree_in(&mut conn, tenant_id, course_id).await
    }

    /// Course with its ordered tree, on an existing connection
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails or stored content is corrupt
    pub async fn get_course_tree_in(
        conn: &mut SqliteConnection,
        tenant_id: TenantId,
        course_id: Uuid,
    ) -> AppResult<Option<CourseTree>> {
        let Some(course) = Self::get_course_in(conn, tenant_id, course_id).await? else {
            return Ok(None);
        };
        let modules = Self::get_modules_in(conn, course_id).await?;
        let signatory_ids = SignatoryManager::course_signatory_ids(conn, course_id).await?;
        Ok(Some(CourseTree {
            course,
            modules,
            signatory_ids,
        }))
    }

    /// Course fields without the tree
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails or stored content is corrupt
    pub async fn get_course_in(
        conn: &mut SqliteConnection,
        tenant_id: TenantId,
        course_id: Uuid,
    ) -> AppResult<Option<Course>> {
        let row = sqlx::query(&format!("{COURSE_SELECT} WHERE tenant_id = $1 AND id = $2"))
            .bind(tenant_id.to_string())
            .bind(course_id.to_string())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::database(format!("Failed to get course: {e}")))?;

        row.as_ref().map(row_to_course).transpose()
    }

    /// Whether the course exists in the site
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn course_exists_in(
        conn: &mut SqliteConnection,
        tenant_id: TenantId,
        course_id: Uuid,
    ) -> AppResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM courses WHERE tenant_id = $1 AND id = $2")
                .bind(tenant_id.to_string())
                .bind(course_id.to_string())
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| AppError::database(format!("Failed to check course: {e}")))?;
        Ok(count > 0)
    }

    /// Id of the site's course with exactly this title (oldest first if duplicated)
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn find_by_title_in(
        conn: &mut SqliteConnection,
        tenant_id: TenantId,
        title: &str,
    ) -> AppResult<Option<Uuid>> {
        let id: Option<String> = sqlx::query_scalar(
            r"
            SELECT id FROM courses
            WHERE tenant_id = $1 AND title = $2
            ORDER BY created_at
            LIMIT 1
            ",
        )
        .bind(tenant_id.to_string())
        .bind(title)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to find course by title: {e}")))?;

        id.as_deref().map(|id| parse_uuid(id, "course id")).transpose()
    }

    /// Modules with lessons, both ordered
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails or stored content is corrupt
    pub async fn get_modules_in(
        conn: &mut SqliteConnection,
        course_id: Uuid,
    ) -> AppResult<Vec<CourseModule>> {
        let module_rows = sqlx::query(
            r"
            SELECT id, title, module_order
            FROM course_modules
            WHERE course_id = $1
            ORDER BY module_order
            ",
        )
        .bind(course_id.to_string())
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to load modules: {e}")))?;

        let lesson_rows = sqlx::query(
            r"
            SELECT l.id, l.module_id, l.title, l.lesson_type, l.body, l.video_url, l.lesson_order
            FROM lessons l
            JOIN course_modules m ON m.id = l.module_id
            WHERE m.course_id = $1
            ORDER BY m.module_order, l.lesson_order
            ",
        )
        .bind(course_id.to_string())
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to load lessons: {e}")))?;

        let mut lessons: Vec<Lesson> = lesson_rows
            .iter()
            .map(row_to_lesson)
            .collect::<AppResult<_>>()?;

        module_rows
            .iter()
            .map(|row| -> AppResult<CourseModule> {
                let id = parse_uuid(&row.try_get::<String, _>("id")?, "module id")?;
                let (own, rest): (Vec<Lesson>, Vec<Lesson>) =
                    lessons.drain(..).partition(|l| l.module_id == id);
                lessons = rest;
                Ok(CourseModule {
                    id,
                    course_id,
                    title: row.try_get("title")?,
                    order: decode_order(row.try_get("module_order")?)?,
                    lessons: own,
                })
            })
            .collect()
    }

    /// Lesson ids ordered by `(module order, lesson order)`
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn lesson_ids_in_order(
        conn: &mut SqliteConnection,
        course_id: Uuid,
    ) -> AppResult<Vec<Uuid>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r"
            SELECT l.id
            FROM lessons l
            JOIN course_modules m ON m.id = l.module_id
            WHERE m.course_id = $1
            ORDER BY m.module_order, l.lesson_order
            ",
        )
        .bind(course_id.to_string())
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to order lessons: {e}")))?;

        ids.iter().map(|id| parse_uuid(id, "lesson id")).collect()
    }

    /// A lesson, only if it belongs to the site's course
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails or stored content is corrupt
    pub async fn get_lesson_in(
        conn: &mut SqliteConnection,
        tenant_id: TenantId,
        course_id: Uuid,
        lesson_id: Uuid,
    ) -> AppResult<Option<Lesson>> {
        let row = sqlx::query(
            r"
            SELECT l.id, l.module_id, l.title, l.lesson_type, l.body, l.video_url, l.lesson_order
            FROM lessons l
            JOIN course_modules m ON m.id = l.module_id
            JOIN courses c ON c.id = m.course_id
            WHERE c.tenant_id = $1 AND c.id = $2 AND l.id = $3
            ",
        )
        .bind(tenant_id.to_string())
        .bind(course_id.to_string())
        .bind(lesson_id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to get lesson: {e}")))?;

        row.as_ref().map(row_to_lesson).transpose()
    }

    /// Insert modules and lessons with 1-based contiguous order
    ///
    /// # Errors
    ///
    /// Returns an error if a write fails or quiz content fails to encode
    pub async fn insert_tree_in(
        conn: &mut SqliteConnection,
        course_id: Uuid,
        modules: &[ModuleDraft],
    ) -> AppResult<()> {
        for (module_index, module) in modules.iter().enumerate() {
            let module_id = Uuid::new_v4();
            sqlx::query(
                r"
                INSERT INTO course_modules (id, course_id, title, module_order)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(module_id.to_string())
            .bind(course_id.to_string())
            .bind(module.title.trim())
            .bind(encode_order(module_index)?)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::database(format!("Failed to insert module: {e}")))?;

            for (lesson_index, lesson) in module.lessons.iter().enumerate() {
                let (body, video_url) = lesson.content.to_columns()?;
                sqlx::query(
                    r"
                    INSERT INTO lessons
                        (id, module_id, title, lesson_type, body, video_url, lesson_order)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    ",
                )
                .bind(Uuid::new_v4().to_string())
                .bind(module_id.to_string())
                .bind(lesson.title.trim())
                .bind(lesson.content.kind().as_str())
                .bind(body)
                .bind(video_url)
                .bind(encode_order(lesson_index)?)
                .execute(&mut *conn)
                .await
                .map_err(|e| AppError::database(format!("Failed to insert lesson: {e}")))?;
            }
        }
        Ok(())
    }

    /// Delete every module and lesson of a course; returns the number of lessons removed
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn delete_tree_in(conn: &mut SqliteConnection, course_id: Uuid) -> AppResult<u64> {
        let lessons = sqlx::query(
            r"
            DELETE FROM lessons
            WHERE module_id IN (SELECT id FROM course_modules WHERE course_id = $1)
            ",
        )
        .bind(course_id.to_string())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to delete lessons: {e}")))?
        .rows_affected();

        sqlx::query("DELETE FROM course_modules WHERE course_id = $1")
            .bind(course_id.to_string())
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete modules: {e}")))?;

        Ok(lessons)
    }

    /// Copy a master course's descriptive and assessment fields onto a
    /// target course, leaving the target's title and price untouched
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn apply_master_fields_in(
        conn: &mut SqliteConnection,
        tenant_id: TenantId,
        target_course_id: Uuid,
        master: &Course,
    ) -> AppResult<()> {
        let (pre_test_content, pre_test_rate) = encode_pre_test(master.pre_test.as_ref())?;
        let (final_content, final_rate, final_max) =
            encode_final_assessment(master.final_assessment.as_ref())?;

        let updated = sqlx::query(
            r"
            UPDATE courses SET
                description = $3, category = $4, image_url = $5, venue = $6,
                starts_at = $7, ends_at = $8, is_internal = $9, is_public = $10,
                pre_test_content = $11, pre_test_passing_rate = $12,
                final_assessment_content = $13, final_assessment_passing_rate = $14,
                final_assessment_max_attempts = $15, updated_at = $16
            WHERE tenant_id = $1 AND id = $2
            ",
        )
        .bind(tenant_id.to_string())
        .bind(target_course_id.to_string())
        .bind(&master.description)
        .bind(&master.category)
        .bind(&master.image_url)
        .bind(&master.venue)
        .bind(master.starts_at.map(|t| t.to_rfc3339()))
        .bind(master.ends_at.map(|t| t.to_rfc3339()))
        .bind(master.audience.is_internal)
        .bind(master.audience.is_public)
        .bind(pre_test_content)
        .bind(pre_test_rate)
        .bind(final_content)
        .bind(final_rate)
        .bind(final_max)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to update synced course: {e}")))?
        .rows_affected();

        if updated == 0 {
            return Err(AppError::not_found(format!("Course {target_course_id}")));
        }
        Ok(())
    }
}

fn encode_pre_test(pre_test: Option<&PreTest>) -> AppResult<(Option<String>, Option<i64>)> {
    match pre_test {
        Some(p) => Ok((Some(p.content.encode()?), Some(i64::from(p.passing_rate)))),
        None => Ok((None, None)),
    }
}

fn encode_final_assessment(
    policy: Option<&AssessmentPolicy>,
) -> AppResult<(Option<String>, Option<i64>, Option<i64>)> {
    match policy {
        Some(p) => Ok((
            Some(p.content.encode()?),
            Some(i64::from(p.passing_rate)),
            Some(i64::from(p.max_attempts)),
        )),
        None => Ok((None, None, None)),
    }
}

fn encode_order(index: usize) -> AppResult<i64> {
    i64::try_from(index + 1).map_err(|_| AppError::invalid_input("Too many modules or lessons"))
}

fn decode_order(raw: i64) -> AppResult<u32> {
    u32::try_from(raw).map_err(|_| AppError::integrity(format!("Invalid stored order {raw}")))
}

fn decode_rate(raw: i64, column: &str) -> AppResult<u8> {
    u8::try_from(raw)
        .ok()
        .filter(|rate| *rate <= MAX_PASSING_RATE)
        .ok_or_else(|| AppError::integrity(format!("Invalid stored {column} {raw}")))
}

fn row_to_course(row: &SqliteRow) -> AppResult<Course> {
    let pre_test = match (
        row.try_get::<Option<String>, _>("pre_test_content")?,
        row.try_get::<Option<i64>, _>("pre_test_passing_rate")?,
    ) {
        (Some(raw), rate) => Some(PreTest {
            content: QuizContent::decode(&raw)?,
            passing_rate: decode_rate(rate.unwrap_or(0), "pre_test_passing_rate")?,
        }),
        (None, _) => None,
    };

    let final_assessment = match (
        row.try_get::<Option<String>, _>("final_assessment_content")?,
        row.try_get::<Option<i64>, _>("final_assessment_passing_rate")?,
        row.try_get::<Option<i64>, _>("final_assessment_max_attempts")?,
    ) {
        (Some(raw), rate, max_attempts) => Some(AssessmentPolicy {
            content: QuizContent::decode(&raw)?,
            passing_rate: decode_rate(rate.unwrap_or(0), "final_assessment_passing_rate")?,
            max_attempts: u32::try_from(max_attempts.unwrap_or(1))
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    AppError::integrity("Invalid stored final_assessment_max_attempts")
                })?,
        }),
        (None, _, _) => None,
    };

    Ok(Course {
        id: parse_uuid(&row.try_get::<String, _>("id")?, "course id")?,
        tenant_id: parse_tenant(&row.try_get::<String, _>("tenant_id")?)?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        image_url: row.try_get("image_url")?,
        venue: row.try_get("venue")?,
        starts_at: parse_optional_timestamp(row.try_get("starts_at")?, "starts_at")?,
        ends_at: parse_optional_timestamp(row.try_get("ends_at")?, "ends_at")?,
        audience: CourseAudience {
            is_internal: row.try_get("is_internal")?,
            is_public: row.try_get("is_public")?,
        },
        price_cents: row.try_get("price_cents")?,
        pre_test,
        final_assessment,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?, "created_at")?,
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?, "updated_at")?,
    })
}

fn row_to_lesson(row: &SqliteRow) -> AppResult<Lesson> {
    let lesson_type: String = row.try_get("lesson_type")?;
    Ok(Lesson {
        id: parse_uuid(&row.try_get::<String, _>("id")?, "lesson id")?,
        module_id: parse_uuid(&row.try_get::<String, _>("module_id")?, "module id")?,
        title: row.try_get("title")?,
        order: decode_order(row.try_get("lesson_order")?)?,
        content: LessonContent::from_columns(
            &lesson_type,
            row.try_get("body")?,
            row.try_get("video_url")?,
        )?,
    })
}
