// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides an in-memory database, seeded users, quiz and course builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::too_many_lines
)]
//! Shared test utilities for `lms_server`

use std::env;
use std::sync::{Arc, Once};

use lms_server::config::{DatabaseConfig, ServerConfig};
use lms_server::constants::sites;
use lms_server::database::{
    CourseDraft, CourseTree, CreateSignatoryRequest, CreateUserRequest, Database, LessonDraft,
    ModuleDraft, Signatory, User, UserRole,
};
use lms_server::learning::Actor;
use lms_server::models::{
    AnswerOption, Answers, AssessmentPolicy, LessonContent, PreTest, Question, QuizContent,
    TenantId,
};
use lms_server::resources::ServerResources;
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Quiet, once-per-process tracing subscriber (`TEST_LOG=DEBUG` for more)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Fresh in-memory database with the core sites seeded
pub async fn create_test_database() -> Database {
    init_test_logging();
    let database = Database::new(&DatabaseConfig {
        url: "sqlite::memory:".to_owned(),
    })
    .await
    .unwrap();
    database.tenants().seed_core_sites().await.unwrap();
    database
}

/// Server resources over a fresh database, primary site `main`
pub async fn create_test_server_resources() -> Arc<ServerResources> {
    let database = create_test_database().await;
    Arc::new(ServerResources::new(database, &ServerConfig::default()))
}

pub const MAIN: TenantId = sites::MAIN.id;
pub const NORTH: TenantId = sites::NORTH.id;
pub const SOUTH: TenantId = sites::SOUTH.id;

pub async fn create_user_with_role(
    database: &Database,
    tenant_id: TenantId,
    username: &str,
    role: UserRole,
    is_super_admin: bool,
) -> User {
    database
        .users()
        .create_user(
            tenant_id,
            &CreateUserRequest {
                username: username.to_owned(),
                display_name: format!("{username} display"),
                role,
                is_super_admin,
            },
        )
        .await
        .unwrap()
}

pub async fn create_learner(database: &Database, tenant_id: TenantId, username: &str) -> User {
    create_user_with_role(database, tenant_id, username, UserRole::Employee, false).await
}

pub async fn create_admin(database: &Database, tenant_id: TenantId, username: &str) -> User {
    create_user_with_role(database, tenant_id, username, UserRole::Admin, false).await
}

pub fn actor(user: &User) -> Actor {
    Actor::learner(user.tenant_id, user.id)
}

/// Signatory in the global pool, visible from every site
pub async fn create_global_signatory(database: &Database, name: &str) -> Signatory {
    database
        .signatories()
        .create_signatory(
            None,
            &CreateSignatoryRequest {
                name: name.to_owned(),
                position: "Director".to_owned(),
                signature_url: Some(format!("https://blob.example/{name}.png")),
                global: true,
            },
        )
        .await
        .unwrap()
}

/// Signatory owned by one site
pub async fn create_site_signatory(
    database: &Database,
    tenant_id: TenantId,
    name: &str,
) -> Signatory {
    database
        .signatories()
        .create_signatory(
            Some(tenant_id),
            &CreateSignatoryRequest {
                name: name.to_owned(),
                position: "Branch manager".to_owned(),
                signature_url: None,
                global: false,
            },
        )
        .await
        .unwrap()
}

/// Quiz of `count` questions; question `i` has its correct answer at option `i % 3`
pub fn quiz(count: usize) -> QuizContent {
    let questions = (0..count)
        .map(|i| Question {
            text: format!("Question {i}"),
            options: (0..3)
                .map(|o| AnswerOption {
                    text: format!("Option {o}"),
                    is_correct: o == i % 3,
                })
                .collect(),
        })
        .collect();
    QuizContent::new(questions).unwrap()
}

pub fn correct_answers(content: &QuizContent) -> Answers {
    content
        .questions()
        .iter()
        .enumerate()
        .map(|(i, q)| (i, q.correct_index().unwrap()))
        .collect()
}

/// Answers with exactly the first `correct` questions right
pub fn answers_with_score(content: &QuizContent, correct: usize) -> Answers {
    content
        .questions()
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let right = q.correct_index().unwrap();
            let answer = if i < correct { right } else { (right + 1) % 3 };
            (i, answer)
        })
        .collect()
}

pub fn document_lesson(title: &str) -> LessonDraft {
    LessonDraft {
        title: title.to_owned(),
        content: LessonContent::Document {
            markdown: format!("# {title}"),
        },
    }
}

pub fn quiz_lesson(title: &str, questions: usize) -> LessonDraft {
    LessonDraft {
        title: title.to_owned(),
        content: LessonContent::Quiz {
            questions: quiz(questions),
        },
    }
}

/// Modules of document lessons; `lessons_per_module[m]` lessons in module `m`
pub fn modules(lessons_per_module: &[usize]) -> Vec<ModuleDraft> {
    lessons_per_module
        .iter()
        .enumerate()
        .map(|(m, &count)| ModuleDraft {
            title: format!("Module {}", m + 1),
            lessons: (0..count)
                .map(|l| document_lesson(&format!("Lesson {}.{}", m + 1, l + 1)))
                .collect(),
        })
        .collect()
}

pub fn course_draft(title: &str, lessons_per_module: &[usize]) -> CourseDraft {
    CourseDraft {
        title: title.to_owned(),
        description: Some(format!("{title} description")),
        category: Some("Safety".to_owned()),
        image_url: None,
        venue: None,
        starts_at: None,
        ends_at: None,
        is_internal: true,
        is_public: false,
        price_cents: 0,
        pre_test: None,
        final_assessment: None,
        modules: modules(lessons_per_module),
        signatory_ids: Vec::new(),
    }
}

pub fn with_final_assessment(
    mut draft: CourseDraft,
    questions: usize,
    passing_rate: u8,
    max_attempts: u32,
) -> CourseDraft {
    draft.final_assessment = Some(AssessmentPolicy {
        content: quiz(questions),
        passing_rate,
        max_attempts,
    });
    draft
}

pub fn with_pre_test(mut draft: CourseDraft, questions: usize, passing_rate: u8) -> CourseDraft {
    draft.pre_test = Some(PreTest {
        content: quiz(questions),
        passing_rate,
    });
    draft
}

pub async fn create_course(
    database: &Database,
    tenant_id: TenantId,
    draft: &CourseDraft,
) -> CourseTree {
    database
        .courses()
        .create_course(tenant_id, draft)
        .await
        .unwrap()
}

/// Lesson ids of a tree in course order
pub fn lesson_ids(tree: &CourseTree) -> Vec<Uuid> {
    lms_server::models::lesson_order(&tree.modules)
}

pub async fn enroll(database: &Database, user: &User, course_id: Uuid) {
    database
        .enrollments()
        .enroll(user.tenant_id, user.id, course_id)
        .await
        .unwrap();
}

/// Identity headers for the gateway authenticator
pub fn identity_headers(user: &User) -> Vec<(&'static str, String)> {
    vec![
        ("x-user-id", user.id.to_string()),
        ("x-site-id", user.tenant_id.to_string()),
        ("x-user-role", user.role.as_str().to_owned()),
        ("x-super-admin", user.is_super_admin.to_string()),
    ]
}
