// ABOUTME: Domain model re-exports for sites, courses, quizzes and certificates
// ABOUTME: Canonical definitions shared by persistence, engines and HTTP layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Certificate kinds and certificate numbers
pub mod certificate;
/// Courses, modules and lessons
pub mod course;
/// Quiz content and scoring
pub mod quiz;
/// Site (tenant) identity
pub mod tenant;

pub use certificate::{CertificateKind, CertificateNumber};
pub use course::{
    lesson_order, next_in_order, AssessmentPolicy, Course, CourseAudience, CourseModule, Lesson,
    LessonContent, LessonKind, PreTest,
};
pub use quiz::{AnswerOption, Answers, Question, QuizContent, ScoreSummary};
pub use tenant::TenantId;
