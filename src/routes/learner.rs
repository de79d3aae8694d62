// ABOUTME: Learner routes: course outline, progress, lesson completion and assessment submissions
// ABOUTME: Every endpoint authenticates the caller and scopes all work to the caller's site
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Learner routes
//!
//! Quiz answer keys are stripped from the course outline for callers without
//! the administrator role.

use super::{authenticate, parse_body, parse_id};
use crate::errors::AppError;
use crate::resources::ServerResources;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use lms_core::models::Answers;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Answer submission body
#[derive(Debug, Deserialize)]
pub struct SubmitAnswersBody {
    /// Question index → selected option index
    pub answers: Answers,
}

/// Learner routes handler
pub struct LearnerRoutes;

impl LearnerRoutes {
    /// Create all learner routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/courses/:id", get(Self::handle_get_course))
            .route("/courses/:id/progress", get(Self::handle_progress))
            .route("/courses/:id/pre-test/submit", post(Self::handle_pre_test))
            .route(
                "/courses/:id/lessons/:lesson_id/complete",
                post(Self::handle_complete_lesson),
            )
            .route(
                "/courses/:id/lessons/:lesson_id/quiz/submit",
                post(Self::handle_lesson_quiz),
            )
            .route(
                "/courses/:id/assessment/submit",
                post(Self::handle_final_assessment),
            )
            .route("/courses/:id/retake", post(Self::handle_retake))
            .with_state(resources)
    }

    /// Handle GET /courses/:id
    async fn handle_get_course(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        let course_id: Uuid = parse_id(&id, "course id")?;
        let actor = auth.actor();

        let tree = resources.progress.course_outline(&actor, course_id).await?;
        let mut body = serde_json::to_value(&tree)?;
        if !actor.is_admin {
            strip_answer_keys(&mut body);
        }
        Ok((StatusCode::OK, Json(body)).into_response())
    }

    /// Handle GET /courses/:id/progress
    async fn handle_progress(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        let course_id: Uuid = parse_id(&id, "course id")?;

        let progress = resources
            .progress
            .course_progress(&auth.actor(), course_id)
            .await?;
        Ok((StatusCode::OK, Json(progress)).into_response())
    }

    /// Handle POST /courses/:id/pre-test/submit
    async fn handle_pre_test(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        let course_id: Uuid = parse_id(&id, "course id")?;
        let request: SubmitAnswersBody = parse_body(&body)?;

        let outcome = resources
            .assessments
            .submit_pre_test(&auth.actor(), course_id, &request.answers)
            .await?;
        Ok((StatusCode::OK, Json(outcome)).into_response())
    }

    /// Handle POST /courses/:id/lessons/:lesson_id/complete
    async fn handle_complete_lesson(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((id, lesson_id)): Path<(String, String)>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        let course_id: Uuid = parse_id(&id, "course id")?;
        let lesson_id: Uuid = parse_id(&lesson_id, "lesson id")?;

        let completion = resources
            .progress
            .complete_lesson(&auth.actor(), course_id, lesson_id)
            .await?;
        Ok((StatusCode::OK, Json(completion)).into_response())
    }

    /// Handle POST /courses/:id/lessons/:lesson_id/quiz/submit
    async fn handle_lesson_quiz(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((id, lesson_id)): Path<(String, String)>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        let course_id: Uuid = parse_id(&id, "course id")?;
        let lesson_id: Uuid = parse_id(&lesson_id, "lesson id")?;
        let request: SubmitAnswersBody = parse_body(&body)?;

        let outcome = resources
            .assessments
            .submit_lesson_quiz(&auth.actor(), course_id, lesson_id, &request.answers)
            .await?;
        Ok((StatusCode::OK, Json(outcome)).into_response())
    }

    /// Handle POST /courses/:id/assessment/submit
    async fn handle_final_assessment(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        let course_id: Uuid = parse_id(&id, "course id")?;
        let request: SubmitAnswersBody = parse_body(&body)?;

        let outcome = resources
            .assessments
            .submit_final_assessment(&auth.actor(), course_id, &request.answers)
            .await?;
        Ok((StatusCode::OK, Json(outcome)).into_response())
    }

    /// Handle POST /courses/:id/retake
    async fn handle_retake(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        let course_id: Uuid = parse_id(&id, "course id")?;

        let outcome = resources
            .assessments
            .start_retake(&auth.actor(), course_id)
            .await?;
        Ok((StatusCode::OK, Json(outcome)).into_response())
    }
}

/// Remove `isCorrect` flags everywhere in a serialized course tree
fn strip_answer_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("isCorrect");
            map.values_mut().for_each(strip_answer_keys);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_answer_keys),
        _ => {}
    }
}
