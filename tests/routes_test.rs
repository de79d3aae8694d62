// ABOUTME: HTTP-level tests for the LMS router: authentication, authorization and status mapping
// ABOUTME: Drives the full router in-process with gateway identity headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use axum::Router;
use common::{
    course_draft, create_admin, create_course, create_global_signatory, create_learner,
    create_test_server_resources, create_user_with_role, enroll, identity_headers, lesson_ids,
    with_final_assessment, MAIN, NORTH, SOUTH,
};
use helpers::axum_test::AxumTestRequest;
use lms_server::database::UserRole;
use lms_server::resources::ServerResources;
use lms_server::routes::api_router;
use serde_json::{json, Value};
use uuid::Uuid;

async fn setup() -> (Arc<ServerResources>, Router) {
    let resources = create_test_server_resources().await;
    let router = api_router(Arc::clone(&resources));
    (resources, router)
}

#[tokio::test]
async fn test_health_endpoints() {
    let (_resources, router) = setup().await;

    let response = AxumTestRequest::get("/health").send(router.clone()).await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");

    let response = AxumTestRequest::get("/health/ready").send(router).await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["checks"].as_array().is_some_and(|c| !c.is_empty()));
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let (resources, router) = setup().await;
    let course = create_course(&resources.database, MAIN, &course_draft("Knots", &[1])).await;

    let response = AxumTestRequest::get(&format!("/courses/{}", course.course.id))
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), 401);

    let response = AxumTestRequest::get("/certificates")
        .header("x-user-id", "not-a-uuid")
        .header("x-site-id", &MAIN.to_string())
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), 401);

    // Known id claimed from the wrong site
    let learner = create_learner(&resources.database, MAIN, "ada").await;
    let response = AxumTestRequest::get("/certificates")
        .header("x-user-id", &learner.id.to_string())
        .header("x-site-id", &NORTH.to_string())
        .send(router)
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_admin_routes_reject_learners() {
    let (resources, router) = setup().await;
    let learner = create_learner(&resources.database, MAIN, "alan").await;

    let response = AxumTestRequest::get("/admin/sites")
        .headers(&identity_headers(&learner))
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), 403);

    // A role claim cannot raise the stored role
    let mut headers = identity_headers(&learner);
    headers[2].1 = "admin".to_owned();
    let response = AxumTestRequest::get("/admin/sites")
        .headers(&headers)
        .send(router)
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_admin_user_management() {
    let (resources, router) = setup().await;
    let admin = create_admin(&resources.database, MAIN, "grace").await;
    let body = json!({ "username": "barbara", "display_name": "Barbara L." });

    let response = AxumTestRequest::post("/admin/users")
        .headers(&identity_headers(&admin))
        .json(&body)
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), 201);
    let created: Value = response.json();
    assert_eq!(created["role"], "employee");
    assert_eq!(created["tenant_id"], MAIN.to_string());

    let response = AxumTestRequest::post("/admin/users")
        .headers(&identity_headers(&admin))
        .json(&body)
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), 409);

    let response = AxumTestRequest::post("/admin/users")
        .headers(&identity_headers(&admin))
        .json(&json!({ "username": "root", "display_name": "Root", "is_super_admin": true }))
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), 403);

    let response = AxumTestRequest::post("/admin/users")
        .headers(&identity_headers(&admin))
        .raw_body("{\"username\": ")
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), 400);

    let response = AxumTestRequest::post("/admin/sites")
        .headers(&identity_headers(&admin))
        .json(&json!({ "name": "East", "slug": "east", "certificate_prefix": "EAST" }))
        .send(router)
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_super_admin_creates_site() {
    let (resources, router) = setup().await;
    let root =
        create_user_with_role(&resources.database, MAIN, "root", UserRole::Admin, true).await;

    let response = AxumTestRequest::post("/admin/sites")
        .headers(&identity_headers(&root))
        .json(&json!({ "name": "East", "slug": "east", "certificate_prefix": "EAST" }))
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), 201);

    let response = AxumTestRequest::get("/admin/sites")
        .headers(&identity_headers(&root))
        .send(router)
        .await;
    assert_eq!(response.status_code(), 200);
    let sites: Vec<Value> = response.json();
    assert_eq!(sites.len(), 4);
}

#[tokio::test]
async fn test_course_outline_hides_answer_keys_from_learners() {
    let (resources, router) = setup().await;
    let admin = create_admin(&resources.database, MAIN, "grace").await;
    let learner = create_learner(&resources.database, MAIN, "ken").await;

    let draft = json!({
        "title": "Ladders",
        "modules": [{
            "title": "Basics",
            "lessons": [
                { "title": "Read me", "type": "document", "markdown": "# Ladders" },
                { "title": "Check", "type": "quiz", "questions": [
                    { "text": "Three points of contact?", "options": [
                        { "text": "Yes", "isCorrect": true },
                        { "text": "No" }
                    ]}
                ]}
            ]
        }]
    });
    let response = AxumTestRequest::post("/admin/courses")
        .headers(&identity_headers(&admin))
        .json(&draft)
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), 201);
    let tree: Value = response.json();
    let course_id = tree["id"].as_str().unwrap().to_owned();

    let response = AxumTestRequest::post(&format!("/admin/courses/{course_id}/enrollments"))
        .headers(&identity_headers(&admin))
        .json(&json!({ "user_ids": [learner.id] }))
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), 200);
    let enrolled: Value = response.json();
    assert_eq!(enrolled["enrolled"], json!([learner.id]));

    let learner_view = AxumTestRequest::get(&format!("/courses/{course_id}"))
        .headers(&identity_headers(&learner))
        .send(router.clone())
        .await;
    assert_eq!(learner_view.status_code(), 200);
    assert!(!learner_view.text().contains("isCorrect"));

    let admin_view = AxumTestRequest::get(&format!("/courses/{course_id}"))
        .headers(&identity_headers(&admin))
        .send(router.clone())
        .await;
    assert!(admin_view.text().contains("isCorrect"));

    let quiz_lesson = tree["modules"][0]["lessons"][1]["id"].as_str().unwrap();
    let response = AxumTestRequest::post(&format!(
        "/courses/{course_id}/lessons/{quiz_lesson}/quiz/submit"
    ))
    .headers(&identity_headers(&learner))
    .json(&json!({ "answers": { "0": 0 } }))
    .send(router)
    .await;
    assert_eq!(response.status_code(), 200);
    let outcome: Value = response.json();
    assert_eq!(outcome["passed"], true);
}

#[tokio::test]
async fn test_learner_completion_and_public_validation() {
    let (resources, router) = setup().await;
    let learner = create_learner(&resources.database, MAIN, "margaret").await;
    let course = create_course(&resources.database, MAIN, &course_draft("Knots", &[1])).await;
    enroll(&resources.database, &learner, course.course.id).await;
    let lesson = lesson_ids(&course)[0];

    let response = AxumTestRequest::post(&format!(
        "/courses/{}/lessons/{lesson}/complete",
        course.course.id
    ))
    .headers(&identity_headers(&learner))
    .send(router.clone())
    .await;
    assert_eq!(response.status_code(), 200);
    let completion: Value = response.json();
    assert_eq!(completion["courseComplete"], true);
    let number = completion["certificateNumber"].as_str().unwrap().to_owned();

    let response = AxumTestRequest::get("/certificates")
        .headers(&identity_headers(&learner))
        .send(router.clone())
        .await;
    let listed: Vec<Value> = response.json();
    assert_eq!(listed.len(), 1);

    // Validation needs no identity
    let response = AxumTestRequest::get(&format!(
        "/certificates/validate?number={number}&site={MAIN}"
    ))
    .send(router.clone())
    .await;
    assert_eq!(response.status_code(), 200);
    let details: Value = response.json();
    assert_eq!(details["certificate_number"], number);
    assert_eq!(details["course_title"], "Knots");

    let response = AxumTestRequest::get(&format!(
        "/certificates/validate?number={number}&site={NORTH}"
    ))
    .send(router.clone())
    .await;
    assert_eq!(response.status_code(), 404);

    let response = AxumTestRequest::get(&format!("/certificates/validate?site={MAIN}"))
        .send(router)
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_final_assessment_gate_reports_progress() {
    let (resources, router) = setup().await;
    let learner = create_learner(&resources.database, MAIN, "donald").await;
    let draft = with_final_assessment(course_draft("Cranes", &[2]), 3, 60, 2);
    let course = create_course(&resources.database, MAIN, &draft).await;
    enroll(&resources.database, &learner, course.course.id).await;

    let response = AxumTestRequest::post(&format!(
        "/courses/{}/assessment/submit",
        course.course.id
    ))
    .headers(&identity_headers(&learner))
    .json(&json!({ "answers": { "0": 0, "1": 1, "2": 2 } }))
    .send(router.clone())
    .await;
    assert_eq!(response.status_code(), 403);
    let body: Value = response.json();
    assert_eq!(body["details"], json!({ "completed": 0, "total": 2 }));

    let response = AxumTestRequest::post(&format!(
        "/courses/{}/assessment/submit",
        course.course.id
    ))
    .headers(&identity_headers(&learner))
    .json(&json!({ "answers": [1, 2] }))
    .send(router.clone())
    .await;
    assert_eq!(response.status_code(), 400);

    let response = AxumTestRequest::get(&format!("/courses/{}/progress", Uuid::new_v4()))
        .headers(&identity_headers(&learner))
        .send(router)
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_sync_status_reflects_outcome() {
    let (resources, router) = setup().await;
    let database = &resources.database;
    let admin = create_admin(database, MAIN, "grace").await;
    let north_admin = create_admin(database, NORTH, "alan").await;
    let signatory = create_global_signatory(database, "Director").await;
    let mut draft = course_draft("Fire safety", &[2, 3]);
    draft.signatory_ids = vec![signatory.id];
    let master = create_course(database, MAIN, &draft).await;
    create_course(database, NORTH, &course_draft("Fire safety", &[1])).await;
    let uri = format!("/admin/courses/{}/sync", master.course.id);

    let response = AxumTestRequest::post(&uri)
        .headers(&identity_headers(&admin))
        .json(&json!({ "target_site_ids": [NORTH] }))
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), 200);
    let report: Value = response.json();
    assert_eq!(report["outcome"], "success");
    assert_eq!(report["targets"][0]["lessons"], 5);

    let response = AxumTestRequest::post(&uri)
        .headers(&identity_headers(&admin))
        .json(&json!({ "target_site_ids": [NORTH, SOUTH] }))
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), 207);
    let report: Value = response.json();
    assert_eq!(report["outcome"], "partial");
    assert_eq!(report["targets"][1]["status"], "failed");

    let response = AxumTestRequest::post(&uri)
        .headers(&identity_headers(&admin))
        .json(&json!({ "target_site_ids": [SOUTH] }))
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), 500);

    let response = AxumTestRequest::post(&uri)
        .headers(&identity_headers(&north_admin))
        .json(&json!({ "target_site_ids": [SOUTH] }))
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), 403);

    let response = AxumTestRequest::post(&uri)
        .headers(&identity_headers(&admin))
        .json(&json!({ "target_site_ids": [] }))
        .send(router)
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_recognition_and_retraining_routes() {
    let (resources, router) = setup().await;
    let database = &resources.database;
    let admin = create_admin(database, MAIN, "grace").await;
    let learner = create_learner(database, MAIN, "john").await;
    let signatory = create_global_signatory(database, "Director").await;
    let course = create_course(database, MAIN, &course_draft("Knots", &[1])).await;
    enroll(database, &learner, course.course.id).await;

    let response = AxumTestRequest::post("/admin/certificates/recognition")
        .headers(&identity_headers(&admin))
        .json(&json!({
            "user_id": learner.id,
            "reason": "Mentor of the year",
            "signatory_ids": [signatory.id]
        }))
        .send(router.clone())
        .await;
    assert_eq!(response.status_code(), 201);
    let issued: Value = response.json();
    assert!(issued["certificateNumber"]
        .as_str()
        .unwrap()
        .starts_with("MAIN-"));

    AxumTestRequest::post(&format!(
        "/courses/{}/lessons/{}/complete",
        course.course.id,
        lesson_ids(&course)[0]
    ))
    .headers(&identity_headers(&learner))
    .send(router.clone())
    .await;

    let response = AxumTestRequest::post(&format!(
        "/admin/courses/{}/retraining",
        course.course.id
    ))
    .headers(&identity_headers(&admin))
    .send(router)
    .await;
    assert_eq!(response.status_code(), 200);
    let report: Value = response.json();
    assert_eq!(report["resetUserIds"], json!([learner.id]));
}
