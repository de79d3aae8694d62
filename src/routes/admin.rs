// ABOUTME: Administrator routes: sites, users, signatories, courses, enrollment, sync, retraining
// ABOUTME: Site administration needs the super admin flag; everything else the admin role
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Admin routes
//!
//! All operations act on the caller's own site, except course sync which
//! reads the master course from the primary site and may only be started by
//! an administrator of that site.

use super::{authenticate, parse_body, parse_id};
use crate::database::{CourseDraft, CreateSignatoryRequest, CreateUserRequest};
use crate::errors::AppError;
use crate::learning::SyncOutcome;
use crate::resources::ServerResources;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use lms_core::models::TenantId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Body of `POST /admin/sites`
#[derive(Debug, Deserialize)]
pub struct CreateSiteBody {
    /// Display name
    pub name: String,
    /// URL slug
    pub slug: String,
    /// Uppercase certificate prefix
    pub certificate_prefix: String,
}

/// Body of `POST /admin/courses/:id/enrollments`
#[derive(Debug, Deserialize)]
pub struct EnrollBody {
    /// Users of the caller's site
    pub user_ids: Vec<Uuid>,
}

/// Response of `POST /admin/courses/:id/enrollments`
#[derive(Debug, Serialize)]
pub struct EnrollResponse {
    /// Newly enrolled users
    pub enrolled: Vec<Uuid>,
    /// Users that were already enrolled
    pub already_enrolled: Vec<Uuid>,
}

/// Body of `POST /admin/courses/:id/sync`
#[derive(Debug, Deserialize)]
pub struct SyncBody {
    /// Target sites, processed in order
    pub target_site_ids: Vec<TenantId>,
}

/// Body of `POST /admin/certificates/recognition`
#[derive(Debug, Deserialize)]
pub struct RecognitionBody {
    /// Recipient in the caller's site
    pub user_id: Uuid,
    /// Reason printed on the certificate
    pub reason: String,
    /// Signing set, in order
    pub signatory_ids: Vec<Uuid>,
}

/// Admin routes handler
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/admin/sites", post(Self::handle_create_site))
            .route("/admin/sites", get(Self::handle_list_sites))
            .route("/admin/users", post(Self::handle_create_user))
            .route("/admin/signatories", post(Self::handle_create_signatory))
            .route("/admin/courses", post(Self::handle_create_course))
            .route("/admin/courses/:id", put(Self::handle_replace_course))
            .route("/admin/courses/:id/enrollments", post(Self::handle_enroll))
            .route("/admin/courses/:id/sync", post(Self::handle_sync))
            .route("/admin/courses/:id/retraining", post(Self::handle_retraining))
            .route(
                "/admin/certificates/recognition",
                post(Self::handle_recognition),
            )
            .with_state(resources)
    }

    /// Handle POST /admin/sites
    async fn handle_create_site(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        auth.require_super_admin()?;
        let request: CreateSiteBody = parse_body(&body)?;

        let site = resources
            .database
            .tenants()
            .create_site(&request.name, &request.slug, &request.certificate_prefix)
            .await?;
        Ok((StatusCode::CREATED, Json(site)).into_response())
    }

    /// Handle GET /admin/sites
    async fn handle_list_sites(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        auth.require_admin()?;

        let sites = resources.database.tenants().list_sites().await?;
        Ok((StatusCode::OK, Json(sites)).into_response())
    }

    /// Handle POST /admin/users
    async fn handle_create_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        auth.require_admin()?;
        let request: CreateUserRequest = parse_body(&body)?;
        if request.is_super_admin {
            auth.require_super_admin()?;
        }

        let user = resources
            .database
            .users()
            .create_user(auth.tenant_id, &request)
            .await?;
        Ok((StatusCode::CREATED, Json(user)).into_response())
    }

    /// Handle POST /admin/signatories
    async fn handle_create_signatory(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        auth.require_admin()?;
        let request: CreateSignatoryRequest = parse_body(&body)?;
        let owner = if request.global {
            auth.require_super_admin()?;
            None
        } else {
            Some(auth.tenant_id)
        };

        let signatory = resources
            .database
            .signatories()
            .create_signatory(owner, &request)
            .await?;
        Ok((StatusCode::CREATED, Json(signatory)).into_response())
    }

    /// Handle POST /admin/courses
    async fn handle_create_course(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        auth.require_admin()?;
        let draft: CourseDraft = parse_body(&body)?;

        let tree = resources
            .database
            .courses()
            .create_course(auth.tenant_id, &draft)
            .await?;
        Ok((StatusCode::CREATED, Json(tree)).into_response())
    }

    /// Handle PUT /admin/courses/:id
    async fn handle_replace_course(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        auth.require_admin()?;
        let course_id: Uuid = parse_id(&id, "course id")?;
        let draft: CourseDraft = parse_body(&body)?;

        let tree = resources
            .database
            .courses()
            .replace_course(auth.tenant_id, course_id, &draft)
            .await?;
        Ok((StatusCode::OK, Json(tree)).into_response())
    }

    /// Handle POST /admin/courses/:id/enrollments
    async fn handle_enroll(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        auth.require_admin()?;
        let course_id: Uuid = parse_id(&id, "course id")?;
        let request: EnrollBody = parse_body(&body)?;
        if request.user_ids.is_empty() {
            return Err(AppError::missing_field("user_ids"));
        }

        let enrollments = resources.database.enrollments();
        let mut response = EnrollResponse {
            enrolled: Vec::new(),
            already_enrolled: Vec::new(),
        };
        for user_id in request.user_ids {
            if enrollments.enroll(auth.tenant_id, user_id, course_id).await? {
                response.enrolled.push(user_id);
            } else {
                response.already_enrolled.push(user_id);
            }
        }
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /admin/courses/:id/sync
    async fn handle_sync(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        auth.require_admin()?;
        if auth.tenant_id != resources.primary_site {
            return Err(AppError::permission_denied(
                "Course sync is run from the primary site",
            ));
        }
        let master_course_id: Uuid = parse_id(&id, "course id")?;
        let request: SyncBody = parse_body(&body)?;

        info!(
            user_id = %auth.user_id,
            course_id = %master_course_id,
            targets = request.target_site_ids.len(),
            "Course sync requested"
        );
        let report = resources
            .sync
            .sync_course(master_course_id, &request.target_site_ids)
            .await?;

        let status = match report.outcome {
            SyncOutcome::Success => StatusCode::OK,
            SyncOutcome::Partial => StatusCode::MULTI_STATUS,
            SyncOutcome::Failed => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Ok((status, Json(report)).into_response())
    }

    /// Handle POST /admin/courses/:id/retraining
    async fn handle_retraining(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        auth.require_admin()?;
        let course_id: Uuid = parse_id(&id, "course id")?;

        let report = resources
            .retraining
            .retrain_completed_users(auth.tenant_id, course_id)
            .await?;
        Ok((StatusCode::OK, Json(report)).into_response())
    }

    /// Handle POST /admin/certificates/recognition
    async fn handle_recognition(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;
        auth.require_admin()?;
        let request: RecognitionBody = parse_body(&body)?;

        let issued = resources
            .certificates
            .issue_recognition(
                auth.tenant_id,
                request.user_id,
                &request.reason,
                &request.signatory_ids,
            )
            .await?;
        Ok((StatusCode::CREATED, Json(issued)).into_response())
    }
}
