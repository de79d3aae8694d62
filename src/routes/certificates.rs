// ABOUTME: Certificate routes: the learner's own certificates and public validation
// ABOUTME: Validation answers every mismatch with the same 404 so numbers cannot be probed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{authenticate, parse_id};
use crate::errors::AppError;
use crate::resources::ServerResources;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use lms_core::models::TenantId;
use serde::Deserialize;
use std::sync::Arc;

/// Query of `GET /certificates/validate`
#[derive(Debug, Default, Deserialize)]
pub struct ValidateQuery {
    /// Certificate number
    pub number: Option<String>,
    /// Site the certificate is claimed to belong to
    pub site: Option<String>,
}

/// Certificate routes handler
pub struct CertificateRoutes;

impl CertificateRoutes {
    /// Create all certificate routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/certificates", get(Self::handle_list))
            .route("/certificates/validate", get(Self::handle_validate))
            .with_state(resources)
    }

    /// Handle GET /certificates
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&resources, &headers).await?;

        let certificates = resources
            .certificates
            .list_user_certificates(auth.tenant_id, auth.user_id)
            .await?;
        Ok((StatusCode::OK, Json(certificates)).into_response())
    }

    /// Handle GET /certificates/validate (public)
    async fn handle_validate(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<ValidateQuery>,
    ) -> Result<Response, AppError> {
        let number = query
            .number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::missing_field("number"))?;
        let site = query
            .site
            .as_deref()
            .ok_or_else(|| AppError::missing_field("site"))?;
        let site_id: TenantId = parse_id(site, "site id")?;

        let certificate = resources.certificates.validate(number, site_id).await?;
        Ok((StatusCode::OK, Json(certificate)).into_response())
    }
}
