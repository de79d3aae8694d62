// ABOUTME: Route module organization for the LMS HTTP surface
// ABOUTME: Assembles learner, admin, certificate and health routes behind shared middleware
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! HTTP routes
//!
//! Each domain module exposes a `XRoutes::routes(resources)` constructor and
//! thin handlers that authenticate, parse, and delegate to the learning
//! engines. Request bodies are parsed from raw bytes so malformed JSON is
//! reported as a 400 with the standard error body.

/// Administrator routes
pub mod admin;
/// Certificate listing and public validation
pub mod certificates;
/// Health check routes
pub mod health;
/// Learner course, progress and assessment routes
pub mod learner;

pub use admin::AdminRoutes;
pub use certificates::CertificateRoutes;
pub use health::HealthRoutes;
pub use learner::LearnerRoutes;

use crate::auth::AuthContext;
use crate::constants::http::{MAX_BODY_BYTES, REQUEST_TIMEOUT_SECS};
use crate::errors::{AppError, AppResult};
use crate::resources::ServerResources;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderMap;
use axum::Router;
use serde::de::DeserializeOwned;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the complete API router
pub fn api_router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(LearnerRoutes::routes(Arc::clone(&resources)))
        .merge(AdminRoutes::routes(Arc::clone(&resources)))
        .merge(CertificateRoutes::routes(resources))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(TraceLayer::new_for_http())
}

/// Authenticate the caller through the configured authenticator
pub(crate) async fn authenticate(
    resources: &ServerResources,
    headers: &HeaderMap,
) -> AppResult<AuthContext> {
    resources.authenticator.authenticate(headers).await
}

/// Parse a JSON request body, reporting failures as invalid input
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> AppResult<T> {
    if body.is_empty() {
        return Err(AppError::invalid_input("Request body is required"));
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::invalid_input(format!("Invalid request body: {e}")))
}

/// Parse a path or query identifier
pub(crate) fn parse_id<T: FromStr>(raw: &str, what: &str) -> AppResult<T> {
    raw.parse()
        .map_err(|_| AppError::invalid_input(format!("Invalid {what} '{raw}'")))
}
