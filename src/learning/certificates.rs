// ABOUTME: Certificate issuer: date-sharded numbering, completion and recognition issuance
// ABOUTME: Public validation answers unknown, cross-site and mismatched numbers identically
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Certificate issuance
//!
//! Numbers have the form `PREFIX-YYYYMMDD-NNN` where `PREFIX` is the issuing
//! site's certificate prefix and `NNN` is one more than the number of
//! certificates already issued with that prefix on that day. The count runs
//! inside the issuing transaction; the unique index on the number catches
//! the remaining race, in which case the serial is recounted and bumped.

use crate::constants::certificates::NUMBER_COLLISION_RETRIES;
use crate::database::{
    CertificateDetails, CertificateManager, CertificateRecord, Database, SignatoryManager,
    TenantManager, UserManager,
};
use crate::errors::{AppError, AppResult, ErrorCode};
use chrono::Utc;
use lms_core::models::{CertificateKind, CertificateNumber, TenantId};
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{info, warn};
use uuid::Uuid;

/// A certificate returned by an issuance call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCertificate {
    /// Certificate identifier
    pub id: Uuid,
    /// Public certificate number
    pub certificate_number: String,
    /// `false` when an existing completion certificate was returned
    pub newly_issued: bool,
}

/// What to issue
struct Issuance<'a> {
    tenant_id: TenantId,
    user_id: Uuid,
    course_id: Option<Uuid>,
    kind: CertificateKind,
    reason: Option<&'a str>,
    signatory_ids: &'a [Uuid],
}

/// Certificate issuer
#[derive(Clone)]
pub struct CertificateIssuer {
    database: Database,
}

impl CertificateIssuer {
    /// Create a new certificate issuer
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    /// Issue the completion certificate for a course, or return the
    /// existing one. Signed by the course's default signatories.
    ///
    /// # Errors
    ///
    /// Returns invalid-input if a default signatory left the site's pool,
    /// or a database error
    pub async fn issue_completion_in(
        conn: &mut SqliteConnection,
        tenant_id: TenantId,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<IssuedCertificate> {
        if let Some(existing) =
            CertificateManager::find_completion_in(conn, user_id, course_id).await?
        {
            return Ok(IssuedCertificate {
                id: existing.id,
                certificate_number: existing.number,
                newly_issued: false,
            });
        }

        let signatory_ids = SignatoryManager::course_signatory_ids(conn, course_id).await?;
        Self::issue_in(
            conn,
            &Issuance {
                tenant_id,
                user_id,
                course_id: Some(course_id),
                kind: CertificateKind::Completion,
                reason: None,
                signatory_ids: &signatory_ids,
            },
        )
        .await
    }

    /// Award a recognition certificate, not tied to a course
    ///
    /// # Errors
    ///
    /// Returns invalid-input for a blank reason, no signatories or
    /// signatories outside the site's pool, and not-found for an unknown user
    pub async fn issue_recognition(
        &self,
        tenant_id: TenantId,
        user_id: Uuid,
        reason: &str,
        signatory_ids: &[Uuid],
    ) -> AppResult<IssuedCertificate> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::missing_field("reason"));
        }
        if signatory_ids.is_empty() {
            return Err(AppError::invalid_input(
                "A recognition certificate needs at least one signatory",
            ));
        }

        let mut guard = self.database.begin().await?;
        let conn = guard.executor()?;

        if UserManager::get_user_in(conn, tenant_id, user_id)
            .await?
            .is_none()
        {
            return Err(AppError::not_found(format!("User {user_id}")));
        }

        let issued = Self::issue_in(
            conn,
            &Issuance {
                tenant_id,
                user_id,
                course_id: None,
                kind: CertificateKind::Recognition,
                reason: Some(reason),
                signatory_ids,
            },
        )
        .await?;
        guard.commit().await?;
        Ok(issued)
    }

    async fn issue_in(
        conn: &mut SqliteConnection,
        issuance: &Issuance<'_>,
    ) -> AppResult<IssuedCertificate> {
        let site = TenantManager::resolve_in(conn, issuance.tenant_id).await?;
        let signatories =
            SignatoryManager::load_from_pool(conn, issuance.tenant_id, issuance.signatory_ids)
                .await?;

        let awarded_at = Utc::now();
        let day = awarded_at.date_naive();
        let pattern = CertificateNumber::day_pattern(&site.certificate_prefix, day);

        for attempt in 0..=NUMBER_COLLISION_RETRIES {
            let issued_today = CertificateManager::count_matching_in(conn, &pattern).await?;
            let number =
                CertificateNumber::new(&site.certificate_prefix, day, issued_today + 1 + attempt)
                    .map_err(|e| {
                        AppError::internal(format!("Cannot allocate certificate number: {e}"))
                    })?
                    .to_string();

            let record = CertificateRecord {
                id: Uuid::new_v4(),
                tenant_id: issuance.tenant_id,
                user_id: issuance.user_id,
                course_id: issuance.course_id,
                kind: issuance.kind,
                number,
                reason: issuance.reason.map(str::to_owned),
                awarded_at,
            };

            if CertificateManager::try_insert_in(conn, &record).await? {
                CertificateManager::insert_signatories_in(conn, record.id, &signatories).await?;
                info!(
                    tenant_id = %record.tenant_id,
                    user_id = %record.user_id,
                    course_id = ?record.course_id,
                    certificate_number = %record.number,
                    kind = record.kind.as_str(),
                    signatories = signatories.len(),
                    "Issued certificate"
                );
                return Ok(IssuedCertificate {
                    id: record.id,
                    certificate_number: record.number,
                    newly_issued: true,
                });
            }

            warn!(
                certificate_number = %record.number,
                attempt,
                "Certificate number already taken, recounting"
            );
        }

        Err(AppError::internal(format!(
            "Could not allocate a unique certificate number for {} after {} attempts",
            site.certificate_prefix,
            NUMBER_COLLISION_RETRIES + 1
        )))
    }

    /// Public lookup of a certificate number on behalf of a site
    ///
    /// # Errors
    ///
    /// Returns the same not-found error for a malformed or unknown number,
    /// a number whose prefix belongs to another site, and a certificate
    /// stored under another site
    pub async fn validate(&self, number: &str, site_id: TenantId) -> AppResult<CertificateDetails> {
        let number = number.trim();
        let not_found = || AppError::not_found("Certificate");

        let parsed: CertificateNumber = number.parse().map_err(|_| not_found())?;
        let site = match self.database.tenants().resolve(site_id).await {
            Ok(site) => site,
            Err(e) if e.code == ErrorCode::ResourceNotFound => return Err(not_found()),
            Err(e) => return Err(e),
        };
        if parsed.prefix() != site.certificate_prefix {
            warn!(
                tenant_id = %site_id,
                certificate_number = number,
                "Certificate prefix does not match site"
            );
            return Err(not_found());
        }

        let details = self
            .database
            .certificates()
            .find_by_number(number)
            .await?
            .ok_or_else(not_found)?;
        if details.tenant_id != site.id {
            warn!(
                tenant_id = %site_id,
                certificate_number = number,
                "Certificate stored under another site"
            );
            return Err(not_found());
        }

        info!(tenant_id = %site_id, certificate_number = number, "Validated certificate");
        Ok(details)
    }

    /// A learner's certificates in the site
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn list_user_certificates(
        &self,
        tenant_id: TenantId,
        user_id: Uuid,
    ) -> AppResult<Vec<CertificateDetails>> {
        self.database
            .certificates()
            .list_for_user(tenant_id, user_id)
            .await
    }
}
