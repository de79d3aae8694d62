// ABOUTME: Certificate rows keyed by a globally unique certificate number
// ABOUTME: Signer names and positions are snapshotted at issuance and never rewritten
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::signatories::Signatory;
use super::{is_unique_violation, parse_tenant, parse_timestamp, parse_uuid};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use lms_core::models::{CertificateKind, TenantId};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use uuid::Uuid;

const DETAILS_SELECT: &str = r"
    SELECT c.id, c.tenant_id, c.user_id, c.course_id, c.certificate_type, c.certificate_number,
           c.reason, c.awarded_at, u.display_name AS recipient_name, co.title AS course_title
    FROM certificates c
    JOIN users u ON u.id = c.user_id
    LEFT JOIN courses co ON co.id = c.course_id
";

/// A certificate about to be inserted
#[derive(Debug, Clone)]
pub struct CertificateRecord {
    /// Certificate identifier
    pub id: Uuid,
    /// Issuing site
    pub tenant_id: TenantId,
    /// Recipient
    pub user_id: Uuid,
    /// Completed course (completion certificates only)
    pub course_id: Option<Uuid>,
    /// Kind
    pub kind: CertificateKind,
    /// Public certificate number
    pub number: String,
    /// Award reason (recognition certificates only)
    pub reason: Option<String>,
    /// Award timestamp
    pub awarded_at: DateTime<Utc>,
}

/// Reference to an existing certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRef {
    /// Certificate identifier
    pub id: Uuid,
    /// Public certificate number
    pub number: String,
}

/// Signer details as they were when the certificate was issued
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatorySnapshot {
    /// Original signatory identifier
    pub signatory_id: Uuid,
    /// Printed name
    pub name: String,
    /// Printed position
    pub position: String,
    /// Signature image URL
    pub signature_url: Option<String>,
}

/// Certificate as shown to learners and validators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateDetails {
    /// Certificate identifier
    pub id: Uuid,
    /// Issuing site
    pub tenant_id: TenantId,
    /// Recipient
    pub user_id: Uuid,
    /// Public certificate number
    pub certificate_number: String,
    /// Kind
    pub certificate_type: CertificateKind,
    /// Recipient display name
    pub recipient_name: String,
    /// Course id (completion only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<Uuid>,
    /// Course title (completion only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_title: Option<String>,
    /// Reason (recognition only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Award timestamp
    pub awarded_at: DateTime<Utc>,
    /// Signers in signing order
    pub signatories: Vec<SignatorySnapshot>,
}

/// Certificate database operations manager
pub struct CertificateManager {
    pool: SqlitePool,
}

impl CertificateManager {
    /// Create a new certificate manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up a certificate by its public number, across all sites
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn find_by_number(&self, number: &str) -> AppResult<Option<CertificateDetails>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;

        let row = sqlx::query(&format!("{DETAILS_SELECT} WHERE c.certificate_number = $1"))
            .bind(number)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::database(format!("Failed to look up certificate: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut details = row_to_details(&row)?;
        details.signatories = Self::signatories_of_in(&mut conn, details.id).await?;
        Ok(Some(details))
    }

    /// A learner's certificates in the site, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn list_for_user(
        &self,
        tenant_id: TenantId,
        user_id: Uuid,
    ) -> AppResult<Vec<CertificateDetails>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;

        let rows = sqlx::query(&format!(
            "{DETAILS_SELECT} WHERE c.tenant_id = $1 AND c.user_id = $2 ORDER BY c.awarded_at DESC"
        ))
        .bind(tenant_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to list certificates: {e}")))?;

        let mut certificates = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut details = row_to_details(row)?;
            details.signatories = Self::signatories_of_in(&mut conn, details.id).await?;
            certificates.push(details);
        }
        Ok(certificates)
    }

    /// Existing completion certificate for a user and course
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn find_completion_in(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<Option<CertificateRef>> {
        let row = sqlx::query(
            r"
            SELECT id, certificate_number FROM certificates
            WHERE user_id = $1 AND course_id = $2 AND certificate_type = 'completion'
            ",
        )
        .bind(user_id.to_string())
        .bind(course_id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to check existing certificate: {e}")))?;

        row.map(|row| -> AppResult<CertificateRef> {
            Ok(CertificateRef {
                id: parse_uuid(&row.try_get::<String, _>("id")?, "certificate id")?,
                number: row.try_get("certificate_number")?,
            })
        })
        .transpose()
    }

    /// Number of certificates whose number matches a `LIKE` pattern
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn count_matching_in(conn: &mut SqliteConnection, pattern: &str) -> AppResult<u32> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM certificates WHERE certificate_number LIKE $1")
                .bind(pattern)
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| AppError::database(format!("Failed to count certificates: {e}")))?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    /// Insert a certificate row. Returns `false` if the number is already taken.
    ///
    /// # Errors
    ///
    /// Returns a conflict if the user already holds a completion certificate
    /// for the course, or a database error
    pub async fn try_insert_in(
        conn: &mut SqliteConnection,
        record: &CertificateRecord,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            INSERT INTO certificates (
                id, tenant_id, user_id, course_id, certificate_type, certificate_number,
                reason, awarded_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(record.id.to_string())
        .bind(record.tenant_id.to_string())
        .bind(record.user_id.to_string())
        .bind(record.course_id.map(|id| id.to_string()))
        .bind(record.kind.as_str())
        .bind(&record.number)
        .bind(&record.reason)
        .bind(record.awarded_at.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *conn)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e, Some("certificate_number")) => Ok(false),
            Err(e) if is_unique_violation(&e, None) => Err(AppError::conflict(
                "A completion certificate already exists for this course",
            )),
            Err(e) => Err(AppError::database(format!("Failed to insert certificate: {e}"))),
        }
    }

    /// Snapshot signers onto a certificate, in order
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn insert_signatories_in(
        conn: &mut SqliteConnection,
        certificate_id: Uuid,
        signatories: &[Signatory],
    ) -> AppResult<()> {
        for (index, signatory) in signatories.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO certificate_signatories
                    (certificate_id, signatory_id, name, position, signature_url, sort_order)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(certificate_id.to_string())
            .bind(signatory.id.to_string())
            .bind(&signatory.name)
            .bind(&signatory.position)
            .bind(&signatory.signature_url)
            .bind(i64::try_from(index).unwrap_or(i64::MAX))
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::database(format!("Failed to link certificate signatory: {e}")))?;
        }
        Ok(())
    }

    /// Snapshotted signers of a certificate
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn signatories_of_in(
        conn: &mut SqliteConnection,
        certificate_id: Uuid,
    ) -> AppResult<Vec<SignatorySnapshot>> {
        let rows = sqlx::query(
            r"
            SELECT signatory_id, name, position, signature_url
            FROM certificate_signatories
            WHERE certificate_id = $1
            ORDER BY sort_order
            ",
        )
        .bind(certificate_id.to_string())
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to load certificate signatories: {e}")))?;

        rows.iter()
            .map(|row| -> AppResult<SignatorySnapshot> {
                Ok(SignatorySnapshot {
                    signatory_id: parse_uuid(
                        &row.try_get::<String, _>("signatory_id")?,
                        "signatory_id",
                    )?,
                    name: row.try_get("name")?,
                    position: row.try_get("position")?,
                    signature_url: row.try_get("signature_url")?,
                })
            })
            .collect()
    }

    /// Number of completion certificates for a user and course
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn count_completions(&self, user_id: Uuid, course_id: Uuid) -> AppResult<u32> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM certificates
            WHERE user_id = $1 AND course_id = $2 AND certificate_type = 'completion'
            ",
        )
        .bind(user_id.to_string())
        .bind(course_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count certificates: {e}")))?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

fn row_to_details(row: &SqliteRow) -> AppResult<CertificateDetails> {
    let kind: String = row.try_get("certificate_type")?;
    let course_id: Option<String> = row.try_get("course_id")?;
    Ok(CertificateDetails {
        id: parse_uuid(&row.try_get::<String, _>("id")?, "certificate id")?,
        tenant_id: parse_tenant(&row.try_get::<String, _>("tenant_id")?)?,
        user_id: parse_uuid(&row.try_get::<String, _>("user_id")?, "user id")?,
        certificate_number: row.try_get("certificate_number")?,
        certificate_type: CertificateKind::parse(&kind)?,
        recipient_name: row.try_get("recipient_name")?,
        course_id: course_id
            .as_deref()
            .map(|id| parse_uuid(id, "course id"))
            .transpose()?,
        course_title: row.try_get("course_title")?,
        reason: row.try_get("reason")?,
        awarded_at: parse_timestamp(&row.try_get::<String, _>("awarded_at")?, "awarded_at")?,
        signatories: Vec::new(),
    })
}
