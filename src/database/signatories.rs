// ABOUTME: Signatory pools and course default signing sets
// ABOUTME: A site's pool is its own signatories plus the global ones (no owning site)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{parse_tenant, parse_timestamp, parse_uuid};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use lms_core::models::TenantId;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

/// A person who signs certificates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signatory {
    /// Signatory identifier
    pub id: Uuid,
    /// Owning site; `None` for the global pool
    pub tenant_id: Option<TenantId>,
    /// Printed name
    pub name: String,
    /// Printed position
    pub position: String,
    /// Signature image URL in blob storage
    pub signature_url: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Request to create a signatory
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSignatoryRequest {
    /// Printed name
    pub name: String,
    /// Printed position
    pub position: String,
    /// Signature image URL
    #[serde(default)]
    pub signature_url: Option<String>,
    /// Add to the global pool instead of the caller's site (super admin only)
    #[serde(default)]
    pub global: bool,
}

/// Signatory database operations manager
pub struct SignatoryManager {
    pool: SqlitePool,
}

impl SignatoryManager {
    /// Create a new signatory manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a signatory owned by `owner` (or global when `None`)
    ///
    /// # Errors
    ///
    /// Returns invalid-input for a blank name or position
    pub async fn create_signatory(
        &self,
        owner: Option<TenantId>,
        request: &CreateSignatoryRequest,
    ) -> AppResult<Signatory> {
        if request.name.trim().is_empty() {
            return Err(AppError::missing_field("name"));
        }
        if request.position.trim().is_empty() {
            return Err(AppError::missing_field("position"));
        }

        let signatory = Signatory {
            id: Uuid::new_v4(),
            tenant_id: owner,
            name: request.name.trim().to_owned(),
            position: request.position.trim().to_owned(),
            signature_url: request.signature_url.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO signatories (id, tenant_id, name, position, signature_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(signatory.id.to_string())
        .bind(owner.map(|t| t.to_string()))
        .bind(&signatory.name)
        .bind(&signatory.position)
        .bind(&signatory.signature_url)
        .bind(signatory.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create signatory: {e}")))?;

        info!(signatory_id = %signatory.id, global = owner.is_none(), "Created signatory");
        Ok(signatory)
    }

    /// Every signatory visible to a site
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn list_pool(&self, tenant_id: TenantId) -> AppResult<Vec<Signatory>> {
        let rows = sqlx::query(
            r"
            SELECT id, tenant_id, name, position, signature_url, created_at
            FROM signatories
            WHERE tenant_id = $1 OR tenant_id IS NULL
            ORDER BY name
            ",
        )
        .bind(tenant_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list signatories: {e}")))?;

        rows.iter().map(row_to_signatory).collect()
    }

    /// Load `ids` from the site's pool, preserving the requested order
    ///
    /// # Errors
    ///
    /// Returns invalid-input if an id repeats or is not in the pool
    pub async fn load_from_pool(
        conn: &mut SqliteConnection,
        tenant_id: TenantId,
        ids: &[Uuid],
    ) -> AppResult<Vec<Signatory>> {
        let mut seen = HashSet::new();
        let mut signatories = Vec::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(*id) {
                return Err(AppError::invalid_input(format!(
                    "Signatory {id} is listed more than once"
                )));
            }
            let row = sqlx::query(
                r"
                SELECT id, tenant_id, name, position, signature_url, created_at
                FROM signatories
                WHERE id = $1 AND (tenant_id = $2 OR tenant_id IS NULL)
                ",
            )
            .bind(id.to_string())
            .bind(tenant_id.to_string())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| AppError::database(format!("Failed to load signatory: {e}")))?;

            let Some(row) = row else {
                return Err(AppError::invalid_input(format!(
                    "Signatory {id} is not available to this site"
                )));
            };
            signatories.push(row_to_signatory(&row)?);
        }
        Ok(signatories)
    }

    /// Default signing set of a course, in order
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn course_signatory_ids(
        conn: &mut SqliteConnection,
        course_id: Uuid,
    ) -> AppResult<Vec<Uuid>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r"
            SELECT signatory_id FROM course_signatories
            WHERE course_id = $1
            ORDER BY sort_order
            ",
        )
        .bind(course_id.to_string())
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to load course signatories: {e}")))?;

        ids.iter().map(|id| parse_uuid(id, "signatory_id")).collect()
    }

    /// Replace the default signing set of a course
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn replace_course_signatories(
        conn: &mut SqliteConnection,
        course_id: Uuid,
        ids: &[Uuid],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM course_signatories WHERE course_id = $1")
            .bind(course_id.to_string())
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::database(format!("Failed to clear course signatories: {e}")))?;

        for (index, id) in ids.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO course_signatories (course_id, signatory_id, sort_order)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(course_id.to_string())
            .bind(id.to_string())
            .bind(i64::try_from(index).unwrap_or(i64::MAX))
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::database(format!("Failed to link course signatory: {e}")))?;
        }
        Ok(())
    }
}

fn row_to_signatory(row: &SqliteRow) -> AppResult<Signatory> {
    let tenant: Option<String> = row.try_get("tenant_id")?;
    Ok(Signatory {
        id: parse_uuid(&row.try_get::<String, _>("id")?, "signatory id")?,
        tenant_id: tenant.as_deref().map(parse_tenant).transpose()?,
        name: row.try_get("name")?,
        position: row.try_get("position")?,
        signature_url: row.try_get("signature_url")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?, "created_at")?,
    })
}
