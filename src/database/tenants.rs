// ABOUTME: Site (tenant) persistence: core site seeding, custom site creation, resolution
// ABOUTME: Each site owns a unique uppercase certificate prefix used in certificate numbers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{is_unique_violation, parse_tenant, parse_timestamp};
use crate::constants::sites::CORE_SITES;
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use lms_core::models::certificate::validate_prefix;
use lms_core::models::TenantId;
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use tracing::info;

/// A site with its own isolated catalog, users and certificates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Site {
    /// Site identifier
    pub id: TenantId,
    /// Display name
    pub name: String,
    /// URL slug
    pub slug: String,
    /// Certificate number prefix
    pub certificate_prefix: String,
    /// Seeded core site (not user-created)
    pub is_core: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Site database operations manager
pub struct TenantManager {
    pool: SqlitePool,
}

impl TenantManager {
    /// Create a new site manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the fixed core sites if they are missing
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn seed_core_sites(&self) -> AppResult<()> {
        let now = Utc::now().to_rfc3339();
        for site in CORE_SITES {
            let inserted = sqlx::query(
                r"
                INSERT INTO tenants (id, name, slug, certificate_prefix, is_core, created_at)
                VALUES ($1, $2, $3, $4, 1, $5)
                ON CONFLICT (id) DO NOTHING
                ",
            )
            .bind(site.id.to_string())
            .bind(site.name)
            .bind(site.slug)
            .bind(site.certificate_prefix)
            .bind(&now)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to seed core site: {e}")))?
            .rows_affected();

            if inserted > 0 {
                info!(tenant_id = %site.id, slug = site.slug, "Seeded core site");
            }
        }
        Ok(())
    }

    /// Create a custom site
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error for a blank name/slug or a bad prefix,
    /// and a conflict if the slug or prefix is taken
    pub async fn create_site(
        &self,
        name: &str,
        slug: &str,
        certificate_prefix: &str,
    ) -> AppResult<Site> {
        let name = name.trim();
        let slug = slug.trim();
        if name.is_empty() {
            return Err(AppError::missing_field("name"));
        }
        if slug.is_empty()
            || !slug
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(AppError::invalid_input(
                "Slug must be lowercase letters, digits or '-'",
            ));
        }
        validate_prefix(certificate_prefix)?;

        let site = Site {
            id: TenantId::new(),
            name: name.to_owned(),
            slug: slug.to_owned(),
            certificate_prefix: certificate_prefix.to_owned(),
            is_core: false,
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO tenants (id, name, slug, certificate_prefix, is_core, created_at)
            VALUES ($1, $2, $3, $4, 0, $5)
            ",
        )
        .bind(site.id.to_string())
        .bind(&site.name)
        .bind(&site.slug)
        .bind(&site.certificate_prefix)
        .bind(site.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, None) {
                AppError::conflict("A site with this slug or certificate prefix already exists")
            } else {
                AppError::database(format!("Failed to create site: {e}"))
            }
        })?;

        info!(tenant_id = %site.id, slug = %site.slug, "Created site");
        Ok(site)
    }

    /// All sites, core sites first
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails
    pub async fn list_sites(&self) -> AppResult<Vec<Site>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, slug, certificate_prefix, is_core, created_at
            FROM tenants
            ORDER BY is_core DESC, created_at, slug
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list sites: {e}")))?;

        rows.iter().map(row_to_site).collect()
    }

    /// Resolve a site id
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown site
    pub async fn resolve(&self, tenant_id: TenantId) -> AppResult<Site> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| AppError::database(format!("Failed to acquire connection: {e}")))?;
        Self::resolve_in(&mut conn, tenant_id).await
    }

    /// Resolve a site id on an existing connection
    ///
    /// # Errors
    ///
    /// Returns not-found for an unknown site
    pub async fn resolve_in(conn: &mut SqliteConnection, tenant_id: TenantId) -> AppResult<Site> {
        let row = sqlx::query(
            r"
            SELECT id, name, slug, certificate_prefix, is_core, created_at
            FROM tenants
            WHERE id = $1
            ",
        )
        .bind(tenant_id.to_string())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| AppError::database(format!("Failed to resolve site: {e}")))?;

        row.as_ref()
            .map(row_to_site)
            .transpose()?
            .ok_or_else(|| AppError::not_found(format!("Site {tenant_id}")))
    }
}

fn row_to_site(row: &SqliteRow) -> AppResult<Site> {
    Ok(Site {
        id: parse_tenant(&row.try_get::<String, _>("id")?)?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        certificate_prefix: row.try_get("certificate_prefix")?,
        is_core: row.try_get("is_core")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?, "created_at")?,
    })
}
