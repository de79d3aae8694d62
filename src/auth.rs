// ABOUTME: Request authentication from upstream gateway identity headers
// ABOUTME: Resolves the caller to a stored user of the stated site and enforces admin roles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Authentication
//!
//! Session handling lives in an upstream gateway. The gateway forwards the
//! caller's identity in `x-user-id` and `x-site-id`, and its view of the
//! caller's privileges in `x-user-role` and `x-super-admin`. The server
//! re-checks the identity against its own user table: a privilege is granted
//! only when both the gateway and the stored user record carry it.

use crate::database::{Database, UserRole};
use crate::errors::{AppError, AppResult};
use crate::learning::Actor;
use async_trait::async_trait;
use http::HeaderMap;
use lms_core::models::TenantId;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

/// Caller user id header
pub const USER_ID_HEADER: &str = "x-user-id";
/// Caller site id header
pub const SITE_ID_HEADER: &str = "x-site-id";
/// Caller role header (`employee` | `admin`)
pub const USER_ROLE_HEADER: &str = "x-user-role";
/// Super admin flag header (`true` | `false`)
pub const SUPER_ADMIN_HEADER: &str = "x-super-admin";

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    /// Caller's site
    pub tenant_id: TenantId,
    /// Caller
    pub user_id: Uuid,
    /// Effective role
    pub role: UserRole,
    /// Effective super admin flag
    pub is_super_admin: bool,
}

impl AuthContext {
    /// Engine-level view of the caller
    #[must_use]
    pub const fn actor(&self) -> Actor {
        Actor {
            tenant_id: self.tenant_id,
            user_id: self.user_id,
            is_admin: self.role.is_admin(),
        }
    }

    /// Require the site administrator role
    ///
    /// # Errors
    ///
    /// Returns permission-denied for non-admin callers
    pub fn require_admin(&self) -> AppResult<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::permission_denied("Administrator role required"))
        }
    }

    /// Require the super administrator flag
    ///
    /// # Errors
    ///
    /// Returns permission-denied unless the caller is a super admin
    pub fn require_super_admin(&self) -> AppResult<()> {
        if self.is_super_admin {
            Ok(())
        } else {
            Err(AppError::permission_denied("Super administrator required"))
        }
    }
}

/// Resolves request headers to an authenticated caller
#[async_trait]
pub trait SessionAuthenticator: Send + Sync {
    /// Authenticate a request
    ///
    /// # Errors
    ///
    /// Returns auth-required when no identity is present and auth-invalid
    /// when the identity does not resolve to a stored user
    async fn authenticate(&self, headers: &HeaderMap) -> AppResult<AuthContext>;
}

/// Trusts gateway identity headers, verified against the user table
pub struct HeaderSessionAuthenticator {
    database: Database,
}

impl HeaderSessionAuthenticator {
    /// Create a new header authenticator
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<Option<&'a str>> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map(str::trim)
                .map_err(|_| AppError::auth_invalid(format!("Header {name} is not valid text")))
        })
        .transpose()
}

fn parse_header<T: FromStr>(headers: &HeaderMap, name: &str) -> AppResult<Option<T>> {
    header(headers, name)?
        .map(|raw| {
            raw.parse()
                .map_err(|_| AppError::auth_invalid(format!("Header {name} is malformed")))
        })
        .transpose()
}

#[async_trait]
impl SessionAuthenticator for HeaderSessionAuthenticator {
    async fn authenticate(&self, headers: &HeaderMap) -> AppResult<AuthContext> {
        let user_id: Option<Uuid> = parse_header(headers, USER_ID_HEADER)?;
        let tenant_id: Option<TenantId> = parse_header(headers, SITE_ID_HEADER)?;
        let (Some(user_id), Some(tenant_id)) = (user_id, tenant_id) else {
            return Err(AppError::auth_required());
        };

        let claimed_role: Option<UserRole> = parse_header(headers, USER_ROLE_HEADER)?;
        let claimed_super: Option<bool> = parse_header(headers, SUPER_ADMIN_HEADER)?;

        let Some(user) = self.database.users().get_user(tenant_id, user_id).await? else {
            warn!(user_id = %user_id, tenant_id = %tenant_id, "Rejected unknown caller");
            return Err(AppError::auth_invalid("Unknown user for this site"));
        };

        let role = match claimed_role {
            Some(UserRole::Admin) | None => user.role,
            Some(UserRole::Employee) => UserRole::Employee,
        };

        Ok(AuthContext {
            tenant_id,
            user_id,
            role,
            is_super_admin: user.is_super_admin && claimed_super.unwrap_or(true),
        })
    }
}
