// ABOUTME: Fixed identifiers and limits shared across the LMS server
// ABOUTME: Core site ids, certificate numbering bounds, proctoring and HTTP defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Application constants

/// Service identity
pub mod service {
    /// Service name reported by health checks
    pub const SERVICE_NAME: &str = "lms-server";
    /// API version reported in response metadata
    pub const API_VERSION: &str = "1.0";
}

/// Core sites seeded at startup
pub mod sites {
    use lms_core::models::TenantId;

    /// A core site definition
    #[derive(Debug, Clone, Copy)]
    pub struct CoreSite {
        /// Fixed identifier
        pub id: TenantId,
        /// Display name
        pub name: &'static str,
        /// URL slug
        pub slug: &'static str,
        /// Certificate number prefix
        pub certificate_prefix: &'static str,
    }

    /// Primary site, owner of master courses
    pub const MAIN: CoreSite = CoreSite {
        id: TenantId::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001),
        name: "Main Campus",
        slug: "main",
        certificate_prefix: "MAIN",
    };

    /// Northern branch
    pub const NORTH: CoreSite = CoreSite {
        id: TenantId::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0002),
        name: "North Branch",
        slug: "north",
        certificate_prefix: "NORTH",
    };

    /// Southern branch
    pub const SOUTH: CoreSite = CoreSite {
        id: TenantId::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0003),
        name: "South Branch",
        slug: "south",
        certificate_prefix: "SOUTH",
    };

    /// All core sites in seeding order
    pub const CORE_SITES: [CoreSite; 3] = [MAIN, NORTH, SOUTH];
}

/// Certificate issuance
pub mod certificates {
    /// Retries after a certificate number collision before giving up
    pub const NUMBER_COLLISION_RETRIES: u32 = 5;
}

/// HTTP server defaults
pub mod http {
    /// Default listening port
    pub const DEFAULT_PORT: u16 = 8081;
    /// Request timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    /// Maximum request body size (course trees with quiz content)
    pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
}

/// Database defaults
pub mod database {
    /// Default database URL
    pub const DEFAULT_URL: &str = "sqlite:./data/lms.db";
    /// Pool size for file-backed databases
    pub const FILE_POOL_SIZE: u32 = 8;
}
