// ABOUTME: Main library entry point for the multi-site LMS server
// ABOUTME: Exposes persistence, learning engines, proctoring control and the HTTP surface
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # LMS Server
//!
//! Backend for a learning management system shared by several sites
//! (branches). Each site has its own catalog, learners and certificates; a
//! primary site owns master courses that can be replicated into the others.
//!
//! ## Features
//!
//! - **Assessments**: pre-test, lesson quizzes and a final assessment with
//!   per-cycle attempt limits
//! - **Progress**: idempotent lesson completion and course completion
//! - **Certificates**: site-prefixed, date-sharded numbers with public validation
//! - **Course sync**: master course replication with per-target results
//! - **Retraining**: bulk progress reset for learners who completed a course
//! - **Proctoring**: presence-driven compliance controller with countdown
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use lms_server::config::ServerConfig;
//! use lms_server::database::Database;
//! use lms_server::errors::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     let database = Database::new(&config.database).await?;
//!     database.tenants().seed_core_sites().await?;
//!     println!("LMS server configured on port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Request authentication from gateway identity headers
pub mod auth;

/// Environment configuration
pub mod config;

/// Service-wide constants and core site definitions
pub mod constants;

/// `SQLite` persistence and per-table managers
pub mod database;

/// Unified error handling
pub mod errors;

/// Health checks
pub mod health;

/// Assessment, progress, certificate, sync and retraining engines
pub mod learning;

/// Tracing subscriber setup
pub mod logging;

/// Proctoring session controller
pub mod proctoring;

/// Shared state for HTTP handlers
pub mod resources;

/// HTTP routes
pub mod routes;

pub use lms_core::models;
