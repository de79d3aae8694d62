// ABOUTME: Domain crate for the LMS server: models, quiz scoring, certificate numbers
// ABOUTME: Also hosts the pure proctoring state machine shared by every assessment session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # LMS Core
//!
//! Dependency-light building blocks used by the server crate:
//!
//! - **Models**: sites, courses, modules, lessons (tagged by lesson kind)
//! - **Quiz content**: the one validated question/option shape and its scoring
//! - **Certificates**: certificate kinds and the `PREFIX-YYYYMMDD-NNN` number format
//! - **Proctoring**: the compliance state machine driven by presence signals

/// Domain error type
pub mod errors;

/// Domain models
pub mod models;

/// Proctoring compliance state machine
pub mod proctoring;

pub use errors::{DomainError, DomainResult};
