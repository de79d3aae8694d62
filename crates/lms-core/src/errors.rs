// ABOUTME: Error type for domain-level validation in lms-core
// ABOUTME: Converted into the server's AppError at the crate boundary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

/// Errors raised while validating or decoding domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input was structurally valid but violated a domain rule
    #[error("{0}")]
    Invalid(String),

    /// Stored content could not be decoded
    #[error("Stored content is corrupt: {0}")]
    Corrupt(String),
}

impl DomainError {
    /// Create an `Invalid` error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Create a `Corrupt` error
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt(message.into())
    }
}

/// Result alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
