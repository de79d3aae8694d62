// ABOUTME: Certificate kinds and the PREFIX-YYYYMMDD-NNN certificate number
// ABOUTME: The number is the public lookup key; its prefix identifies the issuing site
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::errors::{DomainError, DomainResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest serial that fits the 4-digit format
const MAX_SERIAL: u32 = 9_999;

/// Kind of certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateKind {
    /// Earned by completing a course
    Completion,
    /// Awarded by an administrator, not tied to a course
    Recognition,
}

impl CertificateKind {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completion => "completion",
            Self::Recognition => "recognition",
        }
    }

    /// Parse from database string representation
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Corrupt` for unknown kinds
    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "completion" => Ok(Self::Completion),
            "recognition" => Ok(Self::Recognition),
            other => Err(DomainError::corrupt(format!(
                "unknown certificate type '{other}'"
            ))),
        }
    }
}

/// Validate a site certificate prefix: one or more ASCII uppercase letters
///
/// # Errors
///
/// Returns `DomainError::Invalid` if the prefix is empty or has other characters
pub fn validate_prefix(prefix: &str) -> DomainResult<()> {
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(DomainError::invalid(format!(
            "Certificate prefix '{prefix}' must be uppercase letters only"
        )));
    }
    Ok(())
}

/// Certificate number `PREFIX-YYYYMMDD-SERIAL`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CertificateNumber {
    prefix: String,
    issued_on: NaiveDate,
    serial: u32,
}

impl CertificateNumber {
    /// Build a number for the `serial`-th certificate of `prefix` on `issued_on`
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Invalid` for a bad prefix or a serial outside `1..=9999`
    pub fn new(prefix: &str, issued_on: NaiveDate, serial: u32) -> DomainResult<Self> {
        validate_prefix(prefix)?;
        if serial == 0 || serial > MAX_SERIAL {
            return Err(DomainError::invalid(format!(
                "Certificate serial {serial} is out of range"
            )));
        }
        Ok(Self {
            prefix: prefix.to_owned(),
            issued_on,
            serial,
        })
    }

    /// `LIKE` pattern matching every number of `prefix` issued on `day`
    #[must_use]
    pub fn day_pattern(prefix: &str, day: NaiveDate) -> String {
        format!("{prefix}-{}-%", day.format("%Y%m%d"))
    }

    /// Issuing site's prefix
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Day of issuance
    #[must_use]
    pub const fn issued_on(&self) -> NaiveDate {
        self.issued_on
    }

    /// Serial within the prefix and day
    #[must_use]
    pub const fn serial(&self) -> u32 {
        self.serial
    }
}

impl fmt::Display for CertificateNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:03}",
            self.prefix,
            self.issued_on.format("%Y%m%d"),
            self.serial
        )
    }
}

impl FromStr for CertificateNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DomainError::invalid(format!("Malformed certificate number '{s}'"));

        let mut parts = s.split('-');
        let (Some(prefix), Some(date), Some(serial), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        if !(3..=4).contains(&serial.len()) || !serial.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let issued_on = NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| malformed())?;
        let serial: u32 = serial.parse().map_err(|_| malformed())?;
        Self::new(prefix, issued_on, serial).map_err(|_| malformed())
    }
}
