// ABOUTME: Subcommand implementations for lms-cli
// ABOUTME: Each module prints a human-readable summary of the operation it runs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod retrain;
pub mod sites;
pub mod sync;
