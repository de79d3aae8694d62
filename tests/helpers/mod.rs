// ABOUTME: Test helper modules shared by integration tests
// ABOUTME: Currently the axum request builder
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod axum_test;
