// ABOUTME: Proctoring controller module: drives the pure state machine with real timers
// ABOUTME: Owns the countdown task and the presence monitor for one assessment session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Session controller with explicit start/stop lifecycle
pub mod session;

pub use lms_core::proctoring::{
    ProctoringMachine, ProctoringState, Signal, Signals, COUNTDOWN_SECONDS,
};
pub use session::{PresenceMonitor, ProctoringSession, RestartHandler};
