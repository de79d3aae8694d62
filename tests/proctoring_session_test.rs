// ABOUTME: Tests for the proctoring session controller on a paused Tokio clock
// ABOUTME: Checks countdown expiry, pause and resume, and that stop releases every resource
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lms_server::proctoring::{
    PresenceMonitor, ProctoringMachine, ProctoringSession, ProctoringState, RestartHandler,
    Signal, COUNTDOWN_SECONDS,
};
use tokio::time::sleep;

#[derive(Default)]
struct CountingMonitor {
    started: AtomicUsize,
    stopped: AtomicUsize,
}

impl CountingMonitor {
    fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl PresenceMonitor for CountingMonitor {
    fn start(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    session: ProctoringSession,
    monitor: Arc<CountingMonitor>,
    restarts: Arc<AtomicUsize>,
}

impl Harness {
    fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

fn harness() -> Harness {
    let monitor = Arc::new(CountingMonitor::default());
    let restarts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&restarts);
    let on_restart: RestartHandler = Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let session = ProctoringSession::new(
        Some(Arc::clone(&monitor) as Arc<dyn PresenceMonitor>),
        on_restart,
    )
    .unwrap();
    session.start();
    Harness {
        session,
        monitor,
        restarts,
    }
}

fn secs(seconds: f64) -> Duration {
    Duration::from_secs_f64(seconds)
}

#[tokio::test(start_paused = true)]
async fn test_start_is_idempotent() {
    let h = harness();
    h.session.start();
    assert_eq!(h.monitor.started(), 1);
    assert_eq!(h.session.state(), ProctoringState::Inactive);
    assert_eq!(h.session.acknowledge_rules(), ProctoringState::Compliant);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_expiry_restarts_exactly_once() {
    let h = harness();
    h.session.acknowledge_rules();

    let state = h.session.report_signal(Signal::FaceVisible, false);
    assert_eq!(
        state,
        ProctoringState::Warning {
            remaining: COUNTDOWN_SECONDS
        }
    );
    assert!(h.session.countdown_active());

    sleep(secs(3.5)).await;
    assert_eq!(h.session.state(), ProctoringState::Warning { remaining: 7 });
    assert_eq!(h.restarts(), 0);

    sleep(secs(7.0)).await;
    assert_eq!(h.session.state(), ProctoringState::Failed);
    assert_eq!(h.restarts(), 1);
    assert_eq!(h.monitor.stopped(), 1);
    assert!(!h.session.countdown_active());

    // Failed is terminal
    sleep(secs(30.0)).await;
    assert_eq!(h.restarts(), 1);
    assert_eq!(
        h.session.report_signal(Signal::FaceVisible, true),
        ProctoringState::Failed
    );
    h.session.start();
    assert_eq!(h.monitor.started(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_recovery_pauses_until_resume() {
    let h = harness();
    h.session.acknowledge_rules();
    h.session.report_signal(Signal::TabFocused, false);
    sleep(secs(4.5)).await;

    let state = h.session.report_signal(Signal::TabFocused, true);
    assert_eq!(state, ProctoringState::Paused);
    assert!(!h.session.countdown_active());

    sleep(secs(60.0)).await;
    assert_eq!(h.session.state(), ProctoringState::Paused);
    assert_eq!(h.restarts(), 0);

    assert_eq!(h.session.acknowledge_resume(), ProctoringState::Compliant);
    assert!(h.session.signals().all_compliant());
}

#[tokio::test(start_paused = true)]
async fn test_resume_with_failing_signal_starts_full_countdown() {
    let h = harness();
    h.session.acknowledge_rules();
    h.session.report_signal(Signal::MouseInPage, false);
    h.session.report_signal(Signal::MouseInPage, true);
    // Dropped again while paused: recorded, no countdown yet
    assert_eq!(
        h.session.report_signal(Signal::FaceVisible, false),
        ProctoringState::Paused
    );
    assert!(!h.session.countdown_active());

    assert_eq!(
        h.session.acknowledge_resume(),
        ProctoringState::Warning {
            remaining: COUNTDOWN_SECONDS
        }
    );
    sleep(secs(10.5)).await;
    assert_eq!(h.session.state(), ProctoringState::Failed);
    assert_eq!(h.restarts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_new_drop_resets_countdown_without_double_ticks() {
    let h = harness();
    h.session.acknowledge_rules();
    h.session.report_signal(Signal::FaceVisible, false);
    sleep(secs(5.5)).await;
    assert_eq!(h.session.state(), ProctoringState::Warning { remaining: 5 });

    let state = h.session.report_signal(Signal::TabFocused, false);
    assert_eq!(state, ProctoringState::Warning { remaining: 10 });

    sleep(secs(9.5)).await;
    assert_eq!(h.session.state(), ProctoringState::Warning { remaining: 1 });
    assert_eq!(h.restarts(), 0);

    sleep(secs(1.0)).await;
    assert_eq!(h.session.state(), ProctoringState::Failed);
    assert_eq!(h.restarts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_countdown_and_releases_monitor() {
    let h = harness();
    h.session.acknowledge_rules();
    h.session.report_signal(Signal::FaceVisible, false);
    sleep(secs(2.5)).await;

    h.session.stop();
    assert!(!h.session.countdown_active());
    assert_eq!(h.monitor.stopped(), 1);

    sleep(secs(30.0)).await;
    assert_eq!(h.restarts(), 0);
    assert_eq!(h.session.state(), ProctoringState::Warning { remaining: 8 });

    h.session.stop();
    assert_eq!(h.monitor.stopped(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stopped_session_ignores_late_signals() {
    let h = harness();
    h.session.acknowledge_rules();
    h.session.stop();

    let state = h.session.report_signal(Signal::FaceVisible, false);
    assert_eq!(state, ProctoringState::Compliant);
    assert!(!h.session.countdown_active());

    sleep(secs(11.0)).await;
    assert_eq!(h.restarts(), 0);
    assert_eq!(h.session.state(), ProctoringState::Compliant);

    // No reacquiring the monitor after teardown
    h.session.start();
    assert_eq!(h.monitor.started(), 1);
    assert_eq!(h.monitor.stopped(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_drop_releases_session() {
    let h = harness();
    h.session.acknowledge_rules();
    h.session.report_signal(Signal::FaceVisible, false);

    let Harness {
        session,
        monitor,
        restarts,
    } = h;
    drop(session);
    assert_eq!(monitor.stopped(), 1);

    sleep(secs(30.0)).await;
    assert_eq!(restarts.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_custom_countdown_length() {
    let restarts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&restarts);
    let session = ProctoringSession::with_machine(
        ProctoringMachine::with_countdown(3),
        None,
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    )
    .unwrap();
    session.start();
    session.acknowledge_rules();
    assert_eq!(
        session.report_signal(Signal::FaceVisible, false),
        ProctoringState::Warning { remaining: 3 }
    );

    sleep(secs(3.5)).await;
    assert_eq!(session.state(), ProctoringState::Failed);
    assert_eq!(restarts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_session_requires_runtime() {
    let result = ProctoringSession::new(None, Arc::new(|| {}));
    assert!(result.is_err());
}
