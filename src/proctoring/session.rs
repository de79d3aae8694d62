// ABOUTME: Proctoring session: one countdown task, one presence monitor, one restart callback
// ABOUTME: Executes the effects returned by the state machine; stop() releases everything
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Proctoring session
//!
//! [`ProctoringSession`] is the single owner of every resource a proctored
//! assessment holds: the presence monitor (camera and face-detection loop)
//! and the 1-second countdown task. The pure [`ProctoringMachine`] decides
//! transitions; the session executes the resulting effects. At most one
//! countdown task exists at any time, and it is aborted on every transition
//! out of `warning`.
//!
//! Callbacks (monitor start/stop, attempt restart) always run after the
//! internal lock is released.

use crate::errors::{AppError, AppResult};
use lms_core::proctoring::{
    ProctoringEffect, ProctoringEvent, ProctoringMachine, ProctoringState, Signal, Signals,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Countdown tick period
const TICK: Duration = Duration::from_secs(1);

/// Presence source (camera stream plus face-detection loop)
///
/// `start` acquires the underlying device; `stop` must release it and may be
/// called more than once.
pub trait PresenceMonitor: Send + Sync {
    /// Acquire the device and begin sampling
    fn start(&self);
    /// Stop sampling and release the device
    fn stop(&self);
}

/// Callback that hard-restarts the assessment attempt
pub type RestartHandler = Arc<dyn Fn() + Send + Sync>;

struct SessionState {
    machine: ProctoringMachine,
    countdown: Option<JoinHandle<()>>,
    generation: u64,
    running: bool,
    stopped: bool,
}

struct Shared {
    state: Mutex<SessionState>,
    monitor: Option<Arc<dyn PresenceMonitor>>,
    on_restart: RestartHandler,
    runtime: Handle,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Follow-up work collected under the lock and run after it is released
#[derive(Default)]
struct Deferred {
    restart: bool,
}

/// Controller for one proctored assessment session
pub struct ProctoringSession {
    shared: Arc<Shared>,
}

impl ProctoringSession {
    /// Create an idle session bound to the current Tokio runtime
    ///
    /// # Errors
    ///
    /// Returns an internal error when called outside a Tokio runtime
    pub fn new(
        monitor: Option<Arc<dyn PresenceMonitor>>,
        on_restart: RestartHandler,
    ) -> AppResult<Self> {
        Self::with_machine(ProctoringMachine::new(), monitor, on_restart)
    }

    /// Create an idle session around a preconfigured machine
    ///
    /// # Errors
    ///
    /// Returns an internal error when called outside a Tokio runtime
    pub fn with_machine(
        machine: ProctoringMachine,
        monitor: Option<Arc<dyn PresenceMonitor>>,
        on_restart: RestartHandler,
    ) -> AppResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| AppError::internal(format!("Proctoring needs a Tokio runtime: {e}")))?;
        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState {
                    machine,
                    countdown: None,
                    generation: 0,
                    running: false,
                    stopped: false,
                }),
                monitor,
                on_restart,
                runtime,
            }),
        })
    }

    /// Acquire the presence monitor. Idempotent.
    pub fn start(&self) {
        {
            let mut state = self.shared.lock();
            if state.running || state.stopped || state.machine.is_failed() {
                return;
            }
            state.running = true;
        }
        if let Some(monitor) = &self.shared.monitor {
            monitor.start();
        }
        info!("Proctoring session started");
    }

    /// Learner accepted the proctoring rules
    pub fn acknowledge_rules(&self) -> ProctoringState {
        dispatch(&self.shared, ProctoringEvent::RulesAcknowledged)
    }

    /// A presence signal was sampled
    pub fn report_signal(&self, signal: Signal, value: bool) -> ProctoringState {
        dispatch(&self.shared, ProctoringEvent::SignalChanged { signal, value })
    }

    /// Learner pressed resume after a pause
    pub fn acknowledge_resume(&self) -> ProctoringState {
        dispatch(&self.shared, ProctoringEvent::ResumeAcknowledged)
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> ProctoringState {
        self.shared.lock().machine.state()
    }

    /// Latest signal values
    #[must_use]
    pub fn signals(&self) -> Signals {
        self.shared.lock().machine.signals()
    }

    /// Whether a countdown task is live
    #[must_use]
    pub fn countdown_active(&self) -> bool {
        self.shared
            .lock()
            .countdown
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Cancel the countdown and release the presence monitor. Idempotent.
    ///
    /// A stopped session is torn down for good: later events leave the state
    /// unchanged and never start a countdown.
    pub fn stop(&self) {
        release(&self.shared);
    }
}

impl Drop for ProctoringSession {
    fn drop(&mut self) {
        release(&self.shared);
    }
}

fn release(shared: &Shared) {
    let was_running = {
        let mut state = shared.lock();
        if let Some(task) = state.countdown.take() {
            task.abort();
        }
        state.stopped = true;
        std::mem::replace(&mut state.running, false)
    };
    if was_running {
        if let Some(monitor) = &shared.monitor {
            monitor.stop();
        }
        info!("Proctoring session stopped");
    }
}

fn dispatch(shared: &Arc<Shared>, event: ProctoringEvent) -> ProctoringState {
    dispatch_from(shared, event, None).unwrap_or_else(|| shared.lock().machine.state())
}

/// Handle an event; `countdown` is the generation of the task sending a tick,
/// and ticks from a replaced task are dropped
fn dispatch_from(
    shared: &Arc<Shared>,
    event: ProctoringEvent,
    countdown: Option<u64>,
) -> Option<ProctoringState> {
    let (deferred, state) = {
        let mut guard = shared.lock();
        if countdown.is_some_and(|generation| generation != guard.generation) {
            return None;
        }
        if guard.stopped {
            debug!(?event, "Proctoring session stopped, event ignored");
            return Some(guard.machine.state());
        }
        let effects = guard.machine.handle(event);
        let deferred = apply_effects(shared, &mut guard, &effects);
        (deferred, guard.machine.state())
    };
    debug!(?event, ?state, "Proctoring event handled");

    if deferred.restart {
        warn!("Proctoring countdown expired, restarting attempt");
        release(shared);
        (shared.on_restart)();
    }
    Some(state)
}

fn apply_effects(
    shared: &Arc<Shared>,
    state: &mut SessionState,
    effects: &[ProctoringEffect],
) -> Deferred {
    let mut deferred = Deferred::default();
    for effect in effects {
        match effect {
            ProctoringEffect::StartCountdown => {
                if let Some(previous) = state.countdown.take() {
                    previous.abort();
                }
                state.generation += 1;
                state.countdown = Some(spawn_countdown(shared, state.generation));
            }
            ProctoringEffect::CancelCountdown => {
                if let Some(task) = state.countdown.take() {
                    task.abort();
                }
            }
            ProctoringEffect::RestartAttempt => deferred.restart = true,
        }
    }
    deferred
}

fn spawn_countdown(shared: &Arc<Shared>, generation: u64) -> JoinHandle<()> {
    let weak = Arc::downgrade(shared);
    shared.runtime.spawn(async move {
        let mut ticks = interval_at(Instant::now() + TICK, TICK);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticks.tick().await;
            let Some(shared) = weak.upgrade() else {
                return;
            };
            match dispatch_from(&shared, ProctoringEvent::Tick, Some(generation)) {
                Some(ProctoringState::Warning { .. }) => {}
                _ => return,
            }
        }
    })
}
