// ABOUTME: Pure proctoring state machine for one assessment session
// ABOUTME: Combines face, tab-focus and mouse signals into compliant/warning/paused/failed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Proctoring state machine
//!
//! The machine is inactive until the learner acknowledges the rules. After
//! that, any compliance signal dropping from `true` to `false` enters
//! [`ProctoringState::Warning`] with a fresh countdown. Restoring all three
//! signals during a warning pauses the session; only an explicit resume
//! acknowledgment returns it to [`ProctoringState::Compliant`]. A countdown
//! reaching zero fails the session, which is terminal.
//!
//! The machine owns no timers. It returns [`ProctoringEffect`]s that the
//! caller executes (start/cancel the 1-second countdown, restart the attempt).

use serde::{Deserialize, Serialize};

/// Countdown length in one-second ticks
pub const COUNTDOWN_SECONDS: u8 = 10;

/// One of the three independent compliance signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// A face is visible in the webcam stream
    FaceVisible,
    /// The assessment tab has focus
    TabFocused,
    /// The mouse pointer is inside the page
    MouseInPage,
}

/// Latest sampled value of every signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    /// Face visible
    pub face_visible: bool,
    /// Tab focused
    pub tab_focused: bool,
    /// Mouse in page
    pub mouse_in_page: bool,
}

impl Default for Signals {
    fn default() -> Self {
        Self {
            face_visible: true,
            tab_focused: true,
            mouse_in_page: true,
        }
    }
}

impl Signals {
    /// All three signals are true
    #[must_use]
    pub const fn all_compliant(&self) -> bool {
        self.face_visible && self.tab_focused && self.mouse_in_page
    }

    /// Current value of one signal
    #[must_use]
    pub const fn get(&self, signal: Signal) -> bool {
        match signal {
            Signal::FaceVisible => self.face_visible,
            Signal::TabFocused => self.tab_focused,
            Signal::MouseInPage => self.mouse_in_page,
        }
    }

    /// Set one signal and return its previous value
    pub fn set(&mut self, signal: Signal, value: bool) -> bool {
        let slot = match signal {
            Signal::FaceVisible => &mut self.face_visible,
            Signal::TabFocused => &mut self.tab_focused,
            Signal::MouseInPage => &mut self.mouse_in_page,
        };
        std::mem::replace(slot, value)
    }
}

/// Observable proctoring state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProctoringState {
    /// Rules not yet acknowledged
    Inactive,
    /// All signals fine
    Compliant,
    /// A signal dropped; the countdown is running
    Warning {
        /// Seconds left before the session fails
        remaining: u8,
    },
    /// Compliance restored; waiting for the learner to resume
    Paused,
    /// Countdown expired; the attempt must restart from scratch
    Failed,
}

/// Inputs accepted by the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProctoringEvent {
    /// Learner accepted the proctoring rules
    RulesAcknowledged,
    /// A signal was sampled
    SignalChanged {
        /// Which signal
        signal: Signal,
        /// Sampled value
        value: bool,
    },
    /// One second elapsed on the countdown
    Tick,
    /// Learner pressed "I Understand, Resume"
    ResumeAcknowledged,
}

/// Side effects the caller must perform after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProctoringEffect {
    /// (Re)start the countdown timer, replacing any running one
    StartCountdown,
    /// Stop the countdown timer
    CancelCountdown,
    /// Hard-restart the assessment attempt, discarding unsaved answers
    RestartAttempt,
}

/// Proctoring state machine
#[derive(Debug, Clone)]
pub struct ProctoringMachine {
    state: ProctoringState,
    signals: Signals,
    countdown_seconds: u8,
}

impl Default for ProctoringMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProctoringMachine {
    /// Create an inactive machine with the standard countdown
    #[must_use]
    pub fn new() -> Self {
        Self::with_countdown(COUNTDOWN_SECONDS)
    }

    /// Create an inactive machine with a custom countdown length (at least 1)
    #[must_use]
    pub fn with_countdown(countdown_seconds: u8) -> Self {
        Self {
            state: ProctoringState::Inactive,
            signals: Signals::default(),
            countdown_seconds: countdown_seconds.max(1),
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> ProctoringState {
        self.state
    }

    /// Latest signal values
    #[must_use]
    pub const fn signals(&self) -> Signals {
        self.signals
    }

    /// Terminal failure reached
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.state, ProctoringState::Failed)
    }

    /// Apply one event and return the effects to execute
    pub fn handle(&mut self, event: ProctoringEvent) -> Vec<ProctoringEffect> {
        if self.is_failed() {
            return Vec::new();
        }

        match event {
            ProctoringEvent::RulesAcknowledged => self.on_rules_acknowledged(),
            ProctoringEvent::SignalChanged { signal, value } => self.on_signal(signal, value),
            ProctoringEvent::Tick => self.on_tick(),
            ProctoringEvent::ResumeAcknowledged => self.on_resume(),
        }
    }

    fn enter_warning(&mut self) -> Vec<ProctoringEffect> {
        self.state = ProctoringState::Warning {
            remaining: self.countdown_seconds,
        };
        vec![ProctoringEffect::StartCountdown]
    }

    fn on_rules_acknowledged(&mut self) -> Vec<ProctoringEffect> {
        if self.state != ProctoringState::Inactive {
            return Vec::new();
        }
        if self.signals.all_compliant() {
            self.state = ProctoringState::Compliant;
            Vec::new()
        } else {
            self.enter_warning()
        }
    }

    fn on_signal(&mut self, signal: Signal, value: bool) -> Vec<ProctoringEffect> {
        let previous = self.signals.set(signal, value);

        match self.state {
            ProctoringState::Compliant | ProctoringState::Warning { .. } if previous && !value => {
                self.enter_warning()
            }
            ProctoringState::Warning { .. } if value && self.signals.all_compliant() => {
                self.state = ProctoringState::Paused;
                vec![ProctoringEffect::CancelCountdown]
            }
            // Paused: drops are only recorded; the resume step evaluates them.
            _ => Vec::new(),
        }
    }

    fn on_tick(&mut self) -> Vec<ProctoringEffect> {
        let ProctoringState::Warning { remaining } = self.state else {
            return Vec::new();
        };

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            self.state = ProctoringState::Failed;
            vec![
                ProctoringEffect::CancelCountdown,
                ProctoringEffect::RestartAttempt,
            ]
        } else {
            self.state = ProctoringState::Warning { remaining };
            Vec::new()
        }
    }

    fn on_resume(&mut self) -> Vec<ProctoringEffect> {
        if self.state != ProctoringState::Paused {
            return Vec::new();
        }
        if self.signals.all_compliant() {
            self.state = ProctoringState::Compliant;
            Vec::new()
        } else {
            self.enter_warning()
        }
    }
}
