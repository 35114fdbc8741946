//! Staged reveal state machine
//!
//! Drives the stage-by-stage disclosure of a completed analysis. All
//! timing lives outside: timer expiry and the consent grant both arrive
//! as [`RevealEvent`]s, and scheduling requests leave as
//! [`RevealEffect`]s. That keeps the machine pure and lets tests walk the
//! whole choreography without real timers.
//!
//! The single suspension point that is not time-bounded is the consent
//! gate at the Investigate stage: the machine blocks there until an
//! explicit [`RevealEvent::ConsentGranted`], exactly once per session.

use std::time::Duration;

use crate::stage::StageKey;

/// Timer classes the driver schedules on the machine's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Handoff transition animation window.
    Handoff,
    /// Full dwell for one stage, inclusive of the handoff window.
    Step,
    /// Delay before the one-shot completion signal.
    Completion,
}

impl TimerKind {
    pub fn duration(self) -> Duration {
        match self {
            TimerKind::Handoff => Duration::from_millis(1200),
            TimerKind::Step => Duration::from_millis(3500),
            TimerKind::Completion => Duration::from_millis(1000),
        }
    }

    /// The event the driver feeds back when this timer expires.
    pub fn expiry_event(self) -> RevealEvent {
        match self {
            TimerKind::Handoff => RevealEvent::HandoffElapsed,
            TimerKind::Step => RevealEvent::StepElapsed,
            TimerKind::Completion => RevealEvent::CompletionElapsed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Idle,
    /// Stage content disclosed, dwell timer running.
    Revealing(usize),
    /// Stage content disclosed, handoff overlay still up.
    HandoffAnimating(usize),
    /// Blocked at the consent gate; stage content not yet acted upon.
    PausedForConsent(usize),
    Complete,
}

/// Every input the machine reacts to, timers and user action alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealEvent {
    /// A complete analysis result became available.
    Begin,
    HandoffElapsed,
    StepElapsed,
    ConsentGranted,
    CompletionElapsed,
}

/// Outputs of a transition, handled by the owning driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealEffect {
    StartTimer(TimerKind),
    StageEntered(StageKey),
    /// The machine is now blocked on the consent gate.
    AwaitConsent,
    ConsentRecorded,
    /// One-shot completion signal; no further timers follow.
    Completed,
}

/// The reveal session's state machine.
///
/// Mutated only through [`RevealMachine::handle`]; events that are not
/// valid in the current state are ignored, so a stale timer from a
/// discarded schedule can never move the machine.
#[derive(Debug)]
pub struct RevealMachine {
    state: RevealState,
    consent_granted: bool,
}

impl RevealMachine {
    pub fn new() -> Self {
        Self {
            state: RevealState::Idle,
            consent_granted: false,
        }
    }

    pub fn state(&self) -> RevealState {
        self.state
    }

    pub fn consent_granted(&self) -> bool {
        self.consent_granted
    }

    pub fn is_paused_for_consent(&self) -> bool {
        matches!(self.state, RevealState::PausedForConsent(_))
    }

    pub fn is_handoff(&self) -> bool {
        matches!(self.state, RevealState::HandoffAnimating(_))
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, RevealState::Complete)
    }

    /// Highest stage index whose content is disclosed, if any.
    ///
    /// While paused for consent the gated stage's content is not yet
    /// disclosed: the gate strictly precedes acting on it.
    pub fn revealed_through(&self) -> Option<usize> {
        match self.state {
            RevealState::Idle => None,
            RevealState::Revealing(i) | RevealState::HandoffAnimating(i) => Some(i),
            RevealState::PausedForConsent(i) => i.checked_sub(1),
            RevealState::Complete => Some(StageKey::ALL.len() - 1),
        }
    }

    /// The stage currently in focus, if the reveal is underway.
    pub fn current_stage(&self) -> Option<StageKey> {
        match self.state {
            RevealState::Revealing(i)
            | RevealState::HandoffAnimating(i)
            | RevealState::PausedForConsent(i) => StageKey::from_index(i),
            _ => None,
        }
    }

    /// Single transition function over (state, event).
    pub fn handle(&mut self, event: RevealEvent) -> Vec<RevealEffect> {
        match (self.state, event) {
            (RevealState::Idle, RevealEvent::Begin) => self.enter_stage(0),
            (RevealState::HandoffAnimating(i), RevealEvent::HandoffElapsed) => {
                self.state = RevealState::Revealing(i);
                Vec::new()
            }
            (RevealState::HandoffAnimating(i), RevealEvent::StepElapsed)
            | (RevealState::Revealing(i), RevealEvent::StepElapsed) => {
                if i + 1 < StageKey::ALL.len() {
                    self.enter_stage(i + 1)
                } else {
                    self.state = RevealState::Complete;
                    vec![RevealEffect::StartTimer(TimerKind::Completion)]
                }
            }
            (RevealState::PausedForConsent(i), RevealEvent::ConsentGranted) => {
                self.consent_granted = true;
                let mut effects = vec![RevealEffect::ConsentRecorded];
                effects.extend(self.enter_stage(i));
                effects
            }
            (RevealState::Complete, RevealEvent::CompletionElapsed) => {
                vec![RevealEffect::Completed]
            }
            // Stale timers and out-of-order events carry no weight.
            _ => Vec::new(),
        }
    }

    fn enter_stage(&mut self, index: usize) -> Vec<RevealEffect> {
        if index == StageKey::CONSENT_STAGE.index() && !self.consent_granted {
            self.state = RevealState::PausedForConsent(index);
            return vec![RevealEffect::AwaitConsent];
        }

        let stage = StageKey::from_index(index).expect("stage index within protocol range");
        self.state = RevealState::HandoffAnimating(index);
        vec![
            RevealEffect::StageEntered(stage),
            RevealEffect::StartTimer(TimerKind::Handoff),
            RevealEffect::StartTimer(TimerKind::Step),
        ]
    }
}

impl Default for RevealMachine {
    fn default() -> Self {
        Self::new()
    }
}
