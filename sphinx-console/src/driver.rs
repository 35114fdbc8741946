//! Timer driver for the reveal machine
//!
//! Bridges the pure state machine to real time: every `StartTimer` effect
//! becomes a sleeping tokio task whose expiry is sent back over a channel
//! and drained by [`RevealDriver::pump`] from the TUI tick loop.
//!
//! Timer sends are tagged with a session generation. [`RevealDriver::abort`]
//! bumps the generation, so a timer armed before a reset can never move
//! the machine of a later session, and dropping the driver closes the
//! channel entirely.

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

use tokio::runtime::Handle;

use sphinx_protocol::reveal::{RevealEffect, RevealEvent, RevealMachine, TimerKind};
use sphinx_protocol::stage::StageKey;

/// Display-worthy outcomes forwarded to the session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealNote {
    StageEntered(StageKey),
    AwaitingConsent,
    ConsentRecorded,
    Completed,
}

pub struct RevealDriver {
    machine: RevealMachine,
    generation: u64,
    tx: Sender<(u64, RevealEvent)>,
    rx: Receiver<(u64, RevealEvent)>,
    handle: Handle,
}

impl RevealDriver {
    /// Create a driver for a freshly supplied analysis and start the
    /// reveal immediately.
    pub fn start(handle: Handle) -> (Self, Vec<RevealNote>) {
        let (tx, rx) = channel();
        let mut driver = Self {
            machine: RevealMachine::new(),
            generation: 0,
            tx,
            rx,
            handle,
        };
        let notes = driver.apply(RevealEvent::Begin);
        (driver, notes)
    }

    pub fn machine(&self) -> &RevealMachine {
        &self.machine
    }

    /// Drain timer expiries delivered since the last tick.
    pub fn pump(&mut self) -> Vec<RevealNote> {
        let mut notes = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok((generation, event)) if generation == self.generation => {
                    notes.extend(self.apply(event));
                }
                // Stale send from an aborted schedule
                Ok(_) => {}
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        notes
    }

    /// Resolve the consent gate. The machine ignores this outside the
    /// paused state.
    pub fn grant_consent(&mut self) -> Vec<RevealNote> {
        self.apply(RevealEvent::ConsentGranted)
    }

    /// Invalidate every outstanding timer before teardown.
    pub fn abort(&mut self) {
        self.generation += 1;
    }

    fn apply(&mut self, event: RevealEvent) -> Vec<RevealNote> {
        let mut notes = Vec::new();
        for effect in self.machine.handle(event) {
            match effect {
                RevealEffect::StartTimer(kind) => self.schedule(kind),
                RevealEffect::StageEntered(stage) => notes.push(RevealNote::StageEntered(stage)),
                RevealEffect::AwaitConsent => notes.push(RevealNote::AwaitingConsent),
                RevealEffect::ConsentRecorded => notes.push(RevealNote::ConsentRecorded),
                RevealEffect::Completed => notes.push(RevealNote::Completed),
            }
        }
        notes
    }

    fn schedule(&self, kind: TimerKind) {
        let tx = self.tx.clone();
        let generation = self.generation;
        self.handle.spawn(async move {
            tokio::time::sleep(kind.duration()).await;
            // The receiver may be gone after a session reset.
            let _ = tx.send((generation, kind.expiry_event()));
        });
    }

    /// Deliver an event through the same channel the timers use.
    #[cfg(test)]
    pub(crate) fn inject(&self, event: RevealEvent) {
        let _ = self.tx.send((self.generation, event));
    }

    /// Deliver an event tagged with a superseded generation.
    #[cfg(test)]
    pub(crate) fn inject_stale(&self, event: RevealEvent) {
        let _ = self.tx.send((self.generation.wrapping_sub(1), event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sphinx_protocol::reveal::RevealState;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Runtime::new().expect("test runtime")
    }

    #[test]
    fn test_start_enters_the_first_stage() {
        let rt = runtime();
        let (driver, notes) = RevealDriver::start(rt.handle().clone());
        assert_eq!(notes, vec![RevealNote::StageEntered(StageKey::Scrutinize)]);
        assert_eq!(driver.machine().state(), RevealState::HandoffAnimating(0));
    }

    #[test]
    fn test_pump_applies_injected_expiries_in_order() {
        let rt = runtime();
        let (mut driver, _) = RevealDriver::start(rt.handle().clone());
        driver.inject(RevealEvent::HandoffElapsed);
        driver.inject(RevealEvent::StepElapsed);
        let notes = driver.pump();
        assert_eq!(notes, vec![RevealNote::StageEntered(StageKey::Probe)]);
        assert_eq!(driver.machine().state(), RevealState::HandoffAnimating(1));
    }

    #[test]
    fn test_aborted_generation_discards_outstanding_timers() {
        let rt = runtime();
        let (mut driver, _) = RevealDriver::start(rt.handle().clone());
        driver.abort();
        // Events armed under the old generation arrive after the reset.
        driver.inject_stale(RevealEvent::StepElapsed);
        driver.inject_stale(RevealEvent::StepElapsed);
        let notes = driver.pump();
        assert!(notes.is_empty());
        assert_eq!(driver.machine().state(), RevealState::HandoffAnimating(0));
    }

    #[test]
    fn test_consent_gate_reached_through_the_driver() {
        let rt = runtime();
        let (mut driver, _) = RevealDriver::start(rt.handle().clone());
        for _ in 0..3 {
            driver.inject(RevealEvent::StepElapsed);
        }
        let notes = driver.pump();
        assert!(notes.contains(&RevealNote::AwaitingConsent));
        assert!(driver.machine().is_paused_for_consent());

        let notes = driver.grant_consent();
        assert_eq!(
            notes,
            vec![
                RevealNote::ConsentRecorded,
                RevealNote::StageEntered(StageKey::Investigate)
            ]
        );
    }
}
