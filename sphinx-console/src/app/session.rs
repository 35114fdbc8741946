//! Session operations: framework selection, query submission, the
//! processing hand-over to the reveal driver, consent, and reset.

use std::sync::mpsc::{channel, TryRecvError};

use sphinx_protocol::artifact::{render_artifact, ArtifactMeta};
use sphinx_protocol::audit::Actor;
use sphinx_protocol::framework::{FrameworkDefinition, FrameworkId};
use sphinx_protocol::stage::agent_for;

use crate::driver::{RevealDriver, RevealNote};
use crate::gateway;

use super::{App, ArtifactState, Phase};

const LOGGED_QUERY_LEN: usize = 60;

impl App {
    pub fn selected_framework(&self) -> Option<&FrameworkDefinition> {
        self.framework.map(|id| self.catalog.get(id))
    }

    /// Selection → Input.
    pub fn select_framework(&mut self, id: FrameworkId) {
        self.framework = Some(id);
        self.phase = Phase::Input;
        self.error = None;
        let name = self.catalog.get(id).name.clone();
        self.audit.append(
            Actor::User,
            "Framework Selection",
            Some(format!("Selected Framework: {}", name)),
        );
    }

    /// Copy the next sample query into the editor.
    pub fn cycle_sample(&mut self) {
        let Some(framework) = self.selected_framework() else {
            return;
        };
        let samples = framework.sample_queries.clone();
        if samples.is_empty() {
            return;
        }
        let idx = self.sample_cursor % samples.len();
        self.query = samples[idx].clone();
        self.sample_cursor = idx + 1;
    }

    /// Cycle a previously submitted query into the editor.
    pub fn recall_recent(&mut self) {
        if self.history.recent.is_empty() {
            return;
        }
        let idx = self.history_cursor % self.history.recent.len();
        self.query = self.history.recent[idx].clone();
        self.history_cursor = idx + 1;
    }

    /// Input → Processing, via the gateway.
    ///
    /// Empty queries never dispatch, and only one request may be in
    /// flight per session; the submit affordance is disabled while one is
    /// outstanding.
    pub fn submit_query(&mut self) {
        if self.phase != Phase::Input || self.request_in_flight {
            return;
        }
        let Some(id) = self.framework else {
            return;
        };
        let trimmed = self.query.trim().to_string();
        if trimmed.is_empty() {
            return;
        }
        let Some(backend) = self.backend.clone() else {
            self.error = Some(format!(
                "{} is not set; the generator cannot be reached.",
                gateway::API_KEY_VAR
            ));
            return;
        };

        self.error = None;
        self.request_in_flight = true;

        let logged: String = if trimmed.chars().count() > LOGGED_QUERY_LEN {
            let head: String = trimmed.chars().take(LOGGED_QUERY_LEN).collect();
            format!("{}...", head)
        } else {
            trimmed.clone()
        };
        self.audit.append(
            Actor::User,
            "Protocol Initiated",
            Some(format!("Query submitted: \"{}\"", logged)),
        );
        self.audit.append(
            Actor::System,
            "Orchestration Started",
            Some("Dispatching query to multi-model agent swarm".to_string()),
        );

        let framework = self.catalog.get(id).clone();
        let (tx, rx) = channel();
        self.gateway_rx = Some(rx);
        self.tokio_runtime.spawn(async move {
            let outcome = gateway::request_analysis(backend.as_ref(), &trimmed, &framework).await;
            let _ = tx.send(outcome);
        });
    }

    /// Resolve the consent gate; ignored unless the reveal is paused.
    pub fn grant_consent(&mut self) {
        let notes = self
            .reveal
            .as_mut()
            .map(|driver| driver.grant_consent())
            .unwrap_or_default();
        self.handle_notes(notes);
    }

    /// Return to Selection from any phase, discarding all session state.
    ///
    /// Aborting the driver invalidates its outstanding timers before the
    /// driver itself is dropped, so nothing armed in this session can
    /// touch the next one.
    pub fn reset(&mut self) {
        if let Some(driver) = self.reveal.as_mut() {
            driver.abort();
        }
        self.reveal = None;
        self.gateway_rx = None;
        self.request_in_flight = false;
        self.framework = None;
        self.query.clear();
        self.analysis = None;
        self.error = None;
        self.artifact = None;
        self.sample_cursor = 0;
        self.history_cursor = 0;
        self.status_line = None;
        self.phase = Phase::Selection;
        self.audit.append(
            Actor::User,
            "Reset",
            Some("Session cleared. Ready for new inquiry.".to_string()),
        );
    }

    /// Drain async completions: at most one gateway outcome, plus any
    /// reveal timer expiries. Called once per TUI tick.
    pub fn poll_async(&mut self) {
        if let Some(rx) = &self.gateway_rx {
            match rx.try_recv() {
                Ok(outcome) => {
                    self.gateway_rx = None;
                    self.request_in_flight = false;
                    match outcome {
                        Ok(result) => {
                            self.history.remember(&self.query);
                            let _ = crate::utils::save_history(&self.history);
                            self.analysis = Some(result);
                            self.phase = Phase::Processing;
                            let (driver, notes) =
                                RevealDriver::start(self.tokio_runtime.handle().clone());
                            self.reveal = Some(driver);
                            self.handle_notes(notes);
                        }
                        Err(err) => {
                            // Stay in Input: the query is preserved and
                            // the session remains resubmittable.
                            let message = err.to_string();
                            self.audit.append(Actor::System, "Error", Some(message.clone()));
                            self.error = Some(message);
                        }
                    }
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    self.gateway_rx = None;
                    self.request_in_flight = false;
                }
            }
        }

        let notes = self
            .reveal
            .as_mut()
            .map(|driver| driver.pump())
            .unwrap_or_default();
        self.handle_notes(notes);
    }

    fn handle_notes(&mut self, notes: Vec<RevealNote>) {
        for note in notes {
            match note {
                RevealNote::StageEntered(stage) => {
                    let term = self
                        .selected_framework()
                        .map(|fw| fw.term_for(stage).to_string())
                        .unwrap_or_else(|| stage.title().to_string());
                    let agent = agent_for(stage);
                    self.audit.append(
                        Actor::Agent,
                        "Stage Entered",
                        Some(format!("{} via {}", term, agent.name)),
                    );
                }
                RevealNote::AwaitingConsent => {
                    let title = self
                        .selected_framework()
                        .map(|fw| fw.consent_title.clone());
                    self.audit.append(Actor::System, "Consent Requested", title);
                }
                RevealNote::ConsentRecorded => {
                    self.audit.append(
                        Actor::User,
                        "Consent Granted",
                        Some("Authorization to proceed recorded".to_string()),
                    );
                }
                RevealNote::Completed => {
                    self.phase = Phase::Complete;
                    self.audit.append(
                        Actor::System,
                        "Governance Cycle Complete",
                        Some("Handoff Oversight Block generated and sealed.".to_string()),
                    );
                    self.seal_artifact();
                }
            }
        }
    }

    /// Generate the artifact identity once, then render; re-renders of
    /// the same session are byte-identical.
    fn seal_artifact(&mut self) {
        if self.artifact.is_some() {
            return;
        }
        let (Some(result), Some(id)) = (self.analysis.as_ref(), self.framework) else {
            return;
        };
        let framework = self.catalog.get(id);
        let meta = ArtifactMeta::generate();
        let rendered = render_artifact(result, framework, self.query.trim(), &meta);
        self.artifact = Some(ArtifactState { meta, rendered });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::{fixture_json, StubBackend};
    use sphinx_protocol::reveal::RevealEvent;
    use std::sync::Arc;
    use std::time::Duration;

    const ICU_QUERY: &str =
        "Should a hospital allocate a single ICU bed between two critical patients?";

    fn app_with(backend: StubBackend) -> (App, Arc<StubBackend>) {
        let backend = Arc::new(backend);
        let app = App::with_backend(backend.clone(), std::env::temp_dir());
        (app, backend)
    }

    fn wait_for_gateway(app: &mut App) {
        for _ in 0..500 {
            app.poll_async();
            if !app.request_in_flight {
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("gateway request did not settle");
    }

    fn drive(app: &mut App, event: RevealEvent) {
        app.reveal.as_ref().expect("reveal running").inject(event);
        app.poll_async();
    }

    #[test]
    fn test_secular_icu_scenario_runs_to_sealed_artifact() {
        let (mut app, _backend) = app_with(StubBackend::ok(fixture_json()));

        app.select_framework(FrameworkId::Secular);
        assert_eq!(app.phase, Phase::Input);

        app.query = ICU_QUERY.to_string();
        app.submit_query();
        assert!(app.request_in_flight);
        wait_for_gateway(&mut app);

        assert_eq!(app.phase, Phase::Processing);
        assert!(app.analysis.as_ref().unwrap().is_complete());

        // Scrutinize → Probe → Hypothesize, then the gate.
        for _ in 0..3 {
            drive(&mut app, RevealEvent::StepElapsed);
        }
        let machine = app.reveal.as_ref().unwrap().machine();
        assert!(machine.is_paused_for_consent());

        // Timer events cannot resolve the gate.
        drive(&mut app, RevealEvent::StepElapsed);
        assert!(app.reveal.as_ref().unwrap().machine().is_paused_for_consent());

        app.grant_consent();
        assert!(app.reveal.as_ref().unwrap().machine().consent_granted());

        // Investigate → Narrow → Execute → Complete.
        for _ in 0..3 {
            drive(&mut app, RevealEvent::StepElapsed);
        }
        drive(&mut app, RevealEvent::CompletionElapsed);

        assert_eq!(app.phase, Phase::Complete);
        let artifact = app.artifact.as_ref().expect("artifact sealed");
        assert!(artifact.rendered.contains("framework: Secular Humanist"));
        assert!(artifact.meta.id.starts_with("HOB-"));
        assert!(app.audit.verify());
        assert!(app
            .audit
            .entries()
            .iter()
            .any(|e| e.action == "Governance Cycle Complete"));
        assert_eq!(app.history.recent.first().map(String::as_str), Some(ICU_QUERY));
    }

    #[test]
    fn test_transport_failure_keeps_session_resubmittable() {
        let (mut app, backend) = app_with(StubBackend::failing("connection refused"));

        app.select_framework(FrameworkId::Christian);
        app.query = "A difficult question".to_string();
        app.submit_query();
        wait_for_gateway(&mut app);

        assert_eq!(app.phase, Phase::Input);
        assert!(app.error.as_ref().unwrap().contains("connection refused"));
        assert_eq!(app.query, "A difficult question");
        assert!(app.analysis.is_none());
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_empty_query_never_dispatches() {
        let (mut app, backend) = app_with(StubBackend::ok(fixture_json()));

        app.select_framework(FrameworkId::Secular);
        app.query = "   ".to_string();
        app.submit_query();

        assert!(!app.request_in_flight);
        assert_eq!(app.phase, Phase::Input);
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_duplicate_submission_is_prevented() {
        let (mut app, backend) = app_with(StubBackend::ok(fixture_json()));

        app.select_framework(FrameworkId::Secular);
        app.query = "one question".to_string();
        app.submit_query();
        app.submit_query();
        wait_for_gateway(&mut app);

        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_submission_without_framework_is_ignored() {
        let (mut app, backend) = app_with(StubBackend::ok(fixture_json()));
        app.phase = Phase::Input;
        app.query = "a question".to_string();
        app.submit_query();
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_missing_backend_surfaces_credential_error() {
        let mut app = App::build(None, std::env::temp_dir()).unwrap();
        app.select_framework(FrameworkId::Secular);
        app.query = "a question".to_string();
        app.submit_query();
        assert!(app.error.as_ref().unwrap().contains(gateway::API_KEY_VAR));
        assert_eq!(app.phase, Phase::Input);
    }

    #[test]
    fn test_reset_clears_session_state_from_processing() {
        let (mut app, _backend) = app_with(StubBackend::ok(fixture_json()));

        app.select_framework(FrameworkId::Jewish);
        app.query = "a question".to_string();
        app.submit_query();
        wait_for_gateway(&mut app);
        assert_eq!(app.phase, Phase::Processing);

        app.reset();
        assert_eq!(app.phase, Phase::Selection);
        assert!(app.framework.is_none());
        assert!(app.query.is_empty());
        assert!(app.analysis.is_none());
        assert!(app.error.is_none());
        assert!(app.artifact.is_none());
        assert!(app.reveal.is_none());
        assert!(!app.request_in_flight);
        assert!(app.audit.entries().iter().any(|e| e.action == "Reset"));
        assert!(app.audit.verify());
    }

    #[test]
    fn test_consent_outside_processing_is_harmless() {
        let (mut app, _backend) = app_with(StubBackend::ok(fixture_json()));
        app.grant_consent();
        assert_eq!(app.phase, Phase::Selection);
    }

    #[test]
    fn test_sample_and_history_recall_fill_the_editor() {
        let (mut app, _backend) = app_with(StubBackend::ok(fixture_json()));
        app.select_framework(FrameworkId::Secular);

        app.cycle_sample();
        let first = app.query.clone();
        assert!(!first.is_empty());
        app.cycle_sample();
        assert_ne!(app.query, first);

        app.history.remember("earlier question");
        app.recall_recent();
        assert_eq!(app.query, "earlier question");
    }
}
