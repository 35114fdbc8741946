//! Session controller state

use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use sphinx_protocol::artifact::ArtifactMeta;
use sphinx_protocol::audit::AuditChain;
use sphinx_protocol::framework::{FrameworkCatalog, FrameworkId};
use sphinx_protocol::result::AnalysisResult;
use sphinx_protocol::ProtocolError;

use crate::driver::RevealDriver;
use crate::gateway::AnalysisBackend;

/// Overall application phase, linear with reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Selection,
    Input,
    Processing,
    Complete,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Selection => "Framework Selection",
            Phase::Input => "Protocol Input",
            Phase::Processing => "Governance Cycle",
            Phase::Complete => "Sealed",
        }
    }
}

/// The generated artifact, rendered once and then held fixed.
pub struct ArtifactState {
    pub meta: ArtifactMeta,
    pub rendered: String,
}

/// Recently submitted queries, persisted across sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryHistory {
    pub recent: Vec<String>,
}

const HISTORY_CAP: usize = 20;

impl QueryHistory {
    pub fn remember(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.recent.retain(|q| q != query);
        self.recent.insert(0, query.to_string());
        self.recent.truncate(HISTORY_CAP);
    }
}

/// Main application state.
///
/// Owns every piece of session-lifecycle state; the reveal driver owns
/// only its transient timing state and reports back through notes.
pub struct App {
    pub catalog: FrameworkCatalog,
    pub phase: Phase,
    pub should_quit: bool,

    // Selection view
    pub selected: usize,

    // Session-scoped state, cleared on reset
    pub framework: Option<FrameworkId>,
    pub query: String,
    pub analysis: Option<AnalysisResult>,
    pub error: Option<String>,
    pub artifact: Option<ArtifactState>,
    pub reveal: Option<RevealDriver>,

    // Input helpers
    pub sample_cursor: usize,
    pub history_cursor: usize,
    pub history: QueryHistory,

    // Audit log
    pub audit: AuditChain,
    pub show_audit: bool,

    // Export
    pub output_dir: PathBuf,
    pub status_line: Option<String>,

    // Async plumbing
    pub request_in_flight: bool,
    pub(crate) gateway_rx: Option<Receiver<Result<AnalysisResult, ProtocolError>>>,
    pub(crate) backend: Option<Arc<dyn AnalysisBackend>>,
    pub(crate) tokio_runtime: tokio::runtime::Runtime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_remembers_most_recent_first() {
        let mut history = QueryHistory::default();
        history.remember("first");
        history.remember("second");
        assert_eq!(history.recent, vec!["second", "first"]);
    }

    #[test]
    fn test_history_dedupes_and_ignores_blank() {
        let mut history = QueryHistory::default();
        history.remember("same");
        history.remember("   ");
        history.remember("same");
        assert_eq!(history.recent, vec!["same"]);
    }

    #[test]
    fn test_history_is_capped() {
        let mut history = QueryHistory::default();
        for i in 0..30 {
            history.remember(&format!("query {}", i));
        }
        assert_eq!(history.recent.len(), 20);
        assert_eq!(history.recent[0], "query 29");
    }
}
