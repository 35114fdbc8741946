//! Application state and session lifecycle
//!
//! The App struct is the single owner of all session-scoped state; the
//! reveal driver and the gateway report back through channels drained by
//! [`App::poll_async`] each tick.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use sphinx_protocol::audit::{Actor, AuditChain};
use sphinx_protocol::framework::{FrameworkCatalog, FrameworkId};

use crate::gateway::{AnalysisBackend, GeminiBackend};

mod models;
mod session;

pub use models::*;

impl App {
    pub fn new(output_dir: PathBuf, preselect: Option<FrameworkId>) -> Result<Self> {
        let backend = GeminiBackend::from_env()
            .ok()
            .map(|b| Arc::new(b) as Arc<dyn AnalysisBackend>);
        let mut app = Self::build(backend, output_dir)?;
        app.history = crate::utils::load_history();
        if let Some(id) = preselect {
            app.select_framework(id);
        }
        Ok(app)
    }

    fn build(backend: Option<Arc<dyn AnalysisBackend>>, output_dir: PathBuf) -> Result<Self> {
        let tokio_runtime = tokio::runtime::Runtime::new()?;
        let mut audit = AuditChain::new();
        audit.append(
            Actor::System,
            "System Initialized",
            Some("SPHINX Governance Layer online".to_string()),
        );

        Ok(Self {
            catalog: FrameworkCatalog::load(),
            phase: Phase::Selection,
            should_quit: false,
            selected: 0,
            framework: None,
            query: String::new(),
            analysis: None,
            error: None,
            artifact: None,
            reveal: None,
            sample_cursor: 0,
            history_cursor: 0,
            history: QueryHistory::default(),
            audit,
            show_audit: true,
            output_dir,
            status_line: None,
            request_in_flight: false,
            gateway_rx: None,
            backend,
            tokio_runtime,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_backend(backend: Arc<dyn AnalysisBackend>, output_dir: PathBuf) -> Self {
        Self::build(Some(backend), output_dir).expect("test app")
    }
}
