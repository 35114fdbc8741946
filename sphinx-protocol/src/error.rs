//! Error taxonomy for the protocol library

use thiserror::Error;

/// Errors surfaced by the protocol core and the analysis gateway.
///
/// `AnalysisUnavailable` is the only variant shown to users verbatim; the
/// gateway folds every other failure class into it with a displayable
/// message before it reaches the session controller.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The generator could not produce a usable analysis. Carries a
    /// message suitable for direct display in the input view.
    #[error("{message}")]
    AnalysisUnavailable { message: String },

    /// The generator answered, but the structured response is missing
    /// required fields or has the wrong shape.
    #[error("generator response is malformed: {detail}")]
    MalformedResponse { detail: String },

    /// A framework id outside the fixed catalog was requested.
    #[error("unknown framework id: {0}")]
    UnknownFramework(String),
}

impl ProtocolError {
    /// Convenience constructor for gateway-level failures.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::AnalysisUnavailable {
            message: message.into(),
        }
    }

    /// Convenience constructor for ingestion shape violations.
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            detail: detail.into(),
        }
    }
}
