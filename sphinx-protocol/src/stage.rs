//! Protocol stages and agent attribution
//!
//! The six stages are ordered and the order is semantically meaningful:
//! later stages are only reachable after earlier ones complete, and the
//! Investigate stage is the designated consent gate.

use serde::{Deserialize, Serialize};

/// One of the six fixed protocol stages, in reveal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKey {
    Scrutinize,
    Probe,
    Hypothesize,
    Investigate,
    Narrow,
    Execute,
}

impl StageKey {
    /// All stages in protocol order.
    pub const ALL: [StageKey; 6] = [
        StageKey::Scrutinize,
        StageKey::Probe,
        StageKey::Hypothesize,
        StageKey::Investigate,
        StageKey::Narrow,
        StageKey::Execute,
    ];

    /// The single stage at which the reveal pauses for explicit consent.
    pub const CONSENT_STAGE: StageKey = StageKey::Investigate;

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<StageKey> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Option<StageKey> {
        Self::from_index(self.index() + 1)
    }

    /// Wire/display key, matches the generator's response fields.
    pub fn as_str(self) -> &'static str {
        match self {
            StageKey::Scrutinize => "scrutinize",
            StageKey::Probe => "probe",
            StageKey::Hypothesize => "hypothesize",
            StageKey::Investigate => "investigate",
            StageKey::Narrow => "narrow",
            StageKey::Execute => "execute",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            StageKey::Scrutinize => "Scrutinize",
            StageKey::Probe => "Probe",
            StageKey::Hypothesize => "Hypothesize",
            StageKey::Investigate => "Investigate",
            StageKey::Narrow => "Narrow",
            StageKey::Execute => "Execute",
        }
    }

    /// The acronym letter shown on the stage rail.
    pub fn letter(self) -> char {
        match self {
            StageKey::Scrutinize => 'S',
            StageKey::Probe => 'P',
            StageKey::Hypothesize => 'H',
            StageKey::Investigate => 'I',
            StageKey::Narrow => 'N',
            StageKey::Execute => 'X',
        }
    }
}

/// Display identity attached to a stage result.
///
/// Cosmetic metadata only; carries no behavioral weight besides display
/// and the agent lines in the exported artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAttribution {
    pub name: String,
    pub provider: String,
    pub role: String,
    /// Display accent, mapped to a terminal color by the UI.
    pub accent: String,
}

impl AgentAttribution {
    fn new(name: &str, provider: &str, role: &str, accent: &str) -> Self {
        Self {
            name: name.to_string(),
            provider: provider.to_string(),
            role: role.to_string(),
            accent: accent.to_string(),
        }
    }

    /// `Name (Provider)` form used by the artifact chain block.
    pub fn labelled(&self) -> String {
        format!("{} ({})", self.name, self.provider)
    }
}

/// Fixed one-to-one stage to agent mapping.
///
/// Simulates the multi-model orchestration layer: the mapping is static
/// and never influenced by the generator's response.
pub fn agent_for(stage: StageKey) -> AgentAttribution {
    match stage {
        StageKey::Scrutinize => {
            AgentAttribution::new("Claude 3.5 Sonnet", "Anthropic", "Strategic Analysis", "orange")
        }
        StageKey::Probe => {
            AgentAttribution::new("Gemini 1.5 Pro", "Google", "Evidence Verification", "blue")
        }
        StageKey::Hypothesize => {
            AgentAttribution::new("GPT-4o", "OpenAI", "Reasoning Engine", "green")
        }
        StageKey::Investigate => {
            AgentAttribution::new("Claude 3 Opus", "Anthropic", "Ethical Alignment", "purple")
        }
        StageKey::Narrow => AgentAttribution::new("Llama 3 70B", "Meta", "Synthesis", "indigo"),
        StageKey::Execute => {
            AgentAttribution::new("Human Operator", "S.P.H.I.N.X.", "Final Authority", "gold")
        }
    }
}
