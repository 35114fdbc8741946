//! Six-stage analysis result model
//!
//! The generator returns one JSON object with six required top-level
//! fields. Shape is validated here on ingestion rather than trusted: a
//! missing or mistyped field fails the whole result, so downstream
//! consumers never see partial data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::stage::{agent_for, AgentAttribution, StageKey};

/// Closed union of the six per-stage record shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "lowercase")]
pub enum StagePayload {
    Scrutinize {
        analysis: String,
        flagged_issues: Vec<String>,
    },
    Probe {
        evidence_chain: String,
        sources_type: String,
    },
    Hypothesize {
        alternatives_considered: Vec<String>,
        chosen_path: String,
    },
    Investigate {
        ethical_alignment: String,
        sacred_consent_check: String,
    },
    Narrow {
        actionable_steps: Vec<String>,
    },
    Execute {
        final_attestation: String,
        handoff_summary: String,
    },
}

impl StagePayload {
    /// First meaningful line of the payload, for rail summaries and the
    /// artifact findings block.
    pub fn headline(&self) -> &str {
        match self {
            StagePayload::Scrutinize { analysis, .. } => analysis,
            StagePayload::Probe { evidence_chain, .. } => evidence_chain,
            StagePayload::Hypothesize { chosen_path, .. } => chosen_path,
            StagePayload::Investigate {
                ethical_alignment, ..
            } => ethical_alignment,
            StagePayload::Narrow { actionable_steps } => {
                actionable_steps.first().map(String::as_str).unwrap_or("")
            }
            StagePayload::Execute {
                final_attestation, ..
            } => final_attestation,
        }
    }
}

/// One stage's validated content plus its attributed agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    pub payload: StagePayload,
    pub agent: AgentAttribution,
}

/// The complete six-stage result.
///
/// Construction through [`AnalysisResult::from_generated`] guarantees all
/// six keys are populated; the map accessor stays `Option`-returning so
/// downstream consumers remain defensive anyway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    stages: BTreeMap<StageKey, StageResult>,
}

impl AnalysisResult {
    /// Validate a raw generator response and attach the static agent
    /// attribution to each stage.
    pub fn from_generated(value: &Value) -> Result<Self, ProtocolError> {
        let root = value
            .as_object()
            .ok_or_else(|| ProtocolError::malformed("top level is not a JSON object"))?;

        let mut stages = BTreeMap::new();
        for stage in StageKey::ALL {
            let section = root
                .get(stage.as_str())
                .ok_or_else(|| missing(stage, "entire section"))?;
            let payload = parse_payload(stage, section)?;
            stages.insert(
                stage,
                StageResult {
                    payload,
                    agent: agent_for(stage),
                },
            );
        }

        Ok(Self { stages })
    }

    /// Assemble a result from already-validated stage entries.
    ///
    /// Completeness is not enforced here; this exists so tests can build
    /// deliberately partial results and exercise the defensive paths.
    pub fn from_stages(stages: BTreeMap<StageKey, StageResult>) -> Self {
        Self { stages }
    }

    pub fn stage(&self, key: StageKey) -> Option<&StageResult> {
        self.stages.get(&key)
    }

    pub fn is_complete(&self) -> bool {
        StageKey::ALL.iter().all(|key| self.stages.contains_key(key))
    }

    /// Stages in protocol order.
    pub fn iter(&self) -> impl Iterator<Item = (StageKey, Option<&StageResult>)> {
        StageKey::ALL.iter().map(move |key| (*key, self.stage(*key)))
    }
}

fn missing(stage: StageKey, field: &str) -> ProtocolError {
    ProtocolError::malformed(format!("stage '{}' is missing {}", stage.as_str(), field))
}

fn str_field(stage: StageKey, section: &Value, field: &str) -> Result<String, ProtocolError> {
    section
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing(stage, &format!("string field '{}'", field)))
}

fn list_field(stage: StageKey, section: &Value, field: &str) -> Result<Vec<String>, ProtocolError> {
    let items = section
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| missing(stage, &format!("list field '{}'", field)))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| missing(stage, &format!("string entries in '{}'", field)))
        })
        .collect()
}

fn parse_payload(stage: StageKey, section: &Value) -> Result<StagePayload, ProtocolError> {
    let payload = match stage {
        StageKey::Scrutinize => StagePayload::Scrutinize {
            analysis: str_field(stage, section, "analysis")?,
            flagged_issues: list_field(stage, section, "flagged_issues")?,
        },
        StageKey::Probe => StagePayload::Probe {
            evidence_chain: str_field(stage, section, "evidence_chain")?,
            sources_type: str_field(stage, section, "sources_type")?,
        },
        StageKey::Hypothesize => StagePayload::Hypothesize {
            alternatives_considered: list_field(stage, section, "alternatives_considered")?,
            chosen_path: str_field(stage, section, "chosen_path")?,
        },
        StageKey::Investigate => StagePayload::Investigate {
            ethical_alignment: str_field(stage, section, "ethical_alignment")?,
            sacred_consent_check: str_field(stage, section, "sacred_consent_check")?,
        },
        StageKey::Narrow => StagePayload::Narrow {
            actionable_steps: list_field(stage, section, "actionable_steps")?,
        },
        StageKey::Execute => StagePayload::Execute {
            final_attestation: str_field(stage, section, "final_attestation")?,
            handoff_summary: str_field(stage, section, "handoff_summary")?,
        },
    };
    Ok(payload)
}

#[cfg(test)]
pub mod fixtures {
    use super::*;
    use serde_json::json;

    /// A well-formed generator response used across the test suite.
    pub fn generated_value() -> Value {
        json!({
            "scrutinize": {
                "analysis": "Query touches on resource allocation under scarcity.",
                "flagged_issues": ["Potential age bias", "Outcome uncertainty"]
            },
            "probe": {
                "evidence_chain": "Triage guidance from critical care literature.",
                "sources_type": "Clinical guidelines"
            },
            "hypothesize": {
                "alternatives_considered": ["First-come allocation", "Lottery", "Prognosis-based"],
                "chosen_path": "Prognosis-based allocation with oversight"
            },
            "investigate": {
                "ethical_alignment": "Aligned with harm-reduction principles.",
                "sacred_consent_check": "Requires explicit human review"
            },
            "narrow": {
                "actionable_steps": ["Convene ethics committee", "Document criteria", "Review outcome"]
            },
            "execute": {
                "final_attestation": "Approved with oversight conditions",
                "handoff_summary": "Decision returned to the attending team."
            }
        })
    }

    pub fn complete_result() -> AnalysisResult {
        AnalysisResult::from_generated(&generated_value()).expect("fixture is well-formed")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{complete_result, generated_value};
    use super::*;

    #[test]
    fn test_complete_response_populates_all_six_stages() {
        let result = complete_result();
        assert!(result.is_complete());
        for key in StageKey::ALL {
            assert!(result.stage(key).is_some(), "missing {}", key.as_str());
        }
    }

    #[test]
    fn test_attributions_follow_the_static_mapping() {
        let result = complete_result();
        for key in StageKey::ALL {
            let stage = result.stage(key).unwrap();
            assert_eq!(stage.agent, agent_for(key));
        }
    }

    #[test]
    fn test_missing_section_is_rejected() {
        let mut value = generated_value();
        value.as_object_mut().unwrap().remove("narrow");
        let err = AnalysisResult::from_generated(&value).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedResponse { .. }));
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let mut value = generated_value();
        value["execute"]
            .as_object_mut()
            .unwrap()
            .remove("final_attestation");
        assert!(AnalysisResult::from_generated(&value).is_err());
    }

    #[test]
    fn test_mistyped_field_is_rejected() {
        let mut value = generated_value();
        value["scrutinize"]["flagged_issues"] = serde_json::json!("not a list");
        assert!(AnalysisResult::from_generated(&value).is_err());
    }

    #[test]
    fn test_non_object_root_is_rejected() {
        let value = serde_json::json!(["not", "an", "object"]);
        assert!(AnalysisResult::from_generated(&value).is_err());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let mut value = generated_value();
        value["probe"]["confidence"] = serde_json::json!(0.9);
        assert!(AnalysisResult::from_generated(&value).is_ok());
    }

    #[test]
    fn test_headlines() {
        let result = complete_result();
        let investigate = result.stage(StageKey::Investigate).unwrap();
        assert_eq!(
            investigate.payload.headline(),
            "Aligned with harm-reduction principles."
        );
        let narrow = result.stage(StageKey::Narrow).unwrap();
        assert_eq!(narrow.payload.headline(), "Convene ethics committee");
    }

    #[test]
    fn test_partial_result_reports_incomplete() {
        let mut stages = BTreeMap::new();
        let full = complete_result();
        stages.insert(
            StageKey::Scrutinize,
            full.stage(StageKey::Scrutinize).unwrap().clone(),
        );
        let partial = AnalysisResult::from_stages(stages);
        assert!(!partial.is_complete());
        assert!(partial.stage(StageKey::Probe).is_none());
    }
}
