//! Framework catalog
//!
//! Enumerates the supported ethical frameworks and their per-stage
//! terminology. The catalog is built once at startup and is read-only for
//! the life of the process.

use serde::{Deserialize, Serialize};

use crate::stage::StageKey;
use crate::ProtocolError;

/// Identifier for one of the fixed set of governance frameworks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkId {
    Islamic,
    Jewish,
    Christian,
    Secular,
}

impl FrameworkId {
    pub const ALL: [FrameworkId; 4] = [
        FrameworkId::Islamic,
        FrameworkId::Jewish,
        FrameworkId::Christian,
        FrameworkId::Secular,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FrameworkId::Islamic => "islamic",
            FrameworkId::Jewish => "jewish",
            FrameworkId::Christian => "christian",
            FrameworkId::Secular => "secular",
        }
    }

    pub fn parse(value: &str) -> Result<FrameworkId, ProtocolError> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == value)
            .ok_or_else(|| ProtocolError::UnknownFramework(value.to_string()))
    }
}

/// One framework: display metadata, per-stage terminology and the consent
/// prompt shown at the Investigate gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameworkDefinition {
    pub id: FrameworkId,
    pub name: String,
    pub description: String,
    /// Stage terminology, ordered by [`StageKey::ALL`].
    pub terms: [String; 6],
    pub consent_title: String,
    pub consent_description: String,
    pub sample_queries: Vec<String>,
}

impl FrameworkDefinition {
    /// Terminology for one stage.
    pub fn term_for(&self, stage: StageKey) -> &str {
        &self.terms[stage.index()]
    }
}

/// All framework definitions, loaded once at process start.
pub struct FrameworkCatalog {
    frameworks: Vec<FrameworkDefinition>,
}

impl FrameworkCatalog {
    pub fn load() -> Self {
        Self {
            frameworks: FrameworkId::ALL.iter().map(|id| definition(*id)).collect(),
        }
    }

    /// Lookup is infallible: the catalog always contains every id.
    pub fn get(&self, id: FrameworkId) -> &FrameworkDefinition {
        self.frameworks
            .iter()
            .find(|fw| fw.id == id)
            .expect("catalog contains every framework id")
    }

    pub fn all(&self) -> &[FrameworkDefinition] {
        &self.frameworks
    }
}

impl Default for FrameworkCatalog {
    fn default() -> Self {
        Self::load()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn terms(items: [&str; 6]) -> [String; 6] {
    items.map(|s| s.to_string())
}

fn definition(id: FrameworkId) -> FrameworkDefinition {
    match id {
        FrameworkId::Islamic => FrameworkDefinition {
            id,
            name: "Islamic Framework".to_string(),
            description: "Governance based on Maqasid al-Shari'ah, prioritizing preservation of \
                          faith, life, intellect, lineage, and property."
                .to_string(),
            terms: terms([
                "Tafakkur (Reflection)",
                "Tahqiq (Verification)",
                "Ijtihad (Reasoning)",
                "Murāqabah (Watchfulness)",
                "Tanqih (Refinement)",
                "Amānah (Trust)",
            ]),
            consent_title: "Sacred Consent: Murāqabah".to_string(),
            consent_description: "Pause to reflect: Does this output align with Divine Will and \
                                  preserve the dignity of creation? Grant authorization only if \
                                  integrity is maintained."
                .to_string(),
            sample_queries: strings(&[
                "Analyze the ethical implications of trading cryptocurrency futures with high \
                 leverage under Sharia law.",
                "Draft a medical guideline for using porcine-derived heart valves for Muslim \
                 patients in critical condition.",
            ]),
        },
        FrameworkId::Jewish => FrameworkDefinition {
            id,
            name: "Jewish Framework".to_string(),
            description: "Ethical alignment with Halacha, emphasizing Pikuach Nefesh (saving \
                          life) and Emet (truth)."
                .to_string(),
            terms: terms([
                "Bedikah (Inspection)",
                "Chakirah (Interrogation)",
                "Svara (Logical Reasoning)",
                "Hitbonenut (Contemplation)",
                "Birur (Clarification)",
                "Ma'aseh (Action)",
            ]),
            consent_title: "Sacred Consent: Hitbonenut".to_string(),
            consent_description: "Engage in deep contemplation. Ensure this decision upholds the \
                                  covenant of ethics and responsibility before proceeding."
                .to_string(),
            sample_queries: strings(&[
                "Is it permissible to break Shabbat restrictions to operate a suicide prevention \
                 hotline?",
                "Determine the Halachic status of lab-grown meat produced from stem cells: is it \
                 pareve or fleishig?",
            ]),
        },
        FrameworkId::Christian => FrameworkDefinition {
            id,
            name: "Christian Framework".to_string(),
            description: "Stewardship-based governance focusing on Caritas (Charity), Truth, and \
                          the common good."
                .to_string(),
            terms: terms([
                "Examination",
                "Inquiry",
                "Discernment",
                "Contemplation",
                "Prudence",
                "Stewardship",
            ]),
            consent_title: "Sacred Consent: Discernment".to_string(),
            consent_description: "Prayerfully discern the spirit of this output. Does it serve \
                                  the neighbor and truth? Authorize only if it aligns with these \
                                  virtues."
                .to_string(),
            sample_queries: strings(&[
                "Evaluate the morality of CRISPR gene editing for non-therapeutic enhancements \
                 in unborn children.",
                "Draft an investment stewardship policy for a church endowment that excludes \
                 weapons and gambling.",
            ]),
        },
        FrameworkId::Secular => FrameworkDefinition {
            id,
            name: "Secular Humanist".to_string(),
            description: "Rational ethics focusing on human rights, harm reduction, and informed \
                          consent."
                .to_string(),
            terms: terms([
                "Peer Review",
                "Evidence Check",
                "Scenario Planning",
                "Ethical Impact",
                "Risk Mitigation",
                "Authorization",
            ]),
            consent_title: "Human Oversight: Review".to_string(),
            consent_description: "Pause for critical human review. Does this meet the standards \
                                  of safety, fairness, and transparency?"
                .to_string(),
            sample_queries: strings(&[
                "Propose a triage protocol for autonomous vehicles deciding between saving a \
                 passenger vs. a pedestrian.",
                "Audit a proposed facial recognition deployment in public housing for potential \
                 racial bias and privacy rights.",
            ]),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_contains_all_frameworks() {
        let catalog = FrameworkCatalog::load();
        assert_eq!(catalog.all().len(), 4);
        for id in FrameworkId::ALL {
            assert_eq!(catalog.get(id).id, id);
        }
    }

    #[test]
    fn test_secular_display_name() {
        let catalog = FrameworkCatalog::load();
        assert_eq!(catalog.get(FrameworkId::Secular).name, "Secular Humanist");
    }

    #[test]
    fn test_terms_follow_stage_order() {
        let catalog = FrameworkCatalog::load();
        let islamic = catalog.get(FrameworkId::Islamic);
        assert_eq!(islamic.term_for(StageKey::Scrutinize), "Tafakkur (Reflection)");
        assert_eq!(
            islamic.term_for(StageKey::Investigate),
            "Murāqabah (Watchfulness)"
        );
        assert_eq!(islamic.term_for(StageKey::Execute), "Amānah (Trust)");
    }

    #[test]
    fn test_every_framework_has_consent_prompt_and_samples() {
        let catalog = FrameworkCatalog::load();
        for fw in catalog.all() {
            assert!(!fw.consent_title.is_empty());
            assert!(!fw.consent_description.is_empty());
            assert!(!fw.sample_queries.is_empty());
        }
    }

    #[test]
    fn test_id_parse_roundtrip() {
        for id in FrameworkId::ALL {
            assert_eq!(FrameworkId::parse(id.as_str()).unwrap(), id);
        }
        assert!(FrameworkId::parse("stoic").is_err());
    }
}
