//! Analysis request gateway
//!
//! Sends the user query plus framework terminology to the generator and
//! validates the structured six-stage response. Every failure class
//! (missing credentials, transport error, malformed or empty output)
//! surfaces as a single user-displayable `AnalysisUnavailable`; a partial
//! result is never returned.

use async_trait::async_trait;
use serde_json::{json, Value};

use sphinx_protocol::framework::FrameworkDefinition;
use sphinx_protocol::result::AnalysisResult;
use sphinx_protocol::stage::StageKey;
use sphinx_protocol::ProtocolError;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const GEMINI_MODEL: &str = "gemini-2.0-flash";

/// The structured-analysis generator, abstracted so tests can stand in a
/// stub for the network.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Returns the raw text of the generator's structured response.
    async fn generate(
        &self,
        query: &str,
        framework: &FrameworkDefinition,
    ) -> Result<String, ProtocolError>;
}

/// Production backend: one Gemini `generateContent` call per request.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
}

impl GeminiBackend {
    pub fn from_env() -> Result<Self, ProtocolError> {
        let api_key = std::env::var(API_KEY_VAR)
            .map_err(|_| ProtocolError::unavailable(format!("{} is missing from the environment.", API_KEY_VAR)))?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
        })
    }
}

#[async_trait]
impl AnalysisBackend for GeminiBackend {
    async fn generate(
        &self,
        query: &str,
        framework: &FrameworkDefinition,
    ) -> Result<String, ProtocolError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            API_BASE, GEMINI_MODEL, self.api_key
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": build_prompt(query, framework) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "temperature": 0.4,
                "responseSchema": response_schema()
            }
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProtocolError::unavailable(format!("Could not reach the generator: {}.", e)))?;

        if !response.status().is_success() {
            return Err(ProtocolError::unavailable(format!(
                "Generator request failed with status {}.",
                response.status()
            )));
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| ProtocolError::unavailable(format!("Generator reply was unreadable: {}.", e)))?;
        candidate_text(&envelope)
    }
}

/// Pull the first candidate's text out of the Gemini response envelope.
fn candidate_text(envelope: &Value) -> Result<String, ProtocolError> {
    let text = envelope["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .unwrap_or("")
        .trim();
    if text.is_empty() {
        return Err(ProtocolError::unavailable("Empty response from the generator."));
    }
    Ok(text.to_string())
}

/// Build the orchestration prompt, naming all six stages and the
/// framework's terminology.
pub fn build_prompt(query: &str, framework: &FrameworkDefinition) -> String {
    let stage_lines: String = StageKey::ALL
        .iter()
        .enumerate()
        .map(|(i, stage)| {
            format!(
                "{}. **{}** ({})\n",
                i + 1,
                stage.title(),
                framework.term_for(*stage)
            )
        })
        .collect();

    format!(
        "You are the S.P.H.I.N.X. (Scrutinize, Probe, Hypothesize, Investigate, Narrow, \
         Execute) Governance Engine.\n\
         \n\
         Your task is to act as a multi-model orchestrator, generating the analysis that \
         would be produced by specialized agents for each step of the protocol.\n\
         \n\
         User Query: \"{}\"\n\
         Framework: **{}**\n\
         \n\
         Perform the following steps, adopting the framework's terminology for each:\n\
         {}\n\
         The Investigate step applies the consent check: {}.\n\
         \n\
         IMPORTANT: You MUST return a single valid JSON object matching the response \
         schema. Do not include markdown formatting.",
        query, framework.name, stage_lines, framework.consent_title
    )
}

fn string_prop() -> Value {
    json!({ "type": "STRING" })
}

fn list_prop() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

/// Response schema with six required top-level stage objects.
fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "required": ["scrutinize", "probe", "hypothesize", "investigate", "narrow", "execute"],
        "properties": {
            "scrutinize": {
                "type": "OBJECT",
                "required": ["analysis", "flagged_issues"],
                "properties": { "analysis": string_prop(), "flagged_issues": list_prop() }
            },
            "probe": {
                "type": "OBJECT",
                "required": ["evidence_chain", "sources_type"],
                "properties": { "evidence_chain": string_prop(), "sources_type": string_prop() }
            },
            "hypothesize": {
                "type": "OBJECT",
                "required": ["alternatives_considered", "chosen_path"],
                "properties": { "alternatives_considered": list_prop(), "chosen_path": string_prop() }
            },
            "investigate": {
                "type": "OBJECT",
                "required": ["ethical_alignment", "sacred_consent_check"],
                "properties": { "ethical_alignment": string_prop(), "sacred_consent_check": string_prop() }
            },
            "narrow": {
                "type": "OBJECT",
                "required": ["actionable_steps"],
                "properties": { "actionable_steps": list_prop() }
            },
            "execute": {
                "type": "OBJECT",
                "required": ["final_attestation", "handoff_summary"],
                "properties": { "final_attestation": string_prop(), "handoff_summary": string_prop() }
            }
        }
    })
}

/// Strip markdown code fences if the generator wrapped its JSON anyway.
fn extract_json(text: &str) -> String {
    let body = if let Some(start) = text.find("```json") {
        let from = start + 7;
        let end = text[from..].rfind("```").map(|p| p + from).unwrap_or(text.len());
        &text[from..end]
    } else if let Some(start) = text.find("```") {
        let from = start + 3;
        let end = text[from..].rfind("```").map(|p| p + from).unwrap_or(text.len());
        &text[from..end]
    } else {
        text
    };
    body.trim().to_string()
}

fn user_facing(err: ProtocolError) -> ProtocolError {
    match err {
        err @ ProtocolError::AnalysisUnavailable { .. } => err,
        other => ProtocolError::unavailable(format!(
            "Failed to generate the governance analysis ({}). Try again or use a simpler query.",
            other
        )),
    }
}

/// Request a complete six-stage analysis.
///
/// Precondition: the query is non-empty after trimming (the UI blocks
/// empty submissions before this point; the check here is a backstop).
/// On success all six stages are populated and carry their static agent
/// attribution.
pub async fn request_analysis(
    backend: &dyn AnalysisBackend,
    query: &str,
    framework: &FrameworkDefinition,
) -> Result<AnalysisResult, ProtocolError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::unavailable("Query must not be empty."));
    }

    let text = backend.generate(trimmed, framework).await.map_err(user_facing)?;
    let value: Value = serde_json::from_str(&extract_json(&text))
        .map_err(|e| user_facing(ProtocolError::malformed(format!("invalid JSON: {}", e))))?;
    AnalysisResult::from_generated(&value).map_err(user_facing)
}


#[cfg(test)]
mod tests {
    use super::testing::{fixture_json, StubBackend};
    use super::*;
    use sphinx_protocol::framework::{FrameworkCatalog, FrameworkId};

    #[tokio::test]
    async fn test_complete_response_yields_full_result() {
        let catalog = FrameworkCatalog::load();
        let framework = catalog.get(FrameworkId::Secular);
        let backend = StubBackend::ok(fixture_json());

        let result = request_analysis(&backend, "ICU bed allocation", framework)
            .await
            .unwrap();
        assert!(result.is_complete());
        for key in StageKey::ALL {
            assert!(result.stage(key).unwrap().agent.name.len() > 0);
        }
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_fenced_response_is_accepted() {
        let catalog = FrameworkCatalog::load();
        let framework = catalog.get(FrameworkId::Jewish);
        let backend = StubBackend::ok(format!("```json\n{}\n```", fixture_json()));

        let result = request_analysis(&backend, "a question", framework).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_empty_query_never_reaches_the_backend() {
        let catalog = FrameworkCatalog::load();
        let framework = catalog.get(FrameworkId::Secular);
        let backend = StubBackend::ok(fixture_json());

        let err = request_analysis(&backend, "   ", framework).await.unwrap_err();
        assert!(matches!(err, ProtocolError::AnalysisUnavailable { .. }));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_unavailable() {
        let catalog = FrameworkCatalog::load();
        let framework = catalog.get(FrameworkId::Islamic);
        let backend = StubBackend::failing("connection refused");

        let err = request_analysis(&backend, "a question", framework).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_malformed_response_is_unavailable_with_display_message() {
        let catalog = FrameworkCatalog::load();
        let framework = catalog.get(FrameworkId::Secular);
        let backend = StubBackend::ok(r#"{"scrutinize": {}}"#);

        let err = request_analysis(&backend, "a question", framework).await.unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, ProtocolError::AnalysisUnavailable { .. }));
        assert!(message.contains("Try again"));
    }

    #[tokio::test]
    async fn test_non_json_response_is_unavailable() {
        let catalog = FrameworkCatalog::load();
        let framework = catalog.get(FrameworkId::Secular);
        let backend = StubBackend::ok("I would rather write prose.");

        assert!(request_analysis(&backend, "a question", framework).await.is_err());
    }

    #[test]
    fn test_extract_json_variants() {
        assert_eq!(extract_json("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(extract_json("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_prompt_names_framework_terminology() {
        let catalog = FrameworkCatalog::load();
        let framework = catalog.get(FrameworkId::Islamic);
        let prompt = build_prompt("a question", framework);
        assert!(prompt.contains("Murāqabah (Watchfulness)"));
        assert!(prompt.contains("Islamic Framework"));
        for stage in StageKey::ALL {
            assert!(prompt.contains(stage.title()));
        }
    }

    #[test]
    fn test_candidate_text_rejects_empty_envelope() {
        let envelope = serde_json::json!({ "candidates": [] });
        assert!(candidate_text(&envelope).is_err());
    }
}
