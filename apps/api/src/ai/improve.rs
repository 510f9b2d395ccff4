//! Resume improvement.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ai::prompts::{improve_resume_prompt, improve_resume_system, IMPROVE_RESUME_MAX_TOKENS};
use crate::errors::AppError;
use crate::llm_client::{parse_json_reply, LlmClient};

/// Score reported when the model omits one.
pub const DEFAULT_ATS_SCORE: u8 = 75;
const FALLBACK_SUGGESTION: &str = "Review the AI-generated improvements and apply relevant changes";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImproveResumeRequest {
    #[serde(default)]
    pub resume_id: Option<Uuid>,
    /// Either plain text or the editor's structured JSON.
    pub content: Value,
}

impl ImproveResumeRequest {
    pub fn content_text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// What the model is asked to return. Every field is optional on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeImprovement {
    pub improved_content: Option<Value>,
    pub suggestions: Vec<String>,
    pub ats_score: Option<f64>,
    pub keywords_added: Vec<String>,
}

impl ResumeImprovement {
    /// Reads whatever fields are present, tolerating loose shapes: a numeric
    /// string score, a bare string or non-string items where a list is expected.
    fn from_object(reply: &Value) -> Self {
        Self {
            improved_content: reply
                .get("improved_content")
                .filter(|v| !v.is_null())
                .cloned(),
            suggestions: text_list(reply.get("suggestions")),
            ats_score: reply.get("ats_score").and_then(loose_number),
            keywords_added: text_list(reply.get("keywords_added")),
        }
    }

    fn fallback(reply: &str) -> Self {
        Self {
            improved_content: Some(Value::String(reply.to_string())),
            suggestions: vec![FALLBACK_SUGGESTION.to_string()],
            ats_score: Some(f64::from(DEFAULT_ATS_SCORE)),
            keywords_added: Vec::new(),
        }
    }
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn loose_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct ImproveResumeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_id: Option<Uuid>,
    pub improved_content: Value,
    pub improvements: Vec<String>,
    pub ats_score: u8,
    pub keywords_added: Vec<String>,
}

/// Best-effort interpretation of the model reply. Any JSON object is read
/// field by field; anything else becomes the improved content verbatim with a
/// generic suggestion.
pub fn interpret_reply(reply: &str) -> ResumeImprovement {
    match parse_json_reply::<Value>(reply) {
        Ok(parsed @ Value::Object(_)) => ResumeImprovement::from_object(&parsed),
        Ok(_) => {
            warn!("Resume improvement reply was JSON but not an object; returning it verbatim");
            ResumeImprovement::fallback(reply)
        }
        Err(e) => {
            warn!("Resume improvement reply was not JSON ({e}); returning it verbatim");
            ResumeImprovement::fallback(reply)
        }
    }
}

/// A missing or zero score becomes the default; anything else is held to 0..=100.
fn clamp_score(score: Option<f64>) -> u8 {
    match score {
        Some(s) if s.is_finite() && s != 0.0 => s.round().clamp(0.0, 100.0) as u8,
        _ => DEFAULT_ATS_SCORE,
    }
}

pub async fn improve_resume(
    llm: &LlmClient,
    request: &ImproveResumeRequest,
) -> Result<ImproveResumeResponse, AppError> {
    let content = request.content_text();
    if content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }

    let reply = llm
        .call_text(
            &improve_resume_prompt(&content),
            &improve_resume_system(),
            IMPROVE_RESUME_MAX_TOKENS,
        )
        .await?;
    let improvement = interpret_reply(&reply);
    let ats_score = clamp_score(improvement.ats_score);

    info!(
        "Resume improvement produced {} suggestions (ats_score={})",
        improvement.suggestions.len(),
        ats_score
    );

    Ok(ImproveResumeResponse {
        success: true,
        resume_id: request.resume_id,
        improved_content: improvement.improved_content.unwrap_or(Value::String(reply)),
        improvements: improvement.suggestions,
        ats_score,
        keywords_added: improvement.keywords_added,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpret_json_reply() {
        let reply = r#"```json
{"improved_content": "Led migration", "suggestions": ["Quantify impact"],
 "ats_score": 88, "keywords_added": ["Kubernetes"]}
```"#;
        let improvement = interpret_reply(reply);
        assert_eq!(
            improvement.improved_content,
            Some(Value::String("Led migration".into()))
        );
        assert_eq!(improvement.suggestions, vec!["Quantify impact"]);
        assert_eq!(clamp_score(improvement.ats_score), 88);
        assert_eq!(improvement.keywords_added, vec!["Kubernetes"]);
    }

    #[test]
    fn test_interpret_plain_text_falls_back() {
        let improvement = interpret_reply("Here is a better resume: ...");
        assert_eq!(
            improvement.improved_content,
            Some(Value::String("Here is a better resume: ...".into()))
        );
        assert_eq!(improvement.suggestions, vec![FALLBACK_SUGGESTION]);
        assert_eq!(clamp_score(improvement.ats_score), DEFAULT_ATS_SCORE);
        assert!(improvement.keywords_added.is_empty());
    }

    #[test]
    fn test_missing_score_defaults() {
        let improvement = interpret_reply(r#"{"suggestions": []}"#);
        assert_eq!(clamp_score(improvement.ats_score), DEFAULT_ATS_SCORE);
        assert_eq!(clamp_score(Some(140.0)), 100);
        assert_eq!(clamp_score(Some(0.0)), DEFAULT_ATS_SCORE);
        assert_eq!(clamp_score(Some(-12.0)), 0);
        assert_eq!(clamp_score(Some(f64::NAN)), DEFAULT_ATS_SCORE);
    }

    #[test]
    fn test_interpret_tolerates_loose_field_shapes() {
        let improvement = interpret_reply(
            r#"{"improved_content": "Better",
                "suggestions": [{"section": "summary", "tip": "quantify"}, "Add metrics", null],
                "ats_score": 82, "keywords_added": "Rust"}"#,
        );
        assert_eq!(
            improvement.improved_content,
            Some(Value::String("Better".into()))
        );
        assert_eq!(
            improvement.suggestions,
            vec![
                r#"{"section":"summary","tip":"quantify"}"#.to_string(),
                "Add metrics".to_string()
            ]
        );
        assert_eq!(clamp_score(improvement.ats_score), 82);
        assert_eq!(improvement.keywords_added, vec!["Rust"]);
    }

    #[test]
    fn test_interpret_null_lists_and_string_score() {
        let improvement = interpret_reply(
            r#"{"improved_content": {"summary": "Engineer"}, "suggestions": null,
                "ats_score": "85", "keywords_added": ["Go", 7]}"#,
        );
        assert_eq!(
            improvement.improved_content,
            Some(serde_json::json!({ "summary": "Engineer" }))
        );
        assert!(improvement.suggestions.is_empty());
        assert_eq!(clamp_score(improvement.ats_score), 85);
        assert_eq!(improvement.keywords_added, vec!["Go", "7"]);
    }

    #[test]
    fn test_interpret_json_non_object_falls_back() {
        let improvement = interpret_reply(r#"["just", "a", "list"]"#);
        assert_eq!(improvement.suggestions, vec![FALLBACK_SUGGESTION]);
        assert_eq!(
            improvement.improved_content,
            Some(Value::String(r#"["just", "a", "list"]"#.into()))
        );
    }

    #[test]
    fn test_structured_content_is_serialized() {
        let request: ImproveResumeRequest = serde_json::from_value(serde_json::json!({
            "resumeId": "6f1c1f3e-2b7a-4c1e-9d59-0c8f0e5a1b2c",
            "content": { "summary": "Engineer" }
        }))
        .unwrap();
        assert_eq!(request.content_text(), r#"{"summary":"Engineer"}"#);
        assert!(request.resume_id.is_some());
    }
}
