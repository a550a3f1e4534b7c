//! Interpretation of model output.
//!
//! The endpoint returns whatever text the model produced. [`interpret`] turns
//! that text into a [`QueryOutcome`]: either the JSON object the model emitted,
//! held verbatim as a [`DecisionPayload`], or a [`QueryOutcome::Fallback`]
//! carrying the raw text when it is not a JSON object.
//!
//! No schema validation happens here. The accessors on [`DecisionPayload`] read
//! the documented fields leniently and return `None` or an empty list when a
//! field is missing or has an unexpected type.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Decision label of a fallback result.
pub const FALLBACK_DECISION: &str = "Processed";
/// Confidence reported by a fallback result.
pub const FALLBACK_CONFIDENCE: f64 = 0.8;
/// Justification used when the model returned no text or an empty string.
pub const FALLBACK_JUSTIFICATION: &str = "Analysis completed based on the provided documents.";

/// Result of one query round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// The model output parsed as a JSON object.
    Parsed(DecisionPayload),
    /// The model output was absent or not a JSON object.
    Fallback { raw_text: Option<String> },
}

impl QueryOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, QueryOutcome::Fallback { .. })
    }

    /// The payload to display. Fallbacks materialize as the canned shape.
    pub fn payload(&self) -> DecisionPayload {
        match self {
            QueryOutcome::Parsed(p) => p.clone(),
            QueryOutcome::Fallback { raw_text } => fallback_payload(raw_text.as_deref()),
        }
    }
}

/// Parse the endpoint's `text` field.
pub fn interpret(text: Option<&str>) -> QueryOutcome {
    let raw = match text {
        Some(t) if !t.is_empty() => t,
        _ => return QueryOutcome::Fallback { raw_text: None },
    };

    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Object(map)) => QueryOutcome::Parsed(DecisionPayload(map)),
        _ => QueryOutcome::Fallback {
            raw_text: Some(raw.to_string()),
        },
    }
}

fn fallback_payload(raw_text: Option<&str>) -> DecisionPayload {
    let mut map = Map::new();
    map.insert("Decision".into(), json!(FALLBACK_DECISION));
    map.insert(
        "Justification".into(),
        json!(raw_text.unwrap_or(FALLBACK_JUSTIFICATION)),
    );
    map.insert("Clause_References".into(), json!([]));
    map.insert("Confidence".into(), json!(FALLBACK_CONFIDENCE));
    DecisionPayload(map)
}

/// A decision object exactly as the model emitted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionPayload(Map<String, Value>);

/// A single citation inside a decision payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClauseReference {
    pub document: Option<String>,
    pub clause_snippet: Option<String>,
    pub page: Option<String>,
    pub matched_concept: Option<String>,
}

impl DecisionPayload {
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn decision(&self) -> Option<&str> {
        self.0.get("Decision").and_then(Value::as_str)
    }

    /// Monetary amount as free text. Numbers are rendered as-is.
    pub fn amount(&self) -> Option<String> {
        self.0.get("Amount").and_then(value_text)
    }

    pub fn justification(&self) -> Option<&str> {
        self.0.get("Justification").and_then(Value::as_str)
    }

    pub fn confidence(&self) -> Option<f64> {
        match self.0.get("Confidence")? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn clause_references(&self) -> Vec<ClauseReference> {
        let Some(items) = self.0.get("Clause_References").and_then(Value::as_array) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(Value::as_object)
            .map(|obj| ClauseReference {
                document: obj.get("Document").and_then(value_text),
                clause_snippet: obj.get("Clause_Snippet").and_then(value_text),
                page: obj.get("Page").and_then(value_text),
                matched_concept: obj.get("Matched_Concept").and_then(value_text),
            })
            .collect()
    }

    /// Field names the model asked for on the clarification path.
    pub fn missing(&self) -> Vec<String> {
        self.0
            .get("Missing")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(value_text).collect())
            .unwrap_or_default()
    }

    pub fn suggested_follow_up(&self) -> Option<&str> {
        self.0.get("Suggested_Follow_up").and_then(Value::as_str)
    }
}

fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_json_parsed_verbatim() {
        let text = r#"{
            "Decision": "Approved",
            "Amount": "₹50,000",
            "Justification": "Knee surgery is covered after the waiting period.",
            "Clause_References": [
                {"Document": "policy.txt", "Clause_Snippet": "Knee surgery covered after 2 years.",
                 "Page": "1", "Matched_Concept": "waiting period"}
            ],
            "Confidence": 0.92,
            "Extra_Field": {"nested": true}
        }"#;
        let outcome = interpret(Some(text));
        let expected: Value = serde_json::from_str(text).unwrap();
        match outcome {
            QueryOutcome::Parsed(payload) => assert_eq!(payload.into_value(), expected),
            other => panic!("expected parsed, got {:?}", other),
        }
    }

    #[test]
    fn test_accessors() {
        let outcome = interpret(Some(
            r#"{"Decision":"Approved","Amount":50000,"Confidence":"0.7",
                "Clause_References":[{"Document":"a.txt","Page":3},"junk"]}"#,
        ));
        let p = outcome.payload();
        assert_eq!(p.decision(), Some("Approved"));
        assert_eq!(p.amount().as_deref(), Some("50000"));
        assert_eq!(p.confidence(), Some(0.7));
        let refs = p.clause_references();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].document.as_deref(), Some("a.txt"));
        assert_eq!(refs[0].page.as_deref(), Some("3"));
        assert!(refs[0].clause_snippet.is_none());
        assert!(p.justification().is_none());
    }

    #[test]
    fn test_clarification_path() {
        let p = interpret(Some(
            r#"{"Decision":"Needs Clarification","Missing":["age","policy duration"],
                "Suggested_Follow_up":"Please provide the policy start date."}"#,
        ))
        .payload();
        assert_eq!(p.missing(), vec!["age", "policy duration"]);
        assert_eq!(
            p.suggested_follow_up(),
            Some("Please provide the policy start date.")
        );
    }

    #[test]
    fn test_invalid_json_falls_back_to_raw_text() {
        let outcome = interpret(Some("The claim looks approved."));
        assert!(outcome.is_fallback());
        let p = outcome.payload();
        assert_eq!(p.decision(), Some(FALLBACK_DECISION));
        assert_eq!(p.justification(), Some("The claim looks approved."));
        assert!(p.clause_references().is_empty());
        assert_eq!(p.confidence(), Some(FALLBACK_CONFIDENCE));
    }

    #[test]
    fn test_absent_text_uses_generic_justification() {
        for text in [None, Some("")] {
            let p = interpret(text).payload();
            assert_eq!(p.justification(), Some(FALLBACK_JUSTIFICATION));
            assert_eq!(p.decision(), Some(FALLBACK_DECISION));
        }
    }

    #[test]
    fn test_whitespace_text_is_kept_as_justification() {
        let outcome = interpret(Some("  \n"));
        assert_eq!(
            outcome,
            QueryOutcome::Fallback {
                raw_text: Some("  \n".to_string())
            }
        );
        assert_eq!(outcome.payload().justification(), Some("  \n"));
    }

    #[test]
    fn test_fenced_or_non_object_json_is_fallback() {
        assert!(interpret(Some("```json\n{\"Decision\":\"Approved\"}\n```")).is_fallback());
        assert!(interpret(Some("[1, 2, 3]")).is_fallback());
        assert!(interpret(Some("42")).is_fallback());
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let outcome = interpret(Some("not json"));
        let v = serde_json::to_value(&outcome).unwrap();
        assert_eq!(v["kind"], "fallback");
        assert_eq!(v["data"]["raw_text"], "not json");

        let parsed = interpret(Some(r#"{"Decision":"Rejected"}"#));
        let v = serde_json::to_value(&parsed).unwrap();
        assert_eq!(v["kind"], "parsed");
        assert_eq!(v["data"]["Decision"], "Rejected");
        let back: QueryOutcome = serde_json::from_value(v).unwrap();
        assert_eq!(back, parsed);
    }
}
