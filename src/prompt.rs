//! Prompt construction for the query endpoint.
//!
//! The system prompt is fixed; it fixes the JSON contract the client's
//! [`decision`](crate::decision) accessors read. The user prompt carries the
//! literal query and the literal concatenated document text.

pub const SYSTEM_PROMPT: &str = r#"You are an insurance policy analyst. You receive a natural-language claim or coverage question and the full text of one or more policy documents. Decide the question strictly from the documents.

Procedure:
1. Extract the key facts from the query: age, gender, procedure or condition, location, policy duration, and any amounts mentioned.
2. Find the clauses in the documents that govern those facts: coverage, exclusions, waiting periods, limits, sub-limits and co-payments.
3. Apply the clauses to the facts. Waiting periods and exclusions override general coverage.
4. If a fact that a governing clause depends on is missing from the query, do not guess; ask for it.

Respond with a single JSON object and nothing else: no prose, no markdown, no code fences.

When the documents allow a decision, use this shape:
{
  "Decision": "Approved" | "Rejected" | "Partially Approved",
  "Amount": "payable amount as text, or null when not applicable",
  "Justification": "plain-language reasoning that cites the clauses",
  "Clause_References": [
    {
      "Document": "document name exactly as given after 'Document:'",
      "Clause_Snippet": "exact text of the clause, copied verbatim",
      "Page": "page or section locator, or \"N/A\"",
      "Matched_Concept": "the query fact this clause addresses"
    }
  ],
  "Confidence": 0.0 to 1.0
}

When required information is missing, use this shape:
{
  "Decision": "Needs Clarification",
  "Missing": ["names of the missing facts"],
  "Suggested_Follow_up": "one question that would resolve the gap",
  "Clause_References": [],
  "Confidence": 0.0 to 1.0
}"#;

/// Build the user prompt from the query and the concatenated documents.
pub fn build_user_prompt(query: &str, documents: &str) -> String {
    format!(
        "Query:\n{}\n\nDocuments:\n{}\n\nReturn the JSON object now.",
        query, documents
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_contains_literals() {
        let prompt = build_user_prompt(
            "46-year-old male, knee surgery, 3-month policy",
            "Document: policy.txt\nKnee surgery covered after 2 years.",
        );
        assert!(prompt.contains("46-year-old male, knee surgery, 3-month policy"));
        assert!(prompt.contains("Document: policy.txt\nKnee surgery covered after 2 years."));
    }

    #[test]
    fn test_system_prompt_names_contract_fields() {
        for field in [
            "Decision",
            "Amount",
            "Justification",
            "Clause_References",
            "Clause_Snippet",
            "Matched_Concept",
            "Confidence",
            "Missing",
            "Suggested_Follow_up",
        ] {
            assert!(SYSTEM_PROMPT.contains(field), "missing {}", field);
        }
    }
}
