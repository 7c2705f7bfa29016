//! Prompt templates for the Analyzer and Summary Engine.

use crate::models::DocumentClassification;

/// System prompt steering the Analyzer toward a single JSON object.
pub fn analyzer_system_prompt() -> &'static str {
    "You are a legal document analyst. Read the document text provided and \
     respond with a single JSON object only, no prose before or after it. \
     Classify the document, extract its key entities and arguments, and \
     score how relevant it is to the overall case."
}

/// User prompt for a single document's metadata extraction.
///
/// `text` should already be truncated to the Analyzer's configured
/// character limit before this is called.
pub fn analyzer_user_prompt(filename: &str, text: &str) -> String {
    format!(
        r#"Document filename: {filename}

Document text:
---
{text}
---

Respond with a JSON object with exactly these fields:
{{
  "doctype": one of "motion", "response", "complaint", "order", "notice", "evidence", "research", "unknown",
  "classification_confidence": number between 0 and 1,
  "executive_summary": a 2-4 sentence summary,
  "main_arguments": array of strings,
  "requested_relief": array of strings,
  "entities": {{
    "parties": array of {{"name": string, "role": string, "mentions": number}},
    "dates": array of {{"date": string, "context": string}},
    "authorities": array of {{"citation": string, "context": string}}
  }}
}}"#
    )
}

/// Parses an analyzer doctype string into the typed enum, defaulting to
/// `Unknown` for anything unrecognized rather than failing the analysis.
pub fn parse_doctype(raw: &str) -> DocumentClassification {
    raw.parse().unwrap_or(DocumentClassification::Unknown)
}

/// Prompt for summarizing one batch of documents (spec.md §4.3's
/// batch-of-5 hierarchical pass).
pub fn summary_batch_prompt(case_title: &str, batch: &[(String, String)]) -> String {
    let mut body = String::new();
    for (filename, excerpt) in batch {
        body.push_str(&format!("### {filename}\n{excerpt}\n\n"));
    }

    format!(
        r#"You are drafting part of a running narrative summary of the legal case "{case_title}".
Summarize the following batch of documents, focusing on what each contributes
to the case: key facts, arguments, and any relief requested. Write in plain
prose, organized by document. Do not repeat the full document text.

{body}"#
    )
}

/// Prompt that folds a new batch summary into the running narrative.
pub fn summary_merge_prompt(case_title: &str, running_narrative: &str, batch_summary: &str) -> String {
    format!(
        r#"You are maintaining a running narrative summary of the legal case "{case_title}".

Existing narrative:
---
{running_narrative}
---

New material to incorporate:
---
{batch_summary}
---

Produce the updated full narrative in markdown, integrating the new material
coherently with what came before. Do not simply append — merge overlapping
context and keep the result readable as a single document."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_doctype_falls_back_to_unknown() {
        assert_eq!(parse_doctype("not-a-real-type"), DocumentClassification::Unknown);
        assert_eq!(parse_doctype("motion"), DocumentClassification::Motion);
    }

    #[test]
    fn analyzer_user_prompt_includes_filename_and_text() {
        let prompt = analyzer_user_prompt("motion.pdf", "some text");
        assert!(prompt.contains("motion.pdf"));
        assert!(prompt.contains("some text"));
    }

    #[test]
    fn summary_batch_prompt_includes_all_filenames() {
        let batch = vec![
            ("a.pdf".to_string(), "excerpt a".to_string()),
            ("b.pdf".to_string(), "excerpt b".to_string()),
        ];
        let prompt = summary_batch_prompt("Smith v. Jones", &batch);
        assert!(prompt.contains("a.pdf"));
        assert!(prompt.contains("b.pdf"));
        assert!(prompt.contains("Smith v. Jones"));
    }
}
