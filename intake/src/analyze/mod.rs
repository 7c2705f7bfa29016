//! The Analyzer: turns extracted document text into a `DocumentMetadata`
//! artifact via an LLM (spec.md §4.2 Analyzer contract).
//!
//! Never fails the pipeline outright — after exhausting its retries it
//! falls back to `DocumentMetadata::fallback`, which downstream stages
//! treat as a normal (if low-confidence) result.

use std::time::Duration;

use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::llm::prompts;
use crate::llm::LlmProvider;
use crate::models::{Authority, DateEntry, DocumentMetadata, Entities, Party, Relationships};

/// Default classification confidence when the LLM's response omits it
/// (spec.md §4.2 Analyzer contract).
const DEFAULT_CONFIDENCE: f32 = 0.8;

pub struct Analyzer {
    llm: LlmProvider,
    max_input_chars: usize,
    max_retries: u32,
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    doctype: Option<String>,
    classification_confidence: Option<f32>,
    executive_summary: Option<String>,
    #[serde(default)]
    main_arguments: Vec<String>,
    #[serde(default)]
    requested_relief: Vec<String>,
    #[serde(default)]
    entities: RawEntities,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntities {
    #[serde(default)]
    parties: Vec<Party>,
    #[serde(default)]
    dates: Vec<DateEntry>,
    #[serde(default)]
    authorities: Vec<Authority>,
}

impl Analyzer {
    pub fn new(llm: LlmProvider, config: &PipelineConfig) -> Self {
        Self {
            llm,
            max_input_chars: config.analyze_max_input_chars,
            max_retries: config.analyze_max_retries,
        }
    }

    /// Analyzes one document's extracted text, retrying the whole call up
    /// to `max_retries` times with 2s/4s/8s backoff before giving up and
    /// returning a fallback record.
    pub async fn analyze(
        &self,
        filename: &str,
        text: &str,
        extraction_method: &str,
        page_count: i64,
        word_count: i64,
    ) -> DocumentMetadata {
        if !self.llm.is_available() {
            return DocumentMetadata::fallback(extraction_method, page_count, word_count);
        }

        let truncated = truncate_chars(text, self.max_input_chars);

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay_secs = 2u64.pow(attempt);
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            }

            match self.try_analyze(filename, &truncated).await {
                Ok(metadata) => {
                    return DocumentMetadata {
                        page_count,
                        word_count,
                        extraction_method: extraction_method.to_string(),
                        ..metadata
                    }
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "analyzer attempt failed");
                }
            }
        }

        tracing::warn!(filename, "analyzer exhausted retries, using fallback record");
        DocumentMetadata::fallback(extraction_method, page_count, word_count)
    }

    async fn try_analyze(&self, filename: &str, text: &str) -> crate::error::Result<DocumentMetadata> {
        let prompt = format!(
            "{}\n\n{}",
            prompts::analyzer_system_prompt(),
            prompts::analyzer_user_prompt(filename, text)
        );

        let raw_response = self.llm.complete(&prompt, None).await?;
        let cleaned = strip_code_fence(&raw_response);
        let raw: RawAnalysis = serde_json::from_str(&cleaned)
            .map_err(|e| crate::error::IntakeError::Llm(format!("unparseable analyzer response: {e}")))?;

        Ok(DocumentMetadata {
            schema_version: crate::models::METADATA_SCHEMA_VERSION,
            doctype: raw
                .doctype
                .as_deref()
                .map(prompts::parse_doctype)
                .unwrap_or_default(),
            classification_confidence: raw.classification_confidence.unwrap_or(DEFAULT_CONFIDENCE),
            extraction_method: String::new(),
            page_count: 0,
            word_count: 0,
            executive_summary: raw.executive_summary.unwrap_or_default(),
            main_arguments: raw.main_arguments,
            requested_relief: raw.requested_relief,
            entities: Entities {
                parties: raw.entities.parties,
                dates: raw.entities.dates,
                authorities: raw.entities.authorities,
            },
            relevance_scores: Default::default(),
            relationships: Relationships::default(),
        })
    }
}

/// Strips a ```json ... ``` or ``` ... ``` fence if the model wrapped its
/// response in one, tolerating the common case where `complete_json` was
/// handed fenced text instead of bare JSON.
fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed.strip_prefix("```json") {
        return inner.trim_end_matches("```").trim().to_string();
    }
    if let Some(inner) = trimmed.strip_prefix("```") {
        return inner.trim_end_matches("```").trim().to_string();
    }
    trimmed.to_string()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            poll_interval_secs: 10,
            extract_timeout_secs: 120,
            analyze_timeout_secs: 120,
            analyze_max_retries: 1,
            analyze_max_input_chars: 50_000,
            index_timeout_secs: 60,
        }
    }

    #[tokio::test]
    async fn analyze_falls_back_when_llm_unavailable() {
        let analyzer = Analyzer::new(LlmProvider::unavailable("no key configured"), &test_config());
        let metadata = analyzer.analyze("motion.pdf", "some text", "pdf", 1, 10).await;
        assert_eq!(metadata.doctype, crate::models::DocumentClassification::Unknown);
        assert_eq!(metadata.classification_confidence, 0.0);
        assert_eq!(metadata.page_count, 1);
        assert_eq!(metadata.word_count, 10);
    }

    #[test]
    fn strip_code_fence_unwraps_json_fence() {
        let fenced = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fence(fenced), "{\"a\": 1}");
    }

    #[test]
    fn strip_code_fence_passes_through_bare_json() {
        let bare = "{\"a\": 1}";
        assert_eq!(strip_code_fence(bare), "{\"a\": 1}");
    }

    #[test]
    fn truncate_chars_respects_char_boundary() {
        let text = "hello world";
        assert_eq!(truncate_chars(text, 5), "hello");
        assert_eq!(truncate_chars(text, 100), "hello world");
    }
}
