use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::DocumentClassification;

/// Schema version for the metadata artifact. Bump whenever the JSON shape
/// changes in a way that isn't backward-compatible for readers.
pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// A named party appearing in a document (spec.md §3, entities.parties).
#[derive(Debug, Clone, Serialize, Deserialize, Default, utoipa::ToSchema)]
pub struct Party {
    pub name: String,
    pub role: String,
    pub mentions: u32,
}

/// A date reference extracted from a document.
#[derive(Debug, Clone, Serialize, Deserialize, Default, utoipa::ToSchema)]
pub struct DateEntry {
    pub date: String,
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// A legal-authority citation extracted from a document.
#[derive(Debug, Clone, Serialize, Deserialize, Default, utoipa::ToSchema)]
pub struct Authority {
    pub citation: String,
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, utoipa::ToSchema)]
pub struct Entities {
    #[serde(default)]
    pub parties: Vec<Party>,
    #[serde(default)]
    pub dates: Vec<DateEntry>,
    #[serde(default)]
    pub authorities: Vec<Authority>,
}

/// Cross-document relationships discovered by the Analyzer.
#[derive(Debug, Clone, Serialize, Deserialize, Default, utoipa::ToSchema)]
pub struct Relationships {
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub contradicts: Vec<String>,
    #[serde(default)]
    pub supports: Vec<String>,
}

/// The per-document metadata artifact written by the Analyzer and read by
/// the Summary Engine (spec.md §3). Persisted verbatim as JSON on Cache FS;
/// never mutated after write — a re-run replaces the file wholesale.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DocumentMetadata {
    pub schema_version: u32,
    pub doctype: DocumentClassification,
    pub classification_confidence: f32,
    pub extraction_method: String,
    pub page_count: i64,
    pub word_count: i64,
    pub executive_summary: String,
    #[serde(default)]
    pub main_arguments: Vec<String>,
    #[serde(default)]
    pub requested_relief: Vec<String>,
    #[serde(default)]
    pub entities: Entities,
    #[serde(default)]
    pub relevance_scores: HashMap<String, f32>,
    #[serde(default)]
    pub relationships: Relationships,
}

impl DocumentMetadata {
    /// The fallback record the Analyzer must produce when the LLM's output
    /// can't be parsed (spec.md §4.2 Analyzer contract).
    pub fn fallback(extraction_method: impl Into<String>, page_count: i64, word_count: i64) -> Self {
        Self {
            schema_version: METADATA_SCHEMA_VERSION,
            doctype: DocumentClassification::Unknown,
            classification_confidence: 0.0,
            extraction_method: extraction_method.into(),
            page_count,
            word_count,
            executive_summary: String::new(),
            main_arguments: Vec::new(),
            requested_relief: Vec::new(),
            entities: Entities::default(),
            relevance_scores: HashMap::new(),
            relationships: Relationships::default(),
        }
    }
}
