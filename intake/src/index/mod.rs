//! The Indexer: assigns each document a retrieval identity after analysis
//! completes (spec.md §4.2 Indexer contract, SPEC_FULL.md OQ-2).
//!
//! This crate does not implement a real vector/full-text index — that's out
//! of scope per spec.md's Non-goals around retrieval/RAG internals. The
//! Indexer's job here is the part the spec does ask for: recording a
//! deterministic per-case store id and an opaque per-document retrieval URI
//! in the Catalog, the same two fields a real retrieval backend would be
//! looked up by.

#[derive(Debug, Clone, Default)]
pub struct Indexer;

/// What the Indexer recorded for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexResult {
    pub file_search_store_id: String,
    pub retrieval_file_uri: String,
}

impl Indexer {
    pub fn new() -> Self {
        Self
    }

    /// One retrieval store per case — every document in a case shares it.
    pub fn store_id_for_case(case_id: &str) -> String {
        format!("case-{case_id}")
    }

    /// `intake://<case_id>/<document_id>` is opaque to callers: nothing in
    /// this crate parses it back apart, it only round-trips as a key.
    pub fn uri_for_document(case_id: &str, document_id: &str) -> String {
        format!("intake://{case_id}/{document_id}")
    }

    pub async fn index(&self, case_id: &str, document_id: &str) -> IndexResult {
        IndexResult {
            file_search_store_id: Self::store_id_for_case(case_id),
            retrieval_file_uri: Self::uri_for_document(case_id, document_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn index_is_deterministic_per_case_and_document() {
        let indexer = Indexer::new();
        let a = indexer.index("case-1", "doc-1").await;
        let b = indexer.index("case-1", "doc-1").await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn documents_in_the_same_case_share_a_store_id() {
        let indexer = Indexer::new();
        let a = indexer.index("case-1", "doc-1").await;
        let b = indexer.index("case-1", "doc-2").await;
        assert_eq!(a.file_search_store_id, b.file_search_store_id);
        assert_ne!(a.retrieval_file_uri, b.retrieval_file_uri);
    }
}
