use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Case, Document, ProcessingStatus, SummaryStatus};

/// Per-case document-count breakdown by processing status (spec.md §6.1
/// `GET .../documents/stats`).
#[derive(Debug, Clone, Default)]
pub struct DocumentStats {
    pub total: u64,
    pub pending: u64,
    pub extracting: u64,
    pub analyzing: u64,
    pub indexing: u64,
    pub complete: u64,
    pub failed: u64,
}

/// CRUD and query operations for cases.
#[async_trait]
pub trait CaseStore: Send + Sync {
    async fn create_case(&self, case: &Case) -> Result<()>;
    async fn get_case_by_id(&self, id: &str) -> Result<Option<Case>>;
    async fn delete_case(&self, id: &str) -> Result<bool>;

    /// Sets `summary_status = generating`, serving as the admission-control
    /// gate described in spec.md §4.3. Returns `false` (no row updated) if
    /// the case was already `generating` — callers map that to a 409.
    async fn try_begin_summary_generation(&self, case_id: &str) -> Result<bool>;

    /// Records a successful generation: `summary_status=generated`,
    /// `summary_generated_at=now`, `summary_version += 1`,
    /// `summary_document_count = document_count`.
    async fn complete_summary_generation(&self, case_id: &str, document_count: i64) -> Result<()>;

    /// Records a failed generation: `summary_status=failed`. Does not touch
    /// `summary_version` or `summary_generated_at`.
    async fn fail_summary_generation(&self, case_id: &str) -> Result<()>;

    /// Conditional compare-and-set used by the Staleness Propagator
    /// (spec.md §4.4): only transitions `generated -> stale`, a no-op
    /// otherwise. Returns whether a row was changed.
    async fn mark_summary_stale_if_generated(&self, case_id: &str) -> Result<bool>;
}

/// CRUD and query operations for documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(&self, doc: &Document) -> Result<()>;
    async fn get_document_by_id(&self, id: &str) -> Result<Option<Document>>;
    async fn list_documents_for_case(&self, case_id: &str) -> Result<Vec<Document>>;
    /// Documents uploaded strictly after `after`, used by Summary Engine's
    /// `update` operation (spec.md §4.3).
    async fn list_documents_for_case_uploaded_after(
        &self,
        case_id: &str,
        after: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<Document>>;
    async fn list_complete_documents_for_case(&self, case_id: &str) -> Result<Vec<Document>>;
    async fn update_document(&self, doc: &Document) -> Result<()>;
    async fn delete_document(&self, id: &str) -> Result<bool>;
    async fn document_stats_for_case(&self, case_id: &str) -> Result<DocumentStats>;

    /// Documents left in a non-terminal stage, used by the Coordinator's
    /// crash-recovery sweep (spec.md §4.2).
    async fn get_documents_in_flight(&self) -> Result<Vec<Document>>;

    async fn update_document_status(
        &self,
        id: &str,
        status: ProcessingStatus,
        error: Option<&str>,
    ) -> Result<()>;
}

/// A complete database backend combining all store traits plus lifecycle
/// operations (initialization, replication sync).
#[async_trait]
pub trait CatalogBackend: CaseStore + DocumentStore {
    /// Sync with remote (e.g. Turso replication). No-op for local-only
    /// backends.
    async fn sync(&self) -> Result<()>;
}

/// Read-only helper used by status queries so `SummaryStatus` round-trips
/// through the Catalog's `TEXT` column representation.
pub fn summary_status_to_column(status: Option<SummaryStatus>) -> Option<String> {
    status.map(|s| s.to_string())
}

pub fn summary_status_from_column(value: Option<String>) -> Result<Option<SummaryStatus>> {
    match value {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(crate::error::IntakeError::Internal),
    }
}
