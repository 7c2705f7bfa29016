//! The Summary Engine (spec.md §4.3): builds and maintains a case's running
//! narrative summary from its documents' extracted metadata, and the
//! Staleness Propagator (spec.md §4.4) that invalidates it.
//!
//! Generation runs in batches of `summary.batch_size` documents, folding
//! each batch into the running narrative with a merge pass rather than
//! summarizing everything in one LLM call.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::SummaryConfig;
use crate::db::CatalogBackend;
use crate::error::{IntakeError, Result};
use crate::llm::{prompts, LlmProvider};
use crate::models::{Case, Document, ProgressEvent, ProgressEventKind};
use crate::progress::ProgressBus;
use crate::storage::CacheFs;

pub struct SummaryEngine {
    catalog: Arc<dyn CatalogBackend>,
    cache_fs: Arc<CacheFs>,
    llm: LlmProvider,
    progress: ProgressBus,
    batch_size: usize,
    inter_batch_delay: Duration,
    in_flight: std::sync::Mutex<HashSet<String>>,
}

impl SummaryEngine {
    pub fn new(
        catalog: Arc<dyn CatalogBackend>,
        cache_fs: Arc<CacheFs>,
        llm: LlmProvider,
        progress: ProgressBus,
        config: &SummaryConfig,
    ) -> Self {
        Self {
            catalog,
            cache_fs,
            llm,
            progress,
            batch_size: config.batch_size.max(1),
            inter_batch_delay: Duration::from_millis(config.inter_batch_delay_ms),
            in_flight: std::sync::Mutex::new(HashSet::new()),
        }
    }

    /// Builds a fresh narrative from every complete document in the case,
    /// discarding any previous narrative.
    pub async fn generate(&self, case: &Case) -> Result<()> {
        let _guard = self.claim(&case.id).await?;
        let documents = self.catalog.list_complete_documents_for_case(&case.id).await?;
        let count = documents.len() as i64;
        self.run(case, documents, String::new(), count).await
    }

    /// Re-runs `generate` unconditionally, even if the case's summary is not
    /// currently stale — used for the user-triggered "regenerate" action.
    pub async fn regenerate(&self, case: &Case) -> Result<()> {
        self.generate(case).await
    }

    /// Folds only documents uploaded since the last successful generation
    /// into the existing narrative. Falls back to a full `generate` if the
    /// case has never been summarized.
    pub async fn update(&self, case: &Case) -> Result<()> {
        let Some(generated_at) = case.summary_generated_at else {
            return self.generate(case).await;
        };

        let _guard = self.claim(&case.id).await?;
        let new_documents = self
            .catalog
            .list_documents_for_case_uploaded_after(&case.id, generated_at)
            .await?;

        if new_documents.is_empty() {
            self.catalog
                .complete_summary_generation(&case.id, case.summary_document_count)
                .await?;
            return Ok(());
        }

        let starting_narrative = self.cache_fs.read_summary(&case.id).await?.unwrap_or_default();
        let total = case.summary_document_count + new_documents.len() as i64;
        self.run(case, new_documents, starting_narrative, total).await
    }

    /// Admission control: the Catalog's compare-and-set is authoritative
    /// (spec.md §4.3), this in-process set only short-circuits a second
    /// request for the same case before it reaches the database.
    async fn claim(&self, case_id: &str) -> Result<InFlightGuard<'_>> {
        let inserted = self.in_flight.lock().unwrap().insert(case_id.to_string());
        if !inserted {
            return Err(IntakeError::Conflict(format!("summary generation already running for case {case_id}")));
        }

        if !self.catalog.try_begin_summary_generation(case_id).await? {
            self.in_flight.lock().unwrap().remove(case_id);
            return Err(IntakeError::Conflict(format!("summary generation already running for case {case_id}")));
        }

        Ok(InFlightGuard {
            engine: self,
            case_id: case_id.to_string(),
        })
    }

    async fn run(&self, case: &Case, documents: Vec<Document>, starting_narrative: String, total_document_count: i64) -> Result<()> {
        self.progress
            .publish(ProgressEvent::summary(ProgressEventKind::SummaryGenerating, &case.id, 0, "summary generation started"))
            .await;

        match self.summarize_batches(case, &documents, starting_narrative).await {
            Ok(narrative) => {
                self.cache_fs.write_summary(&case.id, &narrative).await?;
                self.catalog.complete_summary_generation(&case.id, total_document_count).await?;
                self.progress
                    .publish(ProgressEvent::summary(ProgressEventKind::SummaryComplete, &case.id, 100, "summary generation complete"))
                    .await;
                Ok(())
            }
            Err(e) => {
                let _ = self.catalog.fail_summary_generation(&case.id).await;
                self.progress.publish(ProgressEvent::summary_failed(&case.id, e.to_string())).await;
                Err(e)
            }
        }
    }

    async fn summarize_batches(&self, case: &Case, documents: &[Document], starting_narrative: String) -> Result<String> {
        if documents.is_empty() {
            return Ok(starting_narrative);
        }

        if !self.llm.is_available() {
            return Err(IntakeError::LlmUnavailable("no LLM configured for summary generation".to_string()));
        }

        let batches: Vec<&[Document]> = documents.chunks(self.batch_size).collect();
        let batch_count = batches.len();
        let mut narrative = starting_narrative;

        for (i, batch) in batches.into_iter().enumerate() {
            let excerpts = self.batch_excerpts(case, batch).await?;
            let batch_prompt = prompts::summary_batch_prompt(&case.title, &excerpts);
            let batch_summary = self.llm.complete(&batch_prompt, None).await?;

            let merge_prompt = prompts::summary_merge_prompt(&case.title, &narrative, &batch_summary);
            narrative = self.llm.complete(&merge_prompt, None).await?;

            let percent = (((i + 1) as f32 / batch_count as f32) * 90.0) as u8;
            self.progress
                .publish(ProgressEvent::summary(
                    ProgressEventKind::SummaryGenerating,
                    &case.id,
                    percent,
                    format!("batch {}/{batch_count}", i + 1),
                ))
                .await;

            if i + 1 < batch_count {
                tokio::time::sleep(self.inter_batch_delay).await;
            }
        }

        Ok(narrative)
    }

    /// Reads each document's persisted `executive_summary` out of its
    /// `metadata.json` (spec.md §6.3) rather than re-reading the full
    /// extracted text.
    async fn batch_excerpts(&self, case: &Case, batch: &[Document]) -> Result<Vec<(String, String)>> {
        let mut excerpts = Vec::with_capacity(batch.len());
        for doc in batch {
            let path = std::path::Path::new(&case.workspace_path)
                .join("documents")
                .join(&doc.folder_name)
                .join("metadata.json");

            let excerpt = match tokio::fs::read_to_string(&path).await {
                Ok(raw) => serde_json::from_str::<crate::models::DocumentMetadata>(&raw)
                    .map(|m| m.executive_summary)
                    .unwrap_or_default(),
                Err(_) => String::new(),
            };
            excerpts.push((doc.filename.clone(), excerpt));
        }
        Ok(excerpts)
    }
}

struct InFlightGuard<'a> {
    engine: &'a SummaryEngine,
    case_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.engine.in_flight.lock().unwrap().remove(&self.case_id);
    }
}

/// Marks a case's summary stale after a document finishes processing, if it
/// currently has a generated summary (spec.md §4.4). A no-op for cases with
/// no summary yet, or one that's already stale/generating/failed.
pub async fn propagate_staleness(catalog: &dyn CatalogBackend, case_id: &str) -> Result<bool> {
    catalog.mark_summary_stale_if_generated(case_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct AlwaysAdmitCatalog;

    #[async_trait]
    impl crate::db::CaseStore for AlwaysAdmitCatalog {
        async fn create_case(&self, _case: &Case) -> Result<()> {
            Ok(())
        }
        async fn get_case_by_id(&self, _id: &str) -> Result<Option<Case>> {
            Ok(None)
        }
        async fn delete_case(&self, _id: &str) -> Result<bool> {
            Ok(false)
        }
        async fn try_begin_summary_generation(&self, _case_id: &str) -> Result<bool> {
            Ok(true)
        }
        async fn complete_summary_generation(&self, _case_id: &str, _document_count: i64) -> Result<()> {
            Ok(())
        }
        async fn fail_summary_generation(&self, _case_id: &str) -> Result<()> {
            Ok(())
        }
        async fn mark_summary_stale_if_generated(&self, _case_id: &str) -> Result<bool> {
            Ok(false)
        }
    }

    #[async_trait]
    impl crate::db::DocumentStore for AlwaysAdmitCatalog {
        async fn create_document(&self, _doc: &Document) -> Result<()> {
            Ok(())
        }
        async fn get_document_by_id(&self, _id: &str) -> Result<Option<Document>> {
            Ok(None)
        }
        async fn list_documents_for_case(&self, _case_id: &str) -> Result<Vec<Document>> {
            Ok(vec![])
        }
        async fn list_documents_for_case_uploaded_after(
            &self,
            _case_id: &str,
            _after: DateTime<Utc>,
        ) -> Result<Vec<Document>> {
            Ok(vec![])
        }
        async fn list_complete_documents_for_case(&self, _case_id: &str) -> Result<Vec<Document>> {
            Ok(vec![])
        }
        async fn update_document(&self, _doc: &Document) -> Result<()> {
            Ok(())
        }
        async fn delete_document(&self, _id: &str) -> Result<bool> {
            Ok(false)
        }
        async fn document_stats_for_case(&self, _case_id: &str) -> Result<crate::db::DocumentStats> {
            Ok(crate::db::DocumentStats::default())
        }
        async fn get_documents_in_flight(&self) -> Result<Vec<Document>> {
            Ok(vec![])
        }
        async fn update_document_status(
            &self,
            _id: &str,
            _status: crate::models::ProcessingStatus,
            _error: Option<&str>,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl crate::db::CatalogBackend for AlwaysAdmitCatalog {
        async fn sync(&self) -> Result<()> {
            Ok(())
        }
    }

    fn test_engine() -> (SummaryEngine, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let cache_fs = Arc::new(CacheFs::new(&crate::config::CacheFsConfig {
            root: tmp.path().to_string_lossy().into_owned(),
        }));
        let engine = SummaryEngine::new(
            Arc::new(AlwaysAdmitCatalog),
            cache_fs,
            LlmProvider::unavailable("no llm in test"),
            ProgressBus::new(),
            &SummaryConfig {
                batch_size: 5,
                inter_batch_delay_ms: 0,
            },
        );
        (engine, tmp)
    }

    #[tokio::test]
    async fn second_concurrent_claim_for_same_case_is_rejected() {
        let (engine, _tmp) = test_engine();
        let first = engine.claim("case-1").await;
        assert!(first.is_ok());
        let second = engine.claim("case-1").await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn claim_is_released_on_drop_allowing_a_later_claim() {
        let (engine, _tmp) = test_engine();
        {
            let _guard = engine.claim("case-1").await.unwrap();
        }
        let second = engine.claim("case-1").await;
        assert!(second.is_ok());
    }
}
