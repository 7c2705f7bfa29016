//! The Pipeline Coordinator (spec.md §4.2): drives a document through
//! `pending -> extracting -> analyzing -> indexing -> complete`, persisting
//! each transition to the Catalog before publishing it on the Progress Bus
//! (spec.md §9's persist-then-notify ordering — a subscriber must never see
//! a status the Catalog doesn't yet agree with), and failing the document to
//! `failed` on any stage error rather than leaving it stuck mid-flight.
//!
//! One document is one `tokio::spawn`ed task. A periodic sweep re-queues
//! documents `get_documents_in_flight` still finds in a non-terminal stage,
//! covering the case where a coordinator process died mid-run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::analyze::Analyzer;
use crate::config::{OcrConfig, PipelineConfig, TranscriptionConfig};
use crate::db::CatalogBackend;
use crate::error::{IntakeError, Result};
use crate::extract;
use crate::index::Indexer;
use crate::models::{Case, Document, ProcessingStatus, ProgressEvent, ProgressEventKind};
use crate::ocr::OcrProvider;
use crate::progress::ProgressBus;
use crate::storage::BlobStore;
use crate::transcription::TranscriptionProvider;

pub struct Coordinator {
    catalog: Arc<dyn CatalogBackend>,
    blob_store: Arc<dyn BlobStore>,
    analyzer: Analyzer,
    indexer: Indexer,
    progress: ProgressBus,
    ocr: OcrProvider,
    ocr_config: OcrConfig,
    transcription: TranscriptionProvider,
    transcription_config: TranscriptionConfig,
    poll_interval: Duration,
}

impl Coordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<dyn CatalogBackend>,
        blob_store: Arc<dyn BlobStore>,
        analyzer: Analyzer,
        progress: ProgressBus,
        ocr: OcrProvider,
        ocr_config: OcrConfig,
        transcription: TranscriptionProvider,
        transcription_config: TranscriptionConfig,
        pipeline_config: &PipelineConfig,
    ) -> Self {
        Self {
            catalog,
            blob_store,
            analyzer,
            indexer: Indexer::new(),
            progress,
            ocr,
            ocr_config,
            transcription,
            transcription_config,
            poll_interval: Duration::from_secs(pipeline_config.poll_interval_secs),
        }
    }

    /// Runs one document through the pipeline in a detached task. The
    /// caller (typically the upload handler) does not wait on this.
    pub fn spawn(self: &Arc<Self>, document_id: String) {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            coordinator.run_document(&document_id).await;
        });
    }

    /// Crash-recovery sweep: periodically re-spawns any document the
    /// Catalog still shows in a non-terminal stage.
    pub fn spawn_sweep_loop(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.poll_interval);
            loop {
                interval.tick().await;
                match self.catalog.get_documents_in_flight().await {
                    Ok(docs) => {
                        for doc in docs {
                            tracing::info!(document_id = %doc.id, status = %doc.processing_status, "resuming in-flight document");
                            self.spawn(doc.id);
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "crash-recovery sweep failed to list in-flight documents");
                    }
                }
            }
        });
    }

    async fn run_document(&self, document_id: &str) {
        let mut doc = match self.catalog.get_document_by_id(document_id).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                tracing::warn!(document_id, "document vanished before pipeline could run");
                return;
            }
            Err(e) => {
                tracing::error!(document_id, error = %e, "failed to load document for pipeline run");
                return;
            }
        };

        let case = match self.catalog.get_case_by_id(&doc.case_id).await {
            Ok(Some(case)) => case,
            Ok(None) => {
                tracing::warn!(case_id = %doc.case_id, "case vanished before pipeline could run");
                return;
            }
            Err(e) => {
                tracing::error!(case_id = %doc.case_id, error = %e, "failed to load case for pipeline run");
                return;
            }
        };

        if let Err(e) = self.run_stages(&mut doc, &case).await {
            tracing::warn!(document_id, error = %e, "pipeline run failed");
            doc.processing_status = ProcessingStatus::Failed;
            doc.error_message = Some(e.to_string());
            if let Err(persist_err) = self.catalog.update_document(&doc).await {
                tracing::error!(document_id, error = %persist_err, "failed to persist failed status");
            }
            self.progress
                .publish(ProgressEvent::document_error(&doc.case_id, &doc.id, &doc.filename, e.to_string()))
                .await;
        }
    }

    async fn run_stages(&self, doc: &mut Document, case: &Case) -> Result<()> {
        self.transition(doc, ProcessingStatus::Extracting, "extracting text").await?;

        let blob_key = doc
            .blob_key
            .clone()
            .ok_or_else(|| IntakeError::Processing("document has no blob key".to_string()))?;
        let original_bytes = self.blob_store.get(&blob_key).await?;

        let extracted = extract::extract(
            doc.file_type,
            &original_bytes,
            &self.ocr,
            &self.ocr_config,
            &self.transcription,
            &self.transcription_config,
        )
        .await?;

        write_workspace_text(case, doc, &original_bytes, &extracted.text).await?;

        doc.has_text_extraction = true;
        doc.page_count = extracted.page_count;
        doc.word_count = Some(extracted.word_count);

        self.transition(doc, ProcessingStatus::Analyzing, "analyzing document").await?;

        let metadata = self
            .analyzer
            .analyze(
                &doc.filename,
                &extracted.text,
                doc.file_type.as_str(),
                extracted.page_count.unwrap_or(0),
                extracted.word_count,
            )
            .await;
        write_workspace_metadata(case, doc, &metadata).await?;
        doc.document_type = Some(metadata.doctype);
        doc.has_metadata = true;

        self.transition(doc, ProcessingStatus::Indexing, "indexing document").await?;

        let index_result = self.indexer.index(&doc.case_id, &doc.id).await;
        doc.file_search_store_id = Some(index_result.file_search_store_id);
        doc.retrieval_file_uri = Some(index_result.retrieval_file_uri);
        doc.rag_indexed = true;

        doc.processing_status = ProcessingStatus::Complete;
        doc.processed_at = Some(Utc::now());
        self.catalog.update_document(doc).await?;
        self.progress
            .publish(ProgressEvent::document(
                ProgressEventKind::DocumentComplete,
                &doc.case_id,
                &doc.id,
                &doc.filename,
                ProcessingStatus::Complete.percent(),
                "processing complete",
            ))
            .await;

        self.catalog.mark_summary_stale_if_generated(&doc.case_id).await?;

        Ok(())
    }

    /// Persists `status` to the Catalog, then publishes it — the Catalog is
    /// always ahead of the Progress Bus, never behind it.
    async fn transition(&self, doc: &mut Document, status: ProcessingStatus, message: &str) -> Result<()> {
        doc.processing_status = status;
        self.catalog.update_document(doc).await?;

        let kind = match status {
            ProcessingStatus::Extracting => ProgressEventKind::DocumentExtracting,
            ProcessingStatus::Analyzing => ProgressEventKind::DocumentAnalyzing,
            ProcessingStatus::Indexing => ProgressEventKind::DocumentIndexing,
            ProcessingStatus::Pending | ProcessingStatus::Complete | ProcessingStatus::Failed => {
                unreachable!("transition is only called for in-flight stages")
            }
        };
        self.progress
            .publish(ProgressEvent::document(kind, &doc.case_id, &doc.id, &doc.filename, status.percent(), message))
            .await;
        Ok(())
    }
}

/// Layout from spec.md §6.3: `<workspace>/documents/<folder_slug>/...`.
fn document_dir(case: &Case, doc: &Document) -> PathBuf {
    Path::new(&case.workspace_path).join("documents").join(&doc.folder_name)
}

async fn write_workspace_text(case: &Case, doc: &Document, original_bytes: &[u8], text: &str) -> Result<()> {
    let dir = document_dir(case, doc);
    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(dir.join(format!("original.{}", doc.file_type.as_str())), original_bytes).await?;
    tokio::fs::write(dir.join("extracted-text.txt"), text).await?;
    Ok(())
}

async fn write_workspace_metadata(case: &Case, doc: &Document, metadata: &crate::models::DocumentMetadata) -> Result<()> {
    let dir = document_dir(case, doc);
    let json = serde_json::to_vec_pretty(metadata)?;
    tokio::fs::write(dir.join("metadata.json"), json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_dir_nests_under_documents_by_folder_slug() {
        let case = Case::new("c1".into(), "Smith v. Jones".into(), "u1".into(), "/ws/c1".into());
        let doc = Document::new("d1".into(), "c1".into(), "motion.pdf".into(), "motion".into(), crate::models::FileType::Pdf);
        assert_eq!(document_dir(&case, &doc), PathBuf::from("/ws/c1/documents/motion"));
    }
}
