use std::sync::Arc;

use crate::analyze::Analyzer;
use crate::config::Config;
use crate::db::CatalogBackend;
use crate::llm::LlmProvider;
use crate::ocr::OcrProvider;
use crate::pipeline::Coordinator;
use crate::progress::ProgressBus;
use crate::storage::{BlobStore, CacheFs};
use crate::summary::SummaryEngine;
use crate::transcription::TranscriptionProvider;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<dyn CatalogBackend>,
    pub blob_store: Arc<dyn BlobStore>,
    pub cache_fs: Arc<CacheFs>,
    pub llm: LlmProvider,
    pub coordinator: Arc<Coordinator>,
    pub summary: Arc<SummaryEngine>,
    pub progress: ProgressBus,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: Arc<dyn CatalogBackend>,
        blob_store: Arc<dyn BlobStore>,
        cache_fs: Arc<CacheFs>,
        ocr: OcrProvider,
        transcription: TranscriptionProvider,
        llm: LlmProvider,
    ) -> Self {
        let config = Arc::new(config);
        let progress = ProgressBus::new();

        let analyzer = Analyzer::new(llm.clone(), &config.pipeline);
        let coordinator = Arc::new(Coordinator::new(
            catalog.clone(),
            blob_store.clone(),
            analyzer,
            progress.clone(),
            ocr,
            config.ocr.clone(),
            transcription,
            config.transcription.clone(),
            &config.pipeline,
        ));

        let summary = Arc::new(SummaryEngine::new(
            catalog.clone(),
            cache_fs.clone(),
            llm.clone(),
            progress.clone(),
            &config.summary,
        ));

        Self {
            config,
            catalog,
            blob_store,
            cache_fs,
            llm,
            coordinator,
            summary,
            progress,
        }
    }
}
