use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use intake::api::AppState;
use intake::config::{
    BlobStoreConfig, CacheFsConfig, Config, DatabaseConfig, OcrConfig, PipelineConfig,
    ServerConfig, SummaryConfig, TranscriptionConfig,
};
use intake::db::{CatalogBackend, Database, LibSqlCatalog};
use intake::llm::LlmProvider;
use intake::ocr::OcrProvider;
use intake::storage::{BlobStore, CacheFs, S3BlobStore};
use intake::transcription::TranscriptionProvider;

/// Builds an `AppState` backed by an in-memory database and a temp-dir cache fs,
/// the same shape the v1 router's own unit tests use, for integration tests that
/// need to drive real HTTP requests through the router.
pub async fn test_state(api_keys: Vec<String>) -> AppState {
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            api_keys,
        },
        database: DatabaseConfig {
            url: "file::memory:".to_string(),
            auth_token: None,
            local_path: None,
        },
        blob_store: BlobStoreConfig {
            bucket: "test-bucket".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
            presigned_url_ttl_secs: 900,
        },
        cache_fs: CacheFsConfig {
            root: std::env::temp_dir().to_string_lossy().into_owned(),
        },
        pipeline: PipelineConfig {
            poll_interval_secs: 10,
            extract_timeout_secs: 120,
            analyze_timeout_secs: 120,
            analyze_max_retries: 3,
            analyze_max_input_chars: 50_000,
            index_timeout_secs: 60,
        },
        summary: SummaryConfig {
            batch_size: 5,
            inter_batch_delay_ms: 0,
        },
        ocr: OcrConfig {
            model: "local/tesseract".to_string(),
            api_key: None,
            base_url: None,
            languages: "eng".to_string(),
            timeout_secs: 60,
            max_image_dimension: 4096,
            min_image_dimension: 50,
        },
        transcription: TranscriptionConfig::default(),
        llm: None,
    };

    let db = Database::new(&config.database).await.unwrap();
    let catalog: Arc<dyn CatalogBackend> = Arc::new(LibSqlCatalog::new(db));
    let blob_store: Arc<dyn BlobStore> = Arc::new(S3BlobStore::new(&config.blob_store).await);
    let cache_fs = Arc::new(CacheFs::new(&config.cache_fs));
    let ocr = OcrProvider::new(&config.ocr).unwrap();
    let transcription = TranscriptionProvider::new(&config.transcription).unwrap();
    let llm = LlmProvider::new(config.llm.as_ref());

    AppState::new(config, catalog, blob_store, cache_fs, ocr, transcription, llm)
}

/// Get the path to a fixture file
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load a fixture file as bytes
pub fn load_fixture(name: &str) -> Vec<u8> {
    let path = fixture_path(name);
    fs::read(&path).unwrap_or_else(|e| panic!("Failed to load fixture '{name}': {e}"))
}

/// Ensure all fixture files exist, generating them if necessary
pub fn ensure_fixtures() {
    let fixtures_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures");

    fs::create_dir_all(&fixtures_dir).expect("Failed to create fixtures directory");

    let txt_path = fixtures_dir.join("sample.txt");
    if !txt_path.exists() {
        generate_txt_fixture(&txt_path);
    }

    let md_path = fixtures_dir.join("sample.md");
    if !md_path.exists() {
        generate_md_fixture(&md_path);
    }

    let docx_path = fixtures_dir.join("sample.docx");
    if !docx_path.exists() {
        generate_docx_fixture(&docx_path);
    }

    let png_path = fixtures_dir.join("sample.png");
    if !png_path.exists() {
        generate_png_fixture(&png_path);
    }
}

fn generate_txt_fixture(path: &Path) {
    let content = "AGREEMENT\n\nThis is a plain-text exhibit used for extraction tests.\nIt contains multiple lines and paragraphs of text.\n";
    fs::write(path, content).expect("Failed to write TXT fixture");
}

fn generate_md_fixture(path: &Path) {
    let content = "# Exhibit A\n\nThis is a markdown exhibit used for extraction tests.\n\n- item one\n- item two\n";
    fs::write(path, content).expect("Failed to write Markdown fixture");
}

fn generate_docx_fixture(path: &Path) {
    use docx_rs::*;

    let docx = Docx::new()
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("AGREEMENT").bold()))
        .add_paragraph(
            Paragraph::new().add_run(Run::new().add_text("This is a test document for intake.")),
        )
        .add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text("It contains multiple paragraphs of text.")),
        );

    let mut buffer = Cursor::new(Vec::new());
    docx.build().pack(&mut buffer).expect("Failed to pack DOCX");
    fs::write(path, buffer.into_inner()).expect("Failed to write DOCX fixture");
}

/// A minimal valid 1x1 white PNG, used to exercise the image extraction path
/// without depending on a real scanned document.
fn generate_png_fixture(path: &Path) {
    const PNG_1X1_WHITE: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
        0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08, 0xD7, 0x63, 0xF8,
        0xFF, 0xFF, 0x3F, 0x00, 0x05, 0xFE, 0x02, 0xFE, 0xDC, 0xCC, 0x59, 0xE7, 0x00, 0x00, 0x00,
        0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];
    fs::write(path, PNG_1X1_WHITE).expect("Failed to write PNG fixture");
}
