use serde::Deserialize;
use std::env;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub blob_store: BlobStoreConfig,
    pub cache_fs: CacheFsConfig,
    pub pipeline: PipelineConfig,
    pub summary: SummaryConfig,
    pub ocr: OcrConfig,
    pub transcription: TranscriptionConfig,
    pub llm: Option<LlmConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
    pub local_path: Option<String>,
}

/// Object storage for original and extracted document bytes.
#[derive(Debug, Clone, Deserialize)]
pub struct BlobStoreConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub presigned_url_ttl_secs: u64,
}

/// Per-case scratch workspace used for summary generation and extraction
/// intermediates (spec.md §6.3).
#[derive(Debug, Clone, Deserialize)]
pub struct CacheFsConfig {
    pub root: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Interval for the crash-recovery sweep that re-queues documents stuck
    /// in a non-terminal stage.
    pub poll_interval_secs: u64,
    pub extract_timeout_secs: u64,
    pub analyze_timeout_secs: u64,
    pub analyze_max_retries: u32,
    pub analyze_max_input_chars: usize,
    pub index_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryConfig {
    pub batch_size: usize,
    pub inter_batch_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub languages: String,
    pub timeout_secs: u64,
    pub max_image_dimension: u32,
    pub min_image_dimension: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model_path: Option<String>,
    pub timeout_secs: u64,
    pub max_file_size: u64,
    pub max_duration_secs: u64,
}

/// LLM configuration for the Analyzer's metadata-extraction calls.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            model: "local/whisper-small".to_string(),
            api_key: None,
            base_url: None,
            model_path: None,
            timeout_secs: 300,
            max_file_size: 104857600,
            max_duration_secs: 7200,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("INTAKE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("INTAKE_PORT", 3000),
                api_keys: env::var("INTAKE_API_KEYS")
                    .map(|keys| keys.split(',').map(|s| s.trim().to_string()).collect())
                    .unwrap_or_default(),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "file:intake.db".to_string()),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
                local_path: env::var("DATABASE_LOCAL_PATH").ok(),
            },
            blob_store: BlobStoreConfig {
                bucket: env::var("BLOB_STORE_BUCKET")
                    .unwrap_or_else(|_| "intake-documents".to_string()),
                region: env::var("BLOB_STORE_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                endpoint: env::var("BLOB_STORE_ENDPOINT").ok(),
                presigned_url_ttl_secs: parse_env_or("BLOB_STORE_PRESIGNED_URL_TTL_SECS", 900),
            },
            cache_fs: CacheFsConfig {
                root: env::var("CACHE_FS_ROOT")
                    .unwrap_or_else(|_| "/var/lib/intake/cache".to_string()),
            },
            pipeline: PipelineConfig {
                poll_interval_secs: parse_env_or("PIPELINE_POLL_INTERVAL_SECS", 10),
                extract_timeout_secs: parse_env_or("EXTRACT_TIMEOUT_SECS", 120),
                analyze_timeout_secs: parse_env_or("ANALYZE_TIMEOUT_SECS", 120),
                analyze_max_retries: parse_env_or("ANALYZE_MAX_RETRIES", 3),
                analyze_max_input_chars: parse_env_or("ANALYZE_MAX_INPUT_CHARS", 50_000),
                index_timeout_secs: parse_env_or("INDEX_TIMEOUT_SECS", 60),
            },
            summary: SummaryConfig {
                batch_size: parse_env_or("SUMMARY_BATCH_SIZE", 5),
                inter_batch_delay_ms: parse_env_or("SUMMARY_INTER_BATCH_DELAY_MS", 2000),
            },
            ocr: OcrConfig {
                model: env::var("OCR_MODEL").unwrap_or_else(|_| "local/tesseract".to_string()),
                api_key: env::var("OCR_API_KEY").ok(),
                base_url: env::var("OCR_BASE_URL").ok(),
                languages: env::var("OCR_LANGUAGES").unwrap_or_else(|_| "eng".to_string()),
                timeout_secs: parse_env_or("OCR_TIMEOUT", 60),
                max_image_dimension: parse_env_or("OCR_MAX_DIMENSION", 4096),
                min_image_dimension: parse_env_or("OCR_MIN_DIMENSION", 50),
            },
            transcription: TranscriptionConfig {
                model: env::var("TRANSCRIPTION_MODEL")
                    .unwrap_or_else(|_| "local/whisper-small".to_string()),
                api_key: env::var("TRANSCRIPTION_API_KEY").ok(),
                base_url: env::var("TRANSCRIPTION_BASE_URL").ok(),
                model_path: env::var("TRANSCRIPTION_MODEL_PATH").ok(),
                timeout_secs: parse_env_or("TRANSCRIPTION_TIMEOUT", 300),
                max_file_size: parse_env_or("TRANSCRIPTION_MAX_FILE_SIZE", 104857600),
                max_duration_secs: parse_env_or("TRANSCRIPTION_MAX_DURATION", 7200),
            },
            llm: env::var("LLM_MODEL").ok().map(|model| LlmConfig {
                model,
                api_key: env::var("LLM_API_KEY").ok(),
                base_url: env::var("LLM_BASE_URL").ok(),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 120),
                max_retries: parse_env_or("LLM_MAX_RETRIES", 3),
            }),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs.
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse an LLM model name into a `(provider, model)` tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    ("local", model)
}

/// Known OCR/transcription providers that use OpenAI-compatible APIs.
const KNOWN_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio", "local"];

/// Parse a model name into a `(provider, model)` tuple.
pub fn parse_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    ("local", model)
}
