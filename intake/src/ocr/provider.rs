use std::sync::Arc;
use std::time::Duration;

use leptess::LepTess;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::OcrConfig;
use crate::error::{IntakeError, Result};

use super::api::{DeepSeekOcrClient, MistralOcrClient, OpenAiVisionClient};

#[derive(Clone)]
enum OcrApiClient {
    Mistral(MistralOcrClient),
    DeepSeek(DeepSeekOcrClient),
    OpenAi(OpenAiVisionClient),
}

impl OcrApiClient {
    async fn ocr(&self, image_bytes: &[u8]) -> Result<String> {
        match self {
            OcrApiClient::Mistral(c) => c.ocr(image_bytes).await,
            OcrApiClient::DeepSeek(c) => c.ocr(image_bytes).await,
            OcrApiClient::OpenAi(c) => c.ocr(image_bytes).await,
        }
    }
}

enum OcrBackend {
    Local { tesseract: Arc<Mutex<LepTess>> },
    Api { client: OcrApiClient },
    Unavailable { reason: String },
}

pub struct OcrProvider {
    backend: OcrBackend,
    config: OcrConfig,
}

fn create_tesseract(languages: &str) -> std::result::Result<LepTess, String> {
    LepTess::new(None, languages).map_err(|e| e.to_string())
}

impl OcrProvider {
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let model_lower = config.model.to_lowercase();
        let provider_prefix = model_lower.split('/').next().unwrap_or("local");

        let backend = match provider_prefix {
            "mistral" => match MistralOcrClient::new(config) {
                Ok(client) => {
                    info!("Mistral OCR API backend initialized");
                    OcrBackend::Api {
                        client: OcrApiClient::Mistral(client),
                    }
                }
                Err(e) => {
                    let reason = format!("Mistral OCR backend unavailable: {e}");
                    warn!("{}", reason);
                    OcrBackend::Unavailable { reason }
                }
            },
            "deepseek" => match DeepSeekOcrClient::new(config) {
                Ok(client) => {
                    info!("DeepSeek OCR API backend initialized");
                    OcrBackend::Api {
                        client: OcrApiClient::DeepSeek(client),
                    }
                }
                Err(e) => {
                    let reason = format!("DeepSeek OCR backend unavailable: {e}");
                    warn!("{}", reason);
                    OcrBackend::Unavailable { reason }
                }
            },
            "openai" => match OpenAiVisionClient::new(config) {
                Ok(client) => {
                    info!("OpenAI Vision OCR API backend initialized");
                    OcrBackend::Api {
                        client: OcrApiClient::OpenAi(client),
                    }
                }
                Err(e) => {
                    let reason = format!("OpenAI Vision OCR backend unavailable: {e}");
                    warn!("{}", reason);
                    OcrBackend::Unavailable { reason }
                }
            },
            _ => match create_tesseract(&config.languages) {
                Ok(lt) => {
                    info!(languages = %config.languages, "Tesseract OCR initialized");
                    OcrBackend::Local {
                        tesseract: Arc::new(Mutex::new(lt)),
                    }
                }
                Err(e) => {
                    let reason = format!("Tesseract not available: {e}");
                    warn!("{}", reason);
                    OcrBackend::Unavailable { reason }
                }
            },
        };

        Ok(Self {
            backend,
            config: config.clone(),
        })
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backend, OcrBackend::Unavailable { .. })
    }

    pub async fn ocr(&self, image_bytes: &[u8]) -> Result<String> {
        let timeout_duration = Duration::from_secs(self.config.timeout_secs);

        let result = tokio::time::timeout(timeout_duration, self.ocr_internal(image_bytes)).await;

        match result {
            Ok(inner_result) => inner_result,
            Err(_) => Err(IntakeError::Ocr(format!(
                "OCR operation timed out after {} seconds",
                self.config.timeout_secs
            ))),
        }
    }

    async fn ocr_internal(&self, image_bytes: &[u8]) -> Result<String> {
        match &self.backend {
            OcrBackend::Local { tesseract } => {
                let bytes = image_bytes.to_vec();
                let tesseract = Arc::clone(tesseract);

                let text = tokio::task::spawn_blocking(move || {
                    let mut lt = tesseract.blocking_lock();
                    lt.set_image_from_mem(&bytes)
                        .map_err(|e| IntakeError::Ocr(format!("Failed to set image: {e}")))?;
                    lt.get_utf8_text()
                        .map_err(|e| IntakeError::Ocr(format!("Failed to extract text: {e}")))
                })
                .await
                .map_err(|e| IntakeError::Ocr(format!("OCR task panicked: {e}")))??;

                Ok(text.trim().to_string())
            }
            OcrBackend::Api { client } => client.ocr(image_bytes).await,
            OcrBackend::Unavailable { reason } => Err(IntakeError::OcrUnavailable(reason.clone())),
        }
    }
}

impl Clone for OcrProvider {
    fn clone(&self) -> Self {
        match &self.backend {
            OcrBackend::Local { tesseract } => Self {
                backend: OcrBackend::Local {
                    tesseract: Arc::clone(tesseract),
                },
                config: self.config.clone(),
            },
            OcrBackend::Api { client } => Self {
                backend: OcrBackend::Api {
                    client: client.clone(),
                },
                config: self.config.clone(),
            },
            OcrBackend::Unavailable { reason } => Self {
                backend: OcrBackend::Unavailable {
                    reason: reason.clone(),
                },
                config: self.config.clone(),
            },
        }
    }
}
