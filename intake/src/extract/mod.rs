//! Extractor contract (spec.md §4.2, §9): `extract(file) -> (text, page_count, word_count)`.
//! Routes by `FileType`; OCR and transcription algorithms themselves are out of scope here —
//! this module only calls into the existing providers and normalizes their output.

mod audio;
mod docx;
mod image;
mod pdf;

use crate::config::{OcrConfig, TranscriptionConfig};
use crate::error::{IntakeError, Result};
use crate::models::FileType;
use crate::ocr::OcrProvider;
use crate::transcription::TranscriptionProvider;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: Option<i64>,
    pub word_count: i64,
}

impl ExtractedText {
    fn from_text(text: String) -> Self {
        let word_count = count_words(&text);
        let page_count = page_count_from_markers(&text).or(if text.trim().is_empty() { Some(0) } else { Some(1) });
        Self {
            text,
            page_count,
            word_count,
        }
    }
}

/// Derives page count from `--- Page N ---` marker lines (spec.md §9 OQ-1), falling back to a
/// floor of 1 for non-empty text handled by the caller.
fn page_count_from_markers(text: &str) -> Option<i64> {
    let count = text
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            trimmed.starts_with("--- Page ") && trimmed.ends_with("---")
        })
        .count();
    if count > 0 {
        Some(count as i64)
    } else {
        None
    }
}

fn count_words(text: &str) -> i64 {
    text.split_whitespace().count() as i64
}

#[allow(clippy::too_many_arguments)]
pub async fn extract(
    file_type: FileType,
    bytes: &[u8],
    ocr: &OcrProvider,
    ocr_config: &OcrConfig,
    transcription: &TranscriptionProvider,
    transcription_config: &TranscriptionConfig,
) -> Result<ExtractedText> {
    match file_type {
        FileType::Pdf => pdf::extract(bytes),
        FileType::Docx => docx::extract(bytes),
        FileType::Txt | FileType::Md => Ok(ExtractedText::from_text(
            String::from_utf8_lossy(bytes).into_owned(),
        )),
        FileType::Jpg | FileType::Png => image::extract(bytes, ocr, ocr_config).await,
        FileType::Mp3 | FileType::Wav | FileType::M4a => {
            audio::extract(bytes, transcription, transcription_config).await
        }
        FileType::Unknown => Err(IntakeError::Validation(
            "cannot extract an unsupported file type".to_string(),
        )),
    }
}
