use crate::error::{IntakeError, Result};

use super::ExtractedText;

pub fn extract(bytes: &[u8]) -> Result<ExtractedText> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| IntakeError::Processing(format!("PDF extraction failed: {e}")))?;

    Ok(ExtractedText::from_text(text))
}
