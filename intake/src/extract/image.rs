use crate::config::OcrConfig;
use crate::error::Result;
use crate::ocr::{preprocess_image, OcrProvider};

use super::ExtractedText;

pub async fn extract(bytes: &[u8], ocr: &OcrProvider, config: &OcrConfig) -> Result<ExtractedText> {
    let processed = preprocess_image(bytes, config)?;
    let text = ocr.ocr(&processed).await?;
    Ok(ExtractedText::from_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> OcrConfig {
        OcrConfig {
            model: "local/tesseract".to_string(),
            api_key: None,
            base_url: None,
            languages: "eng".to_string(),
            timeout_secs: 60,
            max_image_dimension: 4096,
            min_image_dimension: 50,
        }
    }

    fn create_test_png(width: u32, height: u32) -> Vec<u8> {
        use image::{DynamicImage, ImageFormat};
        let img = DynamicImage::new_rgb8(width, height);
        let mut output = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
            .unwrap();
        output
    }

    #[tokio::test]
    async fn extract_handles_zero_text_image() {
        let image_data = create_test_png(100, 100);
        let config = create_test_config();
        let ocr = OcrProvider::new(&config).expect("failed to create OCR provider");

        let result = extract(&image_data, &ocr, &config).await;

        assert!(result.is_ok(), "should handle zero-text images gracefully");
        assert_eq!(result.unwrap().word_count, 0);
    }

    #[tokio::test]
    async fn extract_returns_error_for_invalid_image() {
        let invalid_data = vec![0u8, 1, 2, 3, 4, 5];
        let config = create_test_config();
        let ocr = OcrProvider::new(&config).expect("failed to create OCR provider");

        let result = extract(&invalid_data, &ocr, &config).await;

        assert!(result.is_err(), "should reject invalid image data");
    }

    #[tokio::test]
    async fn extract_returns_error_for_tiny_image() {
        let tiny_image = create_test_png(10, 10);
        let config = create_test_config();
        let ocr = OcrProvider::new(&config).expect("failed to create OCR provider");

        let result = extract(&tiny_image, &ocr, &config).await;

        assert!(result.is_err(), "should reject tiny images");
    }
}
