use crate::config::TranscriptionConfig;
use crate::error::{IntakeError, Result};
use crate::transcription::{AudioPreprocessor, TranscriptionProvider};

use super::ExtractedText;

pub async fn extract(
    bytes: &[u8],
    provider: &TranscriptionProvider,
    config: &TranscriptionConfig,
) -> Result<ExtractedText> {
    if bytes.is_empty() {
        return Err(IntakeError::Transcription("Empty audio data".to_string()));
    }

    if bytes.len() as u64 > config.max_file_size {
        return Err(IntakeError::Transcription(format!(
            "Audio file size {} exceeds limit {}",
            bytes.len(),
            config.max_file_size
        )));
    }

    if config.max_duration_secs > 0 {
        if let Ok((samples, sample_rate, channels)) = AudioPreprocessor::decode(bytes, None) {
            let total_frames = samples.len() / channels.max(1);
            let duration_secs = total_frames as u64 / sample_rate.max(1) as u64;
            if duration_secs > config.max_duration_secs {
                return Err(IntakeError::Transcription(format!(
                    "Audio duration {}s exceeds limit of {}s",
                    duration_secs, config.max_duration_secs
                )));
            }
        }
    }

    if !provider.is_available() {
        return Err(IntakeError::TranscriptionUnavailable(
            "Transcription provider not available".to_string(),
        ));
    }

    let text = provider.transcribe(bytes).await?;
    Ok(ExtractedText::from_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> TranscriptionConfig {
        TranscriptionConfig::default()
    }

    fn create_wav_bytes(duration_secs: u32, sample_rate: u32) -> Vec<u8> {
        let num_samples = duration_secs * sample_rate;
        let data_size = num_samples * 2;
        let file_size = 36 + data_size;
        let mut buf = Vec::with_capacity(file_size as usize + 8);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&sample_rate.to_le_bytes());
        buf.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        buf.extend_from_slice(&2u16.to_le_bytes());
        buf.extend_from_slice(&16u16.to_le_bytes());
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        buf.resize(buf.len() + data_size as usize, 0);

        buf
    }

    #[tokio::test]
    async fn extract_returns_error_for_empty_audio() {
        let config = create_test_config();
        let provider = TranscriptionProvider::unavailable("test");

        let result = extract(&[], &provider, &config).await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Empty"));
    }

    #[tokio::test]
    async fn extract_returns_error_when_provider_unavailable() {
        let audio_data = vec![0u8; 100];
        let config = create_test_config();
        let provider = TranscriptionProvider::unavailable("test unavailable");

        let result = extract(&audio_data, &provider, &config).await;

        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unavailable") || err.contains("not available"));
    }

    #[tokio::test]
    async fn extract_rejects_oversized_file() {
        let config = TranscriptionConfig {
            max_file_size: 100,
            ..TranscriptionConfig::default()
        };
        let provider = TranscriptionProvider::unavailable("test");
        let large_data = vec![0u8; 200];

        let result = extract(&large_data, &provider, &config).await;

        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("exceeds") || err.contains("size"));
    }

    #[tokio::test]
    async fn extract_rejects_audio_exceeding_duration_limit() {
        let config = TranscriptionConfig {
            max_duration_secs: 1,
            max_file_size: 100_000_000,
            ..TranscriptionConfig::default()
        };
        let provider = TranscriptionProvider::unavailable("test");
        let wav_data = create_wav_bytes(5, 16000);

        let result = extract(&wav_data, &provider, &config).await;

        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("duration") || err.contains("exceeds"));
    }

    #[tokio::test]
    async fn extract_allows_audio_within_duration_limit() {
        let config = TranscriptionConfig {
            max_duration_secs: 10,
            max_file_size: 100_000_000,
            ..TranscriptionConfig::default()
        };
        let provider = TranscriptionProvider::unavailable("test");
        let wav_data = create_wav_bytes(2, 16000);

        let result = extract(&wav_data, &provider, &config).await;

        let err = result.unwrap_err().to_string();
        assert!(!err.contains("duration"));
    }
}
