use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tagged progress record fanned out over the Progress Bus (spec.md §3, §6.2).
/// Immutable once emitted.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProgressEvent {
    pub kind: ProgressEventKind,
    pub case_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub percent: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEventKind {
    #[serde(rename = "document:upload")]
    DocumentUpload,
    #[serde(rename = "document:extracting")]
    DocumentExtracting,
    #[serde(rename = "document:analyzing")]
    DocumentAnalyzing,
    #[serde(rename = "document:indexing")]
    DocumentIndexing,
    #[serde(rename = "document:complete")]
    DocumentComplete,
    #[serde(rename = "document:error")]
    DocumentError,
    #[serde(rename = "summary:generating")]
    SummaryGenerating,
    #[serde(rename = "summary:complete")]
    SummaryComplete,
    #[serde(rename = "summary:failed")]
    SummaryFailed,
}

impl ProgressEventKind {
    pub fn is_document_event(&self) -> bool {
        matches!(
            self,
            Self::DocumentUpload
                | Self::DocumentExtracting
                | Self::DocumentAnalyzing
                | Self::DocumentIndexing
                | Self::DocumentComplete
                | Self::DocumentError
        )
    }

    /// Which `event` name the WebSocket envelope uses (spec.md §6.2).
    pub fn ws_event_name(&self) -> &'static str {
        if self.is_document_event() {
            "document:progress"
        } else {
            "summary:progress"
        }
    }
}

impl ProgressEvent {
    pub fn document(
        kind: ProgressEventKind,
        case_id: impl Into<String>,
        document_id: impl Into<String>,
        filename: impl Into<String>,
        percent: u8,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            case_id: case_id.into(),
            document_id: Some(document_id.into()),
            filename: Some(filename.into()),
            percent,
            message: message.into(),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn document_error(
        case_id: impl Into<String>,
        document_id: impl Into<String>,
        filename: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        let error = error.into();
        Self {
            kind: ProgressEventKind::DocumentError,
            case_id: case_id.into(),
            document_id: Some(document_id.into()),
            filename: Some(filename.into()),
            percent: 0,
            message: error.clone(),
            error: Some(error),
            timestamp: Utc::now(),
        }
    }

    pub fn summary(
        kind: ProgressEventKind,
        case_id: impl Into<String>,
        percent: u8,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            case_id: case_id.into(),
            document_id: None,
            filename: None,
            percent,
            message: message.into(),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn summary_failed(case_id: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            kind: ProgressEventKind::SummaryFailed,
            case_id: case_id.into(),
            document_id: None,
            filename: None,
            percent: 0,
            message: error.clone(),
            error: Some(error),
            timestamp: Utc::now(),
        }
    }
}

/// Wire envelope sent to WebSocket subscribers (spec.md §6.2).
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ProgressEnvelope {
    pub event: &'static str,
    pub data: ProgressEvent,
}

impl From<ProgressEvent> for ProgressEnvelope {
    fn from(event: ProgressEvent) -> Self {
        Self {
            event: event.kind.ws_event_name(),
            data: event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_event_maps_to_document_progress_envelope() {
        let event = ProgressEvent::document(
            ProgressEventKind::DocumentExtracting,
            "c1",
            "d1",
            "file.pdf",
            30,
            "extracting",
        );
        let envelope: ProgressEnvelope = event.into();
        assert_eq!(envelope.event, "document:progress");
    }

    #[test]
    fn summary_event_maps_to_summary_progress_envelope() {
        let event = ProgressEvent::summary(ProgressEventKind::SummaryGenerating, "c1", 40, "batch 2/5");
        let envelope: ProgressEnvelope = event.into();
        assert_eq!(envelope.event, "summary:progress");
    }

    #[test]
    fn document_error_sets_both_message_and_error() {
        let event = ProgressEvent::document_error("c1", "d1", "file.pdf", "extractor timeout");
        assert_eq!(event.error.as_deref(), Some("extractor timeout"));
        assert_eq!(event.message, "extractor timeout");
        assert_eq!(event.percent, 0);
    }
}
