//! Document request/response DTOs for the v1 API.
//!
//! These types define the wire format for document upload, retrieval,
//! listing, deletion, and per-case status counts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::DocumentStats;
use crate::models::{Document, DocumentClassification, FileType, ProcessingStatus};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub document_id: String,
    pub case_id: String,
    pub filename: String,
    pub document_type: Option<DocumentClassification>,
    pub file_type: FileType,
    pub page_count: Option<i64>,
    pub word_count: Option<i64>,
    pub processing_status: ProcessingStatus,
    pub percent: u8,
    pub rag_indexed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        Self {
            document_id: doc.id,
            case_id: doc.case_id,
            filename: doc.filename,
            document_type: doc.document_type,
            file_type: doc.file_type,
            page_count: doc.page_count,
            word_count: doc.word_count,
            percent: doc.processing_status.percent(),
            processing_status: doc.processing_status,
            rag_indexed: doc.rag_indexed,
            error_message: doc.error_message,
            uploaded_at: doc.uploaded_at,
            processed_at: doc.processed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentResponse>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatsResponse {
    pub total: u64,
    pub pending: u64,
    pub extracting: u64,
    pub analyzing: u64,
    pub indexing: u64,
    pub complete: u64,
    pub failed: u64,
}

impl From<DocumentStats> for DocumentStatsResponse {
    fn from(stats: DocumentStats) -> Self {
        Self {
            total: stats.total,
            pending: stats.pending,
            extracting: stats.extracting,
            analyzing: stats.analyzing,
            indexing: stats.indexing,
            complete: stats.complete,
            failed: stats.failed,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrlResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDocumentResponse {
    pub deleted: bool,
}
