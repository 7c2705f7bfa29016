//! v1 Document handlers: upload, retrieval, listing, deletion, presigned
//! preview/download URLs, and per-case status counts. All responses are
//! wrapped in [`ApiResponse`] envelopes.

use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;

use crate::api::v1::dto::{
    DeleteDocumentResponse, DocumentListResponse, DocumentResponse, DocumentStatsResponse,
    PresignedUrlResponse,
};
use crate::api::v1::middleware::require_case_owner;
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::error::{IntakeError, Result};
use crate::models::{sanitize_folder_slug, Document, FileType, ProgressEvent, ProgressEventKind};
use crate::storage::S3BlobStore;

/// `POST /api/v1/cases/{caseId}/documents:upload`
#[utoipa::path(
    post,
    path = "/api/v1/cases/{caseId}/documents:upload",
    tag = "documents",
    params(("caseId" = String, Path, description = "Case ID")),
    request_body(content_type = "multipart/form-data", content = String, description = "multipart form with a single 'file' field"),
    responses(
        (status = 202, description = "Upload accepted, pipeline started", body = DocumentResponse),
        (status = 400, description = "Missing file or unsupported file type", body = ApiError),
    )
)]
pub async fn upload_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(case_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResponse<DocumentResponse> {
    if let Err(e) = require_case_owner(&state, &headers, &case_id).await {
        return e.into();
    }

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return ApiResponse::error(ErrorCode::InvalidRequest, format!("malformed multipart body: {e}")),
        };

        if field.name() != Some("file") {
            continue;
        }

        filename = field.file_name().map(str::to_string);
        content_type = field.content_type().map(str::to_string);
        file_bytes = match field.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => return ApiResponse::error(ErrorCode::InvalidRequest, format!("failed to read file field: {e}")),
        };
    }

    let (Some(bytes), Some(filename)) = (file_bytes, filename) else {
        return ApiResponse::error(ErrorCode::InvalidRequest, "missing required 'file' field");
    };

    let extension = filename.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    let file_type = FileType::from_extension(extension);
    if !file_type.is_supported() {
        return ApiResponse::error(
            ErrorCode::InvalidRequest,
            format!("unsupported file type '.{extension}'; supported: {}", FileType::SUPPORTED.join(", ")),
        );
    }

    let document_id = nanoid::nanoid!();
    let folder_name = sanitize_folder_slug(&filename);
    let blob_key = S3BlobStore::document_key(&case_id, &document_id, &filename);
    let file_size_bytes = bytes.len() as i64;

    let put_result = match state
        .blob_store
        .put(&blob_key, content_type.as_deref().unwrap_or("application/octet-stream"), bytes)
        .await
    {
        Ok(result) => result,
        Err(e) => return e.into(),
    };

    let mut doc = Document::new(document_id, case_id.clone(), filename, folder_name, file_type);
    doc.blob_key = Some(put_result.blob_key);
    doc.blob_version_id = put_result.blob_version_id;
    doc.blob_uploaded_at = Some(doc.uploaded_at);
    doc.content_type = content_type;
    doc.file_size_bytes = Some(file_size_bytes);

    if let Err(e) = state.catalog.create_document(&doc).await {
        return e.into();
    }

    state
        .progress
        .publish(ProgressEvent::document(
            ProgressEventKind::DocumentUpload,
            &case_id,
            &doc.id,
            &doc.filename,
            doc.processing_status.percent(),
            "upload accepted",
        ))
        .await;

    state.coordinator.spawn(doc.id.clone());

    ApiResponse::accepted(doc.into())
}

/// `GET /api/v1/cases/{caseId}/documents`
#[utoipa::path(
    get,
    path = "/api/v1/cases/{caseId}/documents",
    tag = "documents",
    params(("caseId" = String, Path, description = "Case ID")),
    responses((status = 200, description = "Documents in the case", body = DocumentListResponse)),
)]
pub async fn list_documents(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(case_id): Path<String>,
) -> ApiResponse<DocumentListResponse> {
    if let Err(e) = require_case_owner(&state, &headers, &case_id).await {
        return e.into();
    }

    match state.catalog.list_documents_for_case(&case_id).await {
        Ok(docs) => ApiResponse::success(DocumentListResponse {
            documents: docs.into_iter().map(Into::into).collect(),
        }),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/cases/{caseId}/documents/stats`
#[utoipa::path(
    get,
    path = "/api/v1/cases/{caseId}/documents/stats",
    tag = "documents",
    params(("caseId" = String, Path, description = "Case ID")),
    responses((status = 200, description = "Per-status document counts", body = DocumentStatsResponse)),
)]
pub async fn document_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(case_id): Path<String>,
) -> ApiResponse<DocumentStatsResponse> {
    if let Err(e) = require_case_owner(&state, &headers, &case_id).await {
        return e.into();
    }

    match state.catalog.document_stats_for_case(&case_id).await {
        Ok(stats) => ApiResponse::success(stats.into()),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/cases/{caseId}/documents/{documentId}`
#[utoipa::path(
    get,
    path = "/api/v1/cases/{caseId}/documents/{documentId}",
    tag = "documents",
    params(
        ("caseId" = String, Path, description = "Case ID"),
        ("documentId" = String, Path, description = "Document ID"),
    ),
    responses(
        (status = 200, description = "Document found", body = DocumentResponse),
        (status = 404, description = "Document not found", body = ApiError),
    )
)]
pub async fn get_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((case_id, document_id)): Path<(String, String)>,
) -> ApiResponse<DocumentResponse> {
    if let Err(e) = require_case_owner(&state, &headers, &case_id).await {
        return e.into();
    }

    match load_document_in_case(&state, &case_id, &document_id).await {
        Ok(doc) => ApiResponse::success(doc.into()),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/cases/{caseId}/documents/{documentId}/preview`
#[utoipa::path(
    get,
    path = "/api/v1/cases/{caseId}/documents/{documentId}/preview",
    tag = "documents",
    params(
        ("caseId" = String, Path, description = "Case ID"),
        ("documentId" = String, Path, description = "Document ID"),
    ),
    responses(
        (status = 200, description = "Time-limited presigned preview URL", body = PresignedUrlResponse),
        (status = 404, description = "Document not found or has no stored file", body = ApiError),
    )
)]
pub async fn preview_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((case_id, document_id)): Path<(String, String)>,
) -> ApiResponse<PresignedUrlResponse> {
    document_presigned_url(&state, &headers, &case_id, &document_id).await
}

/// `GET /api/v1/cases/{caseId}/documents/{documentId}/download`
#[utoipa::path(
    get,
    path = "/api/v1/cases/{caseId}/documents/{documentId}/download",
    tag = "documents",
    params(
        ("caseId" = String, Path, description = "Case ID"),
        ("documentId" = String, Path, description = "Document ID"),
    ),
    responses(
        (status = 200, description = "Time-limited presigned download URL", body = PresignedUrlResponse),
        (status = 404, description = "Document not found or has no stored file", body = ApiError),
    )
)]
pub async fn download_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((case_id, document_id)): Path<(String, String)>,
) -> ApiResponse<PresignedUrlResponse> {
    document_presigned_url(&state, &headers, &case_id, &document_id).await
}

async fn document_presigned_url(
    state: &AppState,
    headers: &HeaderMap,
    case_id: &str,
    document_id: &str,
) -> ApiResponse<PresignedUrlResponse> {
    if let Err(e) = require_case_owner(state, headers, case_id).await {
        return e.into();
    }

    let doc = match load_document_in_case(state, case_id, document_id).await {
        Ok(doc) => doc,
        Err(e) => return e.into(),
    };

    let Some(blob_key) = doc.blob_key else {
        return ApiResponse::error(ErrorCode::NotFound, "document has no stored file");
    };

    match state.blob_store.presigned_download_url(&blob_key).await {
        Ok(url) => ApiResponse::success(PresignedUrlResponse { url }),
        Err(e) => e.into(),
    }
}

/// `DELETE /api/v1/cases/{caseId}/documents/{documentId}`
///
/// Failure-tolerant, ordered cleanup: blob first, then the workspace
/// directory, then the catalog row. A missing blob or workspace directory
/// is logged and ignored rather than blocking the catalog delete.
#[utoipa::path(
    delete,
    path = "/api/v1/cases/{caseId}/documents/{documentId}",
    tag = "documents",
    params(
        ("caseId" = String, Path, description = "Case ID"),
        ("documentId" = String, Path, description = "Document ID"),
    ),
    responses(
        (status = 200, description = "Document deleted", body = DeleteDocumentResponse),
        (status = 404, description = "Document not found", body = ApiError),
    )
)]
pub async fn delete_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((case_id, document_id)): Path<(String, String)>,
) -> ApiResponse<DeleteDocumentResponse> {
    let case = match require_case_owner(&state, &headers, &case_id).await {
        Ok(case) => case,
        Err(e) => return e.into(),
    };

    let doc = match load_document_in_case(&state, &case_id, &document_id).await {
        Ok(doc) => doc,
        Err(e) => return e.into(),
    };

    if let Some(blob_key) = &doc.blob_key {
        if let Err(e) = state.blob_store.delete(blob_key).await {
            tracing::warn!(document_id = %document_id, error = %e, "failed to delete blob during document deletion");
        }
    }

    let workspace_dir = std::path::Path::new(&case.workspace_path).join("documents").join(&doc.folder_name);
    if let Err(e) = tokio::fs::remove_dir_all(&workspace_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(document_id = %document_id, error = %e, "failed to remove workspace directory during document deletion");
        }
    }

    match state.catalog.delete_document(&document_id).await {
        Ok(deleted) => ApiResponse::success(DeleteDocumentResponse { deleted }),
        Err(e) => e.into(),
    }
}

async fn load_document_in_case(state: &AppState, case_id: &str, document_id: &str) -> Result<Document> {
    let doc = state
        .catalog
        .get_document_by_id(document_id)
        .await?
        .ok_or_else(|| IntakeError::NotFound(format!("document {document_id} not found")))?;

    if doc.case_id != case_id {
        return Err(IntakeError::NotFound(format!("document {document_id} not found")));
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_unsupported_extension_is_rejected_before_upload() {
        let file_type = FileType::from_extension("exe");
        assert!(!file_type.is_supported());
    }

    #[test]
    fn document_supported_extension_passes() {
        let file_type = FileType::from_extension("pdf");
        assert!(file_type.is_supported());
    }
}
