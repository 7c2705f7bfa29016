use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Intake API",
        version = "1.0.0",
        description = "Legal-document case intake pipeline: upload, extraction, analysis, indexing, and narrative summaries.",
    ),
    paths(
        handlers::health::health_check,
        handlers::cases::create_case,
        handlers::cases::get_case,
        handlers::cases::delete_case,
        handlers::documents::upload_document,
        handlers::documents::list_documents,
        handlers::documents::document_stats,
        handlers::documents::get_document,
        handlers::documents::preview_document,
        handlers::documents::download_document,
        handlers::documents::delete_document,
        handlers::summary::summary_status,
        handlers::summary::get_summary,
        handlers::summary::generate_summary,
        handlers::summary::update_summary,
        handlers::summary::regenerate_summary,
    ),
    components(schemas(
        // Response envelope
        response::ErrorCode,
        response::ApiError,
        response::ResponseMeta,
        response::CursorPagination,
        // Cases
        dto::cases::CreateCaseRequest,
        dto::cases::CaseResponse,
        dto::cases::DeleteCaseResponse,
        // Documents
        dto::documents::DocumentResponse,
        dto::documents::DocumentListResponse,
        dto::documents::DocumentStatsResponse,
        dto::documents::PresignedUrlResponse,
        dto::documents::DeleteDocumentResponse,
        // Summary
        dto::summary::SummaryStatusResponse,
        dto::summary::SummaryContentResponse,
        // Health (handler-local types)
        handlers::health::HealthData,
        handlers::health::DatabaseStatus,
        handlers::health::LlmStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "cases", description = "Case CRUD"),
        (name = "documents", description = "Document upload, retrieval, and deletion"),
        (name = "summary", description = "Case narrative summary status and generation"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(utoipa::openapi::security::Http::new(
                utoipa::openapi::security::HttpAuthScheme::Bearer,
            )),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
