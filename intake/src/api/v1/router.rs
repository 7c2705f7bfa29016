use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;
use super::middleware::v1_auth_middleware;

pub fn v1_router(state: AppState) -> Router<AppState> {
    let cases = Router::new()
        .route("/", post(handlers::cases::create_case))
        .route("/{caseId}", get(handlers::cases::get_case).delete(handlers::cases::delete_case))
        .route("/{caseId}/progress", get(handlers::progress::progress_ws))
        .route("/{caseId}/documents", get(handlers::documents::list_documents))
        .route("/{caseId}/documents:upload", post(handlers::documents::upload_document))
        .route("/{caseId}/documents/stats", get(handlers::documents::document_stats))
        .route(
            "/{caseId}/documents/{documentId}",
            get(handlers::documents::get_document).delete(handlers::documents::delete_document),
        )
        .route("/{caseId}/documents/{documentId}/preview", get(handlers::documents::preview_document))
        .route("/{caseId}/documents/{documentId}/download", get(handlers::documents::download_document))
        .route("/{caseId}/summary", get(handlers::summary::get_summary))
        .route("/{caseId}/summary/status", get(handlers::summary::summary_status))
        .route("/{caseId}/summary:generate", post(handlers::summary::generate_summary))
        .route("/{caseId}/summary:update", post(handlers::summary::update_summary))
        .route("/{caseId}/summary:regenerate", post(handlers::summary::regenerate_summary));

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router());

    let protected_routes = Router::new()
        .nest("/cases", cases)
        .route_layer(middleware::from_fn_with_state(state, v1_auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
