use axum::extract::{Path, State};
use axum::http::HeaderMap;

use crate::api::state::AppState;
use crate::api::v1::dto::{CaseResponse, CreateCaseRequest, DeleteCaseResponse};
use crate::api::v1::middleware::{require_case_owner, require_user_id};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppJson;
use crate::models::Case;

/// `POST /api/v1/cases`
#[utoipa::path(
    post,
    path = "/api/v1/cases",
    tag = "cases",
    request_body = CreateCaseRequest,
    responses(
        (status = 201, description = "Case created", body = CaseResponse),
        (status = 400, description = "Invalid request", body = ApiError),
    )
)]
pub async fn create_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(req): AppJson<CreateCaseRequest>,
) -> ApiResponse<CaseResponse> {
    let user_id = match require_user_id(&headers) {
        Ok(id) => id,
        Err(e) => return e.into(),
    };

    if req.title.trim().is_empty() {
        return ApiResponse::error(ErrorCode::InvalidRequest, "title cannot be empty");
    }

    let case_id = nanoid::nanoid!();
    let workspace_path = format!("{}/{}", state.config.cache_fs.root, case_id);
    let mut case = Case::new(case_id, req.title, user_id, workspace_path);
    case.case_number = req.case_number;

    match state.catalog.create_case(&case).await {
        Ok(()) => ApiResponse::created(case.into()),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/cases/{caseId}`
#[utoipa::path(
    get,
    path = "/api/v1/cases/{caseId}",
    tag = "cases",
    params(("caseId" = String, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Case found", body = CaseResponse),
        (status = 403, description = "Not owned by caller", body = ApiError),
        (status = 404, description = "Case not found", body = ApiError),
    )
)]
pub async fn get_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(case_id): Path<String>,
) -> ApiResponse<CaseResponse> {
    match require_case_owner(&state, &headers, &case_id).await {
        Ok(case) => ApiResponse::success(case.into()),
        Err(e) => e.into(),
    }
}

/// `DELETE /api/v1/cases/{caseId}`
#[utoipa::path(
    delete,
    path = "/api/v1/cases/{caseId}",
    tag = "cases",
    params(("caseId" = String, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Case deleted", body = DeleteCaseResponse),
        (status = 404, description = "Case not found", body = ApiError),
    )
)]
pub async fn delete_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(case_id): Path<String>,
) -> ApiResponse<DeleteCaseResponse> {
    if let Err(e) = require_case_owner(&state, &headers, &case_id).await {
        return e.into();
    }

    let deleted = match state.catalog.delete_case(&case_id).await {
        Ok(deleted) => deleted,
        Err(e) => return e.into(),
    };

    if deleted {
        if let Err(e) = state.cache_fs.delete_case(&case_id).await {
            tracing::warn!(case_id = %case_id, error = %e, "failed to remove case cache directory during deletion");
        }
    }

    ApiResponse::success(DeleteCaseResponse { deleted })
}
