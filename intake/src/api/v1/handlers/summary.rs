//! v1 Summary handlers: status, content, and the generate/update/regenerate
//! triggers over the Summary Engine. Generation is awaited synchronously so
//! a caller who fires a second request while one is running sees the 409
//! Conflict from the engine's admission control directly, rather than a
//! 202 that silently does nothing.

use axum::extract::{Path, State};
use axum::http::HeaderMap;

use crate::api::v1::dto::{SummaryContentResponse, SummaryStatusResponse};
use crate::api::v1::middleware::require_case_owner;
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;

/// `GET /api/v1/cases/{caseId}/summary/status`
#[utoipa::path(
    get,
    path = "/api/v1/cases/{caseId}/summary/status",
    tag = "summary",
    params(("caseId" = String, Path, description = "Case ID")),
    responses((status = 200, description = "Current summary status", body = SummaryStatusResponse)),
)]
pub async fn summary_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(case_id): Path<String>,
) -> ApiResponse<SummaryStatusResponse> {
    match require_case_owner(&state, &headers, &case_id).await {
        Ok(case) => ApiResponse::success(case.into()),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/cases/{caseId}/summary`
#[utoipa::path(
    get,
    path = "/api/v1/cases/{caseId}/summary",
    tag = "summary",
    params(("caseId" = String, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Narrative summary", body = SummaryContentResponse),
        (status = 404, description = "No summary generated yet", body = ApiError),
    )
)]
pub async fn get_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(case_id): Path<String>,
) -> ApiResponse<SummaryContentResponse> {
    if let Err(e) = require_case_owner(&state, &headers, &case_id).await {
        return e.into();
    }

    match state.cache_fs.read_summary(&case_id).await {
        Ok(Some(narrative)) => ApiResponse::success(SummaryContentResponse { case_id, narrative }),
        Ok(None) => ApiResponse::error(ErrorCode::NotFound, "no summary has been generated for this case"),
        Err(e) => e.into(),
    }
}

/// `POST /api/v1/cases/{caseId}/summary:generate`
#[utoipa::path(
    post,
    path = "/api/v1/cases/{caseId}/summary:generate",
    tag = "summary",
    params(("caseId" = String, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Summary generated", body = SummaryStatusResponse),
        (status = 409, description = "Generation already running for this case", body = ApiError),
    )
)]
pub async fn generate_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(case_id): Path<String>,
) -> ApiResponse<SummaryStatusResponse> {
    let case = match require_case_owner(&state, &headers, &case_id).await {
        Ok(case) => case,
        Err(e) => return e.into(),
    };

    if let Err(e) = state.summary.generate(&case).await {
        return e.into();
    }

    refreshed_status(&state, &headers, &case_id).await
}

/// `POST /api/v1/cases/{caseId}/summary:update`
#[utoipa::path(
    post,
    path = "/api/v1/cases/{caseId}/summary:update",
    tag = "summary",
    params(("caseId" = String, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Summary updated", body = SummaryStatusResponse),
        (status = 409, description = "Generation already running for this case", body = ApiError),
    )
)]
pub async fn update_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(case_id): Path<String>,
) -> ApiResponse<SummaryStatusResponse> {
    let case = match require_case_owner(&state, &headers, &case_id).await {
        Ok(case) => case,
        Err(e) => return e.into(),
    };

    if let Err(e) = state.summary.update(&case).await {
        return e.into();
    }

    refreshed_status(&state, &headers, &case_id).await
}

/// `POST /api/v1/cases/{caseId}/summary:regenerate`
#[utoipa::path(
    post,
    path = "/api/v1/cases/{caseId}/summary:regenerate",
    tag = "summary",
    params(("caseId" = String, Path, description = "Case ID")),
    responses(
        (status = 200, description = "Summary regenerated", body = SummaryStatusResponse),
        (status = 409, description = "Generation already running for this case", body = ApiError),
    )
)]
pub async fn regenerate_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(case_id): Path<String>,
) -> ApiResponse<SummaryStatusResponse> {
    let case = match require_case_owner(&state, &headers, &case_id).await {
        Ok(case) => case,
        Err(e) => return e.into(),
    };

    if let Err(e) = state.summary.regenerate(&case).await {
        return e.into();
    }

    refreshed_status(&state, &headers, &case_id).await
}

/// Re-reads the case after a generation run so the response reflects the
/// post-run `summary_version`/`summary_generated_at` rather than the
/// pre-run snapshot taken before generation started.
async fn refreshed_status(state: &AppState, headers: &HeaderMap, case_id: &str) -> ApiResponse<SummaryStatusResponse> {
    match require_case_owner(state, headers, case_id).await {
        Ok(refreshed) => ApiResponse::success(refreshed.into()),
        Err(e) => e.into(),
    }
}
