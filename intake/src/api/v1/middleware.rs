//! # V1 API Key Authentication & Ownership Checks
//!
//! Protects all v1 API routes (except explicitly public ones like `/health`)
//! with Bearer token authentication, validated against `INTAKE_API_KEYS`.
//! Case-scoped routes additionally require the caller to own the case, via
//! `require_case_owner`.
//!
//! Auth errors are returned as the v1 `ApiResponse` JSON envelope so they
//! conform to the same contract as every other v1 response.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::state::AppState;
use crate::error::{IntakeError, Result};
use crate::models::Case;

use super::response::{ApiResponse, ErrorCode};

/// Axum middleware that enforces Bearer token authentication for v1 API routes.
///
/// # Behavior
///
/// - If `INTAKE_API_KEYS` is empty/unset → returns 401 with JSON error envelope.
///   The server still starts, but protected routes are locked down.
/// - If the `Authorization: Bearer <token>` header is missing or malformed → 401.
/// - If the token is not in the configured key list → 401.
/// - If the token is valid → passes the request through to the next handler.
///
/// # Error format
///
/// All errors are returned as `ApiResponse<()>` JSON envelopes:
/// ```json
/// { "error": { "code": "unauthorized", "message": "..." } }
/// ```
pub async fn v1_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if state.config.server.api_keys.is_empty() {
        return ApiResponse::<()>::error(
            ErrorCode::Unauthorized,
            "API keys not configured. Set INTAKE_API_KEYS to enable access.",
        )
        .into_response();
    }

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) if h.starts_with("Bearer ") => &h[7..],
        Some(_) => {
            return ApiResponse::<()>::error(
                ErrorCode::Unauthorized,
                "Invalid authorization header format. Expected: Bearer <token>",
            )
            .into_response();
        }
        None => {
            return ApiResponse::<()>::error(
                ErrorCode::Unauthorized,
                "Missing authorization header",
            )
            .into_response();
        }
    };

    if state.config.server.api_keys.contains(&token.to_string()) {
        next.run(request).await
    } else {
        ApiResponse::<()>::error(ErrorCode::Unauthorized, "Invalid API key").into_response()
    }
}

/// Reads the caller's user id out of the `X-User-Id` header. Case-scoped
/// handlers use this to resolve ownership rather than trusting a body field.
pub fn require_user_id(headers: &HeaderMap) -> Result<String> {
    headers
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| IntakeError::Auth("missing X-User-Id header".to_string()))
}

/// Loads the case and checks that the caller (via `X-User-Id`) owns it.
/// Returns `NotFound` before `Ownership` so a caller who doesn't own a case
/// can't distinguish "not mine" from "doesn't exist".
pub async fn require_case_owner(state: &AppState, headers: &HeaderMap, case_id: &str) -> Result<Case> {
    let user_id = require_user_id(headers)?;
    let case = state
        .catalog
        .get_case_by_id(case_id)
        .await?
        .ok_or_else(|| IntakeError::NotFound(format!("case {case_id} not found")))?;

    if !case.is_owned_by(&user_id) {
        return Err(IntakeError::Ownership(format!("case {case_id} is not owned by this user")));
    }

    Ok(case)
}
