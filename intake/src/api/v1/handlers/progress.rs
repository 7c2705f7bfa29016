//! v1 Progress WebSocket handler (spec.md §6.2): forwards a case's
//! `ProgressEvent`s to a single subscribed client as they're published.
//!
//! Grounded in the one-directional broadcast-forward pattern used by the
//! pack's other WebSocket endpoint: read from an mpsc receiver, serialize,
//! send, stop on the first send failure.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;

use crate::api::AppState;
use crate::models::ProgressEnvelope;

/// `GET /api/v1/cases/{caseId}/progress` (WebSocket upgrade)
///
/// No request/response body to document via utoipa; the wire format is the
/// `ProgressEnvelope` JSON pushed once per event, `{event, data}`.
pub async fn progress_ws(
    State(state): State<AppState>,
    Path(case_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| forward_progress(socket, state, case_id))
}

async fn forward_progress(mut socket: WebSocket, state: AppState, case_id: String) {
    let mut events = state.progress.subscribe(&case_id).await;

    while let Some(event) = events.recv().await {
        let envelope: ProgressEnvelope = event.into();
        let payload = match serde_json::to_string(&envelope) {
            Ok(payload) => payload,
            Err(_) => continue,
        };

        if socket.send(Message::Text(payload.into())).await.is_err() {
            break;
        }
    }

    state.progress.unsubscribe(&case_id).await;
}
