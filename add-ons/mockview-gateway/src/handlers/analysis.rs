use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use tracing::error;

use super::{error, ApiResponse};
use crate::AppState;

/// GET /api/analysis/:id – the stored report; polled by the results page until it exists.
pub(crate) async fn get_analysis(State(state): State<AppState>, Path(id): Path<String>) -> ApiResponse {
    match state.store.get_analysis(&id) {
        Ok(Some(analysis)) => (StatusCode::OK, Json(json!({ "success": true, "analysis": analysis }))),
        Ok(None) => error(StatusCode::NOT_FOUND, "Analysis not found"),
        Err(e) => {
            error!(target: "mockview::gateway", interview_id = %id, "fetching analysis failed: {}", e);
            error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch analysis")
        }
    }
}
