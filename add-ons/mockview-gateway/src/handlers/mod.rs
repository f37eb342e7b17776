//! Route handlers. Every handler answers `(StatusCode, Json<Value>)`; failures carry an `error` field.

pub(crate) mod analysis;
pub(crate) mod interview;
pub(crate) mod retell;
pub(crate) mod tts;

use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};

use crate::AppState;

pub(crate) type ApiResponse = (StatusCode, Json<Value>);

pub(crate) fn error(status: StatusCode, message: &str) -> ApiResponse {
    (status, Json(json!({ "error": message })))
}

/// Token from `Authorization: Bearer <token>`.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .split(' ')
        .nth(1)
        .filter(|t| !t.is_empty())
}

/// Resolve the caller's user id, or the 401/500 to send back.
pub(crate) fn authorize(state: &AppState, headers: &HeaderMap) -> Result<String, ApiResponse> {
    let Some(token) = bearer_token(headers) else {
        return Err(error(StatusCode::UNAUTHORIZED, "Unauthorized: No token provided"));
    };
    match state.store.verify_token(token) {
        Ok(Some(user_id)) => Ok(user_id),
        Ok(None) => Err(error(StatusCode::UNAUTHORIZED, "Unauthorized: Invalid token")),
        Err(e) => {
            tracing::error!(target: "mockview::gateway", "token lookup failed: {}", e);
            Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to verify session"))
        }
    }
}

/// Trimmed, non-empty string field.
pub(crate) fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
