//! Voice provider endpoints: web-call provisioning and the call-ended webhook.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use mockview_voice::{verify_signature, DynamicVariables, WebhookAction, WebhookEvent};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::{error, required, ApiResponse};
use crate::AppState;

const SIGNATURE_HEADER: &str = "x-retell-signature";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateWebCallBody {
    interview_id: Option<String>,
    job_role: Option<String>,
    job_description: Option<String>,
    candidate_name: Option<String>,
}

/// POST /api/retell/create-web-call – access token for the browser client.
pub(crate) async fn create_web_call(
    State(state): State<AppState>,
    Json(body): Json<CreateWebCallBody>,
) -> ApiResponse {
    let (Some(interview_id), Some(job_role)) = (required(&body.interview_id), required(&body.job_role)) else {
        return error(StatusCode::BAD_REQUEST, "Missing required fields: interviewId and jobRole");
    };
    let variables = DynamicVariables::new(
        interview_id,
        job_role,
        body.job_description.as_deref(),
        body.candidate_name.as_deref(),
    );

    match state.calls.create_web_call(&variables).await {
        Ok(call) => {
            match state.store.mark_in_progress(interview_id, Some(call.call_id.as_str())) {
                Ok(Some(_)) => {}
                Ok(None) => warn!(target: "mockview::gateway", interview_id, "web call for unknown interview"),
                Err(e) => error!(target: "mockview::gateway", interview_id, "updating interview failed: {}", e),
            }
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "accessToken": call.access_token,
                    "callId": call.call_id,
                })),
            )
        }
        Err(e) => {
            error!(target: "mockview::gateway", interview_id, "create web call failed: {}", e);
            error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create web call")
        }
    }
}

/// POST /api/retell/webhook – persist the provider's transcript when a call ends.
pub(crate) async fn webhook(State(state): State<AppState>, headers: HeaderMap, payload: Bytes) -> ApiResponse {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    if let (Some(key), Some(signature)) = (state.config.retell_api_key.as_deref(), signature) {
        if !verify_signature(&payload, key, signature) {
            // Mismatches are logged, not rejected.
            warn!(target: "mockview::gateway", "webhook signature mismatch");
        }
    }

    let event: WebhookEvent = match serde_json::from_slice(&payload) {
        Ok(ev) => ev,
        Err(e) => {
            error!(target: "mockview::gateway", "webhook payload rejected: {}", e);
            return error(StatusCode::INTERNAL_SERVER_ERROR, "Webhook processing failed");
        }
    };
    info!(target: "mockview::gateway", event = %event.event, call_id = event.call_id(), "📞 Retell webhook");

    if let WebhookAction::SaveTranscript {
        interview_id,
        transcript,
        call_duration_ms,
    } = event.action()
    {
        match state
            .store
            .save_call_transcript(&interview_id, transcript, call_duration_ms)
        {
            Ok(Some(_)) => info!(target: "mockview::gateway", interview_id = %interview_id, call_duration_ms, "Call transcript saved"),
            Ok(None) => warn!(target: "mockview::gateway", interview_id = %interview_id, "transcript for unknown interview"),
            Err(e) => {
                error!(target: "mockview::gateway", interview_id = %interview_id, "saving transcript failed: {}", e);
                return error(StatusCode::INTERNAL_SERVER_ERROR, "Webhook processing failed");
            }
        }
    }

    (StatusCode::OK, Json(json!({ "success": true })))
}

/// GET /api/retell/webhook – liveness probe for the provider dashboard.
pub(crate) async fn webhook_status() -> ApiResponse {
    (StatusCode::OK, Json(json!({ "status": "Retell webhook endpoint active" })))
}
