use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use mockview_voice::speak_or_fallback;
use serde::Deserialize;
use serde_json::json;

use super::{error, required, ApiResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TtsBody {
    text: Option<String>,
    voice_id: Option<String>,
}

/// POST /api/tts – base64 audio, or `useBrowserTTS` when synthesis is unavailable.
pub(crate) async fn synthesize(State(state): State<AppState>, Json(body): Json<TtsBody>) -> ApiResponse {
    let Some(text) = required(&body.text) else {
        return error(StatusCode::BAD_REQUEST, "Text is required");
    };
    let reply = speak_or_fallback(state.tts.as_ref(), text, body.voice_id.as_deref()).await;
    (StatusCode::OK, Json(json!(reply)))
}
