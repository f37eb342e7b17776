//! Interview setup, the text-mode turn loop and completion (scoring).

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use mockview_core::{pair_transcript, ConversationItem, HistoryItem, Interview, NewInterview};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use super::{authorize, error, required, ApiResponse};
use crate::AppState;

const QUESTION_COUNT: usize = 8;
const DEFAULT_QUESTION: &str = "Tell me about yourself";
const CLOSING_REMARK: &str = "Thank you so much for taking the time to speak with me today. You've given some really thoughtful answers, and I appreciate your candidness. We'll be in touch soon with feedback on your interview. Take care!";

/// The caller's interview, or the 404/500 to send back. Other users' interviews read as missing.
fn owned_interview(state: &AppState, id: &str, user_id: &str) -> Result<Interview, ApiResponse> {
    match state.store.get_interview(id) {
        Ok(Some(interview)) if interview.user_id == user_id => Ok(interview),
        Ok(_) => Err(error(StatusCode::NOT_FOUND, "Interview not found")),
        Err(e) => {
            error!(target: "mockview::gateway", interview_id = id, "get interview failed: {}", e);
            Err(error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch interview"))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateInterviewBody {
    job_role: Option<String>,
    #[serde(default)]
    job_description: String,
    resume_text: Option<String>,
    question_count: Option<u32>,
    experience_level: Option<String>,
    focus_area: Option<String>,
}

/// POST /api/interviews – create an interview record for the caller.
pub(crate) async fn create_interview(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateInterviewBody>,
) -> ApiResponse {
    let user_id = match authorize(&state, &headers) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Some(job_role) = required(&body.job_role) else {
        return error(StatusCode::BAD_REQUEST, "Missing required fields");
    };
    let new = NewInterview {
        user_id,
        job_role: job_role.to_string(),
        job_description: body.job_description,
        resume_text: body.resume_text,
        question_count: body.question_count.unwrap_or(QUESTION_COUNT as u32),
        experience_level: body.experience_level,
        focus_area: body.focus_area,
    };
    match state.store.create_interview(new) {
        Ok(interview) => {
            info!(target: "mockview::gateway", id = %interview.id, role = %interview.job_role, "Interview created");
            (StatusCode::OK, Json(json!({ "success": true, "interview": interview })))
        }
        Err(e) => {
            error!(target: "mockview::gateway", "create interview failed: {}", e);
            error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create interview")
        }
    }
}

/// GET /api/interviews/:id – the caller's interview record.
pub(crate) async fn get_interview(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResponse {
    let user_id = match authorize(&state, &headers) {
        Ok(id) => id,
        Err(res) => return res,
    };
    match owned_interview(&state, &id, &user_id) {
        Ok(interview) => (StatusCode::OK, Json(json!({ "success": true, "interview": interview }))),
        Err(res) => res,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartBody {
    interview_id: Option<String>,
    job_role: Option<String>,
    #[serde(default)]
    job_description: String,
    #[serde(default)]
    resume_text: String,
}

/// POST /api/interview/start – questions plus an opening greeting.
pub(crate) async fn start(State(state): State<AppState>, Json(body): Json<StartBody>) -> ApiResponse {
    let (Some(interview_id), Some(job_role)) = (required(&body.interview_id), required(&body.job_role)) else {
        return error(StatusCode::BAD_REQUEST, "Missing required fields");
    };
    let questions = state
        .interviewer
        .generate_questions(job_role, &body.job_description, &body.resume_text, QUESTION_COUNT)
        .await;
    let greeting = state.interviewer.generate_greeting(job_role, "Candidate").await;
    info!(target: "mockview::gateway", interview_id, questions = questions.len(), "Interview started");
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "questions": questions,
            "greeting": greeting,
        })),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RespondBody {
    interview_id: Option<String>,
    #[serde(default)]
    question_index: usize,
    user_response: Option<String>,
    #[serde(default)]
    questions: Vec<String>,
    #[serde(default)]
    conversation: Vec<HistoryItem>,
}

/// POST /api/interview/respond – store an answer and produce the interviewer's next line.
pub(crate) async fn respond(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RespondBody>,
) -> ApiResponse {
    let user_id = match authorize(&state, &headers) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let (Some(interview_id), Some(user_response)) = (required(&body.interview_id), body.user_response.as_deref()) else {
        return error(StatusCode::BAD_REQUEST, "Missing required fields");
    };

    let index = body.question_index;
    let total = if body.questions.is_empty() { QUESTION_COUNT } else { body.questions.len() };
    if index >= total {
        return error(StatusCode::BAD_REQUEST, "Question index out of range");
    }
    if let Err(res) = owned_interview(&state, interview_id, &user_id) {
        return res;
    }
    let current = body
        .questions
        .get(index)
        .map(String::as_str)
        .filter(|q| !q.is_empty())
        .unwrap_or(DEFAULT_QUESTION);

    let question_number = u32::try_from(index + 1).unwrap_or(u32::MAX);
    if let Err(e) = state
        .store
        .insert_response(interview_id, question_number, current, user_response)
    {
        error!(target: "mockview::gateway", interview_id, "saving response failed: {}", e);
    }

    let history: Vec<HistoryItem> = body
        .conversation
        .into_iter()
        .filter(|h| !h.question.is_empty() || !h.response.is_empty())
        .collect();

    let is_complete = index + 1 == total;

    let ai_response = if is_complete {
        CLOSING_REMARK.to_string()
    } else {
        let next = body.questions.get(index + 1).map(String::as_str);
        state
            .interviewer
            .generate_follow_up(current, user_response, &history, next)
            .await
    };

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "aiResponse": ai_response,
            "isComplete": is_complete,
        })),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompleteBody {
    #[serde(alias = "sessionId")]
    interview_id: Option<String>,
    #[serde(default, alias = "transcript")]
    conversation: Vec<ConversationItem>,
    #[serde(default)]
    job_role: String,
    #[serde(default)]
    job_description: String,
}

/// POST /api/interview/complete – score the transcript, store the report, close the interview.
pub(crate) async fn complete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CompleteBody>,
) -> ApiResponse {
    let user_id = match authorize(&state, &headers) {
        Ok(id) => id,
        Err(res) => return res,
    };
    let Some(interview_id) = required(&body.interview_id) else {
        return error(StatusCode::BAD_REQUEST, "Missing interview ID");
    };
    if let Err(res) = owned_interview(&state, interview_id, &user_id) {
        return res;
    }
    info!(
        target: "mockview::gateway",
        interview_id,
        user_id = %user_id,
        turns = body.conversation.len(),
        "Completion requested"
    );

    let pairs = pair_transcript(&body.conversation);
    if pairs.is_empty() {
        warn!(target: "mockview::gateway", interview_id, "transcript produced no Q&A pairs");
    }
    let report = state
        .interviewer
        .generate_analysis(&body.job_role, &body.job_description, &pairs)
        .await;

    if let Err(e) = state.store.insert_analysis(&report.clone().into_record(interview_id)) {
        error!(target: "mockview::gateway", interview_id, "saving analysis failed: {}", e);
    }
    if let Err(e) = state.store.mark_completed(interview_id) {
        error!(target: "mockview::gateway", interview_id, "updating interview failed: {}", e);
    }

    (StatusCode::OK, Json(json!({ "success": true, "analysis": report })))
}
