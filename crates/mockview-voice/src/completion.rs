//! Completion trigger: hand the frozen transcript to the scoring pipeline and
//! only then tell the caller where the results live.
//!
//! The request is awaited, never spawned. Pipeline failures are logged and the
//! flow continues; the results view polls for the report instead.

use crate::error::{VoiceError, VoiceResult};
use crate::event::{CompletedSession, SessionNotice};
use mockview_core::{AnalysisReport, ConversationItem};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The interview a call belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterviewContext {
    pub interview_id: String,
    pub job_role: String,
    pub job_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    #[serde(alias = "sessionId")]
    pub interview_id: String,
    #[serde(alias = "transcript")]
    pub conversation: Vec<ConversationItem>,
    #[serde(default)]
    pub job_role: String,
    #[serde(default)]
    pub job_description: String,
}

impl CompletionRequest {
    pub fn new(interview: &InterviewContext, session: &CompletedSession) -> Self {
        Self {
            interview_id: interview.interview_id.clone(),
            conversation: session.transcript.iter().map(ConversationItem::from).collect(),
            job_role: interview.job_role.clone(),
            job_description: interview.job_description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// Pipeline acknowledged; `analysis` is present when scoring finished inline.
    Completed { analysis: Option<AnalysisReport> },
    /// Best-effort failure; the report may still show up later.
    Failed { reason: String },
}

#[derive(Deserialize)]
struct CompletionReply {
    #[serde(default)]
    analysis: Option<AnalysisReport>,
}

#[async_trait::async_trait]
pub trait CompletionPipeline: Send + Sync {
    async fn complete(&self, request: &CompletionRequest, token: &str) -> CompletionOutcome;
}

/// HTTP client for `POST {base_url}/api/interview/complete`.
pub struct CompletionClient {
    base_url: String,
    client: reqwest::Client,
}

impl CompletionClient {
    pub fn new(base_url: &str) -> VoiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn post(&self, request: &CompletionRequest, token: &str) -> VoiceResult<Option<AnalysisReport>> {
        let url = format!("{}/api/interview/complete", self.base_url);
        let res = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(VoiceError::Api { status, body });
        }
        let reply: CompletionReply = res.json().await?;
        Ok(reply.analysis)
    }
}

#[async_trait::async_trait]
impl CompletionPipeline for CompletionClient {
    async fn complete(&self, request: &CompletionRequest, token: &str) -> CompletionOutcome {
        info!(
            target: "mockview::voice",
            interview_id = %request.interview_id,
            turns = request.conversation.len(),
            "📨 Submitting transcript for analysis"
        );
        match self.post(request, token).await {
            Ok(analysis) => CompletionOutcome::Completed { analysis },
            Err(e) => {
                warn!(target: "mockview::voice", interview_id = %request.interview_id, "Analysis request failed: {}", e);
                CompletionOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Where the UI goes once completion has been submitted.
pub fn results_path(interview_id: &str) -> String {
    format!("/interview/{}/results", interview_id)
}

/// Wait for the session's single `Completed` notice, await the pipeline, then
/// return the results location. Other notices are skipped.
pub async fn finish_interview(
    notices: &mut mpsc::UnboundedReceiver<SessionNotice>,
    pipeline: &dyn CompletionPipeline,
    interview: &InterviewContext,
    token: &str,
) -> VoiceResult<String> {
    let session = loop {
        match notices.recv().await {
            Some(SessionNotice::Completed(session)) => break session,
            Some(other) => debug!(target: "mockview::voice", ?other, "waiting for completion"),
            None => {
                return Err(VoiceError::ChannelReceive(
                    "coordinator dropped before the call completed".to_string(),
                ))
            }
        }
    };

    let request = CompletionRequest::new(interview, &session);
    if let CompletionOutcome::Failed { reason } = pipeline.complete(&request, token).await {
        warn!(target: "mockview::voice", "Continuing to results without analysis: {}", reason);
    }
    Ok(results_path(&interview.interview_id))
}
