//! Results polling: the results view asks for the analysis record until it exists.

use crate::error::{VoiceError, VoiceResult};
use mockview_core::InterviewAnalysis;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisStatus {
    Ready(InterviewAnalysis),
    /// Gave up after the attempt cap; the report may still arrive later.
    Pending,
}

#[derive(Deserialize)]
struct AnalysisReply {
    analysis: InterviewAnalysis,
}

pub struct AnalysisPoller {
    base_url: String,
    interval: Duration,
    max_attempts: Option<u32>,
    client: reqwest::Client,
}

impl AnalysisPoller {
    pub fn new(base_url: &str, interval: Duration) -> VoiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            interval,
            max_attempts: None,
            client,
        })
    }

    /// Stop after `attempts` fetches and report `Pending`. Without a cap the poller waits forever.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    /// One fetch. `Ok(None)` means the report does not exist yet.
    pub async fn fetch(&self, interview_id: &str) -> VoiceResult<Option<InterviewAnalysis>> {
        let url = format!("{}/api/analysis/{}", self.base_url, interview_id);
        let res = self.client.get(&url).send().await?;
        if res.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(VoiceError::Api { status, body });
        }
        let reply: AnalysisReply = res.json().await?;
        Ok(Some(reply.analysis))
    }

    /// Poll every `interval` until the report exists (or the attempt cap is hit).
    /// Transport errors count as "not yet".
    pub async fn wait_for(&self, interview_id: &str) -> AnalysisStatus {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch(interview_id).await {
                Ok(Some(analysis)) => {
                    info!(target: "mockview::voice", interview_id, attempt, "📊 Analysis ready");
                    return AnalysisStatus::Ready(analysis);
                }
                Ok(None) => debug!(target: "mockview::voice", interview_id, attempt, "analysis pending"),
                Err(e) => warn!(target: "mockview::voice", interview_id, attempt, "analysis fetch failed: {}", e),
            }
            if self.max_attempts.is_some_and(|max| attempt >= max) {
                return AnalysisStatus::Pending;
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
