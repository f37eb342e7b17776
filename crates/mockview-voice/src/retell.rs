//! Server side of the voice provider: web-call provisioning and webhook payloads.

use crate::error::{VoiceError, VoiceResult};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, info};

const RETELL_API_BASE: &str = "https://api.retellai.com";

type HmacSha256 = Hmac<Sha256>;

/// Variables the voice agent's prompt interpolates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicVariables {
    pub job_role: String,
    pub job_description: String,
    pub candidate_name: String,
    pub interview_id: String,
}

impl DynamicVariables {
    pub fn new(
        interview_id: &str,
        job_role: &str,
        job_description: Option<&str>,
        candidate_name: Option<&str>,
    ) -> Self {
        let non_blank = |v: Option<&str>, default: &str| {
            v.map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            job_role: job_role.to_string(),
            job_description: non_blank(job_description, "General position"),
            candidate_name: non_blank(candidate_name, "Candidate"),
            interview_id: interview_id.to_string(),
        }
    }
}

/// Short-lived credential for the browser-side provider client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebCall {
    pub access_token: String,
    pub call_id: String,
}

#[async_trait::async_trait]
pub trait WebCallProvisioner: Send + Sync {
    async fn create_web_call(&self, variables: &DynamicVariables) -> VoiceResult<WebCall>;
}

#[derive(Serialize)]
struct CallMetadata<'a> {
    interview_id: &'a str,
    job_role: &'a str,
}

#[derive(Serialize)]
struct CreateWebCallRequest<'a> {
    agent_id: &'a str,
    metadata: CallMetadata<'a>,
    retell_llm_dynamic_variables: &'a DynamicVariables,
}

#[derive(Clone)]
pub struct RetellApi {
    base_url: String,
    api_key: String,
    agent_id: String,
    client: reqwest::Client,
}

impl RetellApi {
    pub fn new(api_key: impl Into<String>, agent_id: impl Into<String>) -> VoiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            base_url: RETELL_API_BASE.to_string(),
            api_key: api_key.into(),
            agent_id: agent_id.into(),
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait::async_trait]
impl WebCallProvisioner for RetellApi {
    async fn create_web_call(&self, variables: &DynamicVariables) -> VoiceResult<WebCall> {
        if self.api_key.is_empty() || self.agent_id.is_empty() {
            return Err(VoiceError::Config(
                "RETELL_API_KEY and RETELL_AGENT_ID must be set".to_string(),
            ));
        }
        let body = CreateWebCallRequest {
            agent_id: &self.agent_id,
            metadata: CallMetadata {
                interview_id: &variables.interview_id,
                job_role: &variables.job_role,
            },
            retell_llm_dynamic_variables: variables,
        };
        let res = self
            .client
            .post(format!("{}/v2/create-web-call", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(VoiceError::Api { status, body });
        }
        let call: WebCall = res.json().await?;
        info!(target: "mockview::voice", call_id = %call.call_id, interview_id = %variables.interview_id, "Web call created");
        Ok(call)
    }
}

/// True when `signature` is the hex HMAC-SHA256 of `payload` keyed by `api_key`.
pub fn verify_signature(payload: &[u8], api_key: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(api_key.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// Hex HMAC-SHA256 of `payload`, as the provider signs webhooks.
pub fn sign_payload(payload: &[u8], api_key: &str) -> String {
    match HmacSha256::new_from_slice(api_key.as_bytes()) {
        Ok(mut mac) => {
            mac.update(payload);
            hex::encode(mac.finalize().into_bytes())
        }
        Err(_) => String::new(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallMetadataIn {
    #[serde(default)]
    pub interview_id: Option<String>,
    #[serde(default)]
    pub job_role: Option<String>,
}

/// The `call` object carried by webhook events (only the fields we use).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookCall {
    #[serde(default)]
    pub call_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<CallMetadataIn>,
    #[serde(default)]
    pub transcript: Option<serde_json::Value>,
    #[serde(default)]
    pub call_duration_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub call: Option<WebhookCall>,
}

/// What a webhook event asks the gateway to do.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookAction {
    /// Persist the provider-side transcript and close the interview.
    SaveTranscript {
        interview_id: String,
        transcript: serde_json::Value,
        call_duration_ms: u64,
    },
    Ignore,
}

impl WebhookEvent {
    pub fn call_id(&self) -> &str {
        self.call
            .as_ref()
            .and_then(|c| c.call_id.as_deref())
            .unwrap_or("")
    }

    pub fn action(&self) -> WebhookAction {
        match self.event.as_str() {
            "call_ended" => {
                let Some(call) = self.call.as_ref() else {
                    return WebhookAction::Ignore;
                };
                let interview_id = call.metadata.as_ref().and_then(|m| m.interview_id.clone());
                match (interview_id, call.transcript.clone()) {
                    (Some(interview_id), Some(transcript)) if !interview_id.is_empty() => {
                        WebhookAction::SaveTranscript {
                            interview_id,
                            transcript,
                            call_duration_ms: call.call_duration_ms.unwrap_or(0),
                        }
                    }
                    _ => WebhookAction::Ignore,
                }
            }
            other => {
                debug!(target: "mockview::voice", event = other, call_id = self.call_id(), "webhook event needs no action");
                WebhookAction::Ignore
            }
        }
    }
}
