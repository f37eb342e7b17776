//! Text-completion collaborator used to draft questions and score interviews.
//!
//! The interviewer treats the model as a stateless function: system prompt + user
//! message in, text out. `GeminiClient` is the production backend; tests plug in
//! their own `LlmBackend`.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const MAX_OUTPUT_TOKENS: u32 = 2048;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,

    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("LLM API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM response could not be parsed: {0}")]
    Parse(String),
}

#[async_trait::async_trait]
pub trait LlmBackend: Send + Sync {
    /// Complete `user` under `system` instructions. Returns the raw reply text.
    async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String, LlmError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Default)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// `api_key` may be absent; every call then fails with `MissingApiKey` and
    /// callers fall back to canned content.
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
            client,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait::async_trait]
impl LlmBackend for GeminiClient {
    async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String, LlmError> {
        let key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: format!("{}\n\n{}", system, user),
                }],
            }],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        debug!(target: "mockview::llm", model = %self.model, temperature, "generateContent");
        let res = self
            .client
            .post(&url)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            warn!(target: "mockview::llm", status, "Gemini API error");
            return Err(LlmError::Status { status, body });
        }

        let parsed: GenerateResponse = res
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = GeminiClient::new(Some("   ".to_string()));
        assert!(!client.has_api_key());
        let err = client.complete("sys", "user", 0.5).await.unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey));
    }

    #[test]
    fn request_body_uses_camel_case_generation_config() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: "a\n\nb".into() }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(v["contents"][0]["parts"][0]["text"], "a\n\nb");
    }

    #[test]
    fn empty_candidates_parse() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
