//! Text-to-speech for the interviewer's voice.
//!
//! `ElevenLabsTts` is the production backend. Without a key the gateway uses
//! `PlaceholderTts`, whose empty audio tells the client to fall back to the
//! browser's synthetic voice.

use crate::error::{VoiceError, VoiceResult};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io/v1";
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
const ELEVENLABS_MODEL: &str = "eleven_monolingual_v1";
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Backend that turns text into audio bytes. Empty output means "nothing to play".
#[async_trait::async_trait]
pub trait TtsBackend: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> VoiceResult<Vec<u8>>;
}

/// Returns empty audio so the caller falls back to the synthetic voice.
#[derive(Debug, Default)]
pub struct PlaceholderTts;

#[async_trait::async_trait]
impl TtsBackend for PlaceholderTts {
    async fn synthesize(&self, _text: &str, _voice_id: Option<&str>) -> VoiceResult<Vec<u8>> {
        Ok(Vec::new())
    }
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Clone)]
pub struct ElevenLabsTts {
    base_url: String,
    api_key: String,
    voice_id: String,
    client: reqwest::Client,
}

impl ElevenLabsTts {
    pub fn new(api_key: impl Into<String>, voice_id: Option<String>) -> VoiceResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(VoiceError::Config("ElevenLabs TTS requires an API key".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| VoiceError::Tts(e.to_string()))?;
        Ok(Self {
            base_url: ELEVENLABS_API_BASE.to_string(),
            api_key,
            voice_id: voice_id
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string()),
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }
}

#[async_trait::async_trait]
impl TtsBackend for ElevenLabsTts {
    async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> VoiceResult<Vec<u8>> {
        let voice = voice_id.unwrap_or(self.voice_id.as_str());
        let url = format!("{}/text-to-speech/{}", self.base_url, voice);
        let body = SpeechRequest {
            text,
            model_id: ELEVENLABS_MODEL,
            voice_settings: VoiceSettings {
                stability: 0.5,
                similarity_boost: 0.75,
                style: 0.5,
                use_speaker_boost: true,
            },
        };
        debug!(target: "mockview::voice", voice, chars = text.len(), "ElevenLabs synthesize");
        let res = self
            .client
            .post(&url)
            .header("Accept", AUDIO_CONTENT_TYPE)
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VoiceError::Tts(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(VoiceError::Api { status, body });
        }
        let bytes = res.bytes().await.map_err(|e| VoiceError::Tts(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// What the TTS route answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TtsReply {
    Audio {
        /// Base64-encoded audio bytes.
        audio: String,
        #[serde(rename = "contentType")]
        content_type: String,
    },
    UseBrowserTts {
        #[serde(rename = "useBrowserTTS")]
        use_browser_tts: bool,
    },
}

impl TtsReply {
    pub fn browser() -> Self {
        Self::UseBrowserTts {
            use_browser_tts: true,
        }
    }
}

/// Synthesize `text`, degrading to the browser voice on any failure or empty audio.
pub async fn speak_or_fallback(backend: &dyn TtsBackend, text: &str, voice_id: Option<&str>) -> TtsReply {
    match backend.synthesize(text, voice_id).await {
        Ok(audio) if !audio.is_empty() => TtsReply::Audio {
            audio: base64::engine::general_purpose::STANDARD.encode(&audio),
            content_type: AUDIO_CONTENT_TYPE.to_string(),
        },
        Ok(_) => TtsReply::browser(),
        Err(e) => {
            warn!(target: "mockview::voice", "TTS failed, using browser voice: {}", e);
            TtsReply::browser()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedTts(VoiceResult<Vec<u8>>);

    #[async_trait::async_trait]
    impl TtsBackend for FixedTts {
        async fn synthesize(&self, _text: &str, _voice_id: Option<&str>) -> VoiceResult<Vec<u8>> {
            match &self.0 {
                Ok(bytes) => Ok(bytes.clone()),
                Err(e) => Err(VoiceError::Tts(e.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn audio_is_base64_mpeg() {
        let reply = speak_or_fallback(&FixedTts(Ok(b"ID3".to_vec())), "hi", None).await;
        let v = serde_json::to_value(&reply).unwrap();
        assert_eq!(v["audio"], "SUQz");
        assert_eq!(v["contentType"], "audio/mpeg");
    }

    #[tokio::test]
    async fn empty_or_failed_synthesis_uses_browser_voice() {
        let empty = speak_or_fallback(&PlaceholderTts, "hi", None).await;
        assert_eq!(serde_json::to_value(&empty).unwrap(), serde_json::json!({"useBrowserTTS": true}));

        let failed = speak_or_fallback(&FixedTts(Err(VoiceError::Tts("boom".into()))), "hi", None).await;
        assert_eq!(failed, TtsReply::browser());
    }

    #[test]
    fn blank_key_is_rejected_and_voice_defaults() {
        assert!(ElevenLabsTts::new("  ", None).is_err());
        let tts = ElevenLabsTts::new("key", Some(String::new())).unwrap();
        assert_eq!(tts.voice_id(), DEFAULT_VOICE_ID);
    }
}
