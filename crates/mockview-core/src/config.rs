//! Application configuration.
//!
//! Precedence: built-in defaults < `config/gateway.toml` (or the file named by
//! `MOCKVIEW_CONFIG`) < `MOCKVIEW__*` environment variables. Provider keys are
//! additionally read from their conventional names so an existing `.env` works as-is.
//!
//! | Env | Description |
//! |-----|-------------|
//! | GEMINI_API_KEY | Scoring/question model key. Unset => canned questions and fallback report. |
//! | RETELL_API_KEY | Voice provider key; also the webhook signing secret. |
//! | RETELL_AGENT_ID | Voice agent used for web calls. |
//! | ELEVENLABS_API_KEY | TTS key. Unset => clients use the synthetic browser voice. |
//! | MOCKVIEW__PORT | Gateway port (default 8000). |
//! | MOCKVIEW__DEV_TOKEN | `token:user_id` accepted as a bearer token. |

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub host: String,
    pub port: u16,
    /// Root directory for the sled store.
    pub storage_path: String,
    /// Base URL clients use to reach this gateway (completion + polling).
    pub public_base_url: String,
    pub gemini_model: String,
    /// Grace period after a manual hang-up before completion is forced.
    pub fallback_timeout_ms: u64,
    /// Audio sample rate requested from the voice provider.
    pub sample_rate: u32,
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub retell_api_key: Option<String>,
    #[serde(default)]
    pub retell_agent_id: Option<String>,
    #[serde(default)]
    pub elevenlabs_api_key: Option<String>,
    #[serde(default)]
    pub elevenlabs_voice_id: Option<String>,
    /// `token:user_id` registered at startup for local use (there is no login service).
    #[serde(default)]
    pub dev_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "Mockview Gateway".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            storage_path: "./data".to_string(),
            public_base_url: "http://127.0.0.1:8000".to_string(),
            gemini_model: crate::llm::DEFAULT_GEMINI_MODEL.to_string(),
            fallback_timeout_ms: 500,
            sample_rate: 24_000,
            poll_interval_ms: 3_000,
            gemini_api_key: None,
            retell_api_key: None,
            retell_agent_id: None,
            elevenlabs_api_key: None,
            elevenlabs_voice_id: None,
            dev_token: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("MOCKVIEW_CONFIG").unwrap_or_else(|_| "config/gateway".to_string());
        let d = Self::default();
        let builder = config::Config::builder()
            .set_default("app_name", d.app_name)?
            .set_default("host", d.host)?
            .set_default("port", d.port as i64)?
            .set_default("storage_path", d.storage_path)?
            .set_default("public_base_url", d.public_base_url)?
            .set_default("gemini_model", d.gemini_model)?
            .set_default("fallback_timeout_ms", d.fallback_timeout_ms as i64)?
            .set_default("sample_rate", d.sample_rate as i64)?
            .set_default("poll_interval_ms", d.poll_interval_ms as i64)?;

        let toml_path = format!("{}.toml", config_path.trim_end_matches(".toml"));
        let builder = if Path::new(&toml_path).exists() {
            builder.add_source(config::File::with_name(&toml_path))
        } else {
            builder
        };

        let mut cfg: AppConfig = builder
            .add_source(config::Environment::with_prefix("MOCKVIEW").separator("__"))
            .build()?
            .try_deserialize()?;
        cfg.overlay_provider_env();
        Ok(cfg)
    }

    /// Conventional provider env names win over file values; blanks count as unset.
    fn overlay_provider_env(&mut self) {
        let pick = |name: &str, current: &mut Option<String>| {
            if let Some(v) = env_opt_string(name) {
                *current = Some(v);
            } else if current.as_deref().map(str::trim) == Some("") {
                *current = None;
            }
        };
        pick("GEMINI_API_KEY", &mut self.gemini_api_key);
        pick("RETELL_API_KEY", &mut self.retell_api_key);
        pick("RETELL_AGENT_ID", &mut self.retell_agent_id);
        pick("ELEVENLABS_API_KEY", &mut self.elevenlabs_api_key);
        pick("ELEVENLABS_VOICE_ID", &mut self.elevenlabs_voice_id);
    }

    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_millis(self.fallback_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// `(token, user_id)` from `dev_token`; a bare token maps to `dev-user`.
    pub fn dev_credentials(&self) -> Option<(String, String)> {
        let raw = self.dev_token.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
        match raw.split_once(':') {
            Some((token, user)) if !token.is_empty() && !user.is_empty() => {
                Some((token.to_string(), user.to_string()))
            }
            _ => Some((raw.to_string(), "dev-user".to_string())),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_voice_contract() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.fallback_timeout(), Duration::from_millis(500));
        assert_eq!(cfg.sample_rate, 24_000);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(3));
        assert_eq!(cfg.bind_addr(), "127.0.0.1:8000");
    }

    #[test]
    fn dev_token_splits_user() {
        let mut cfg = AppConfig {
            dev_token: Some("tok-1:alice".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(cfg.dev_credentials(), Some(("tok-1".into(), "alice".into())));
        cfg.dev_token = Some("tok-2".to_string());
        assert_eq!(cfg.dev_credentials(), Some(("tok-2".into(), "dev-user".into())));
        cfg.dev_token = Some(" ".to_string());
        assert_eq!(cfg.dev_credentials(), None);
    }

    #[test]
    fn blank_provider_keys_are_cleared() {
        let mut cfg = AppConfig {
            retell_agent_id: Some("   ".to_string()),
            ..AppConfig::default()
        };
        // Only meaningful when the variable is absent from the test environment.
        if std::env::var("RETELL_AGENT_ID").is_err() {
            cfg.overlay_provider_env();
            assert_eq!(cfg.retell_agent_id, None);
        }
    }
}
