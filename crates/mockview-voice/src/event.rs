//! Events flowing into and out of the session coordinator.
//!
//! `ProviderEvent` is what a provider client reports; `SessionNotice` is what the
//! coordinator tells its owner (the UI/orchestration layer).

use mockview_core::{TranscriptRole, TranscriptTurn};
use serde::{Deserialize, Serialize};

/// Lifecycle state of one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    #[default]
    Idle,
    Connecting,
    Active,
    Ended,
}

/// A transcript turn as the provider reports it. `role` is free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTurn {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl RawTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

impl From<&RawTurn> for TranscriptTurn {
    fn from(raw: &RawTurn) -> Self {
        TranscriptTurn {
            role: TranscriptRole::from_provider(&raw.role),
            content: raw.content.clone(),
        }
    }
}

/// Asynchronous notifications from the voice provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProviderEvent {
    CallStarted,
    CallEnded,
    AgentStartTalking,
    AgentStopTalking,
    /// Full transcript snapshot so far. `None` carries no transcript and is ignored.
    Update {
        #[serde(default)]
        transcript: Option<Vec<RawTurn>>,
    },
    Error {
        #[serde(default)]
        message: String,
    },
}

impl ProviderEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CallStarted => "call_started",
            Self::CallEnded => "call_ended",
            Self::AgentStartTalking => "agent_start_talking",
            Self::AgentStopTalking => "agent_stop_talking",
            Self::Update { .. } => "update",
            Self::Error { .. } => "error",
        }
    }
}

/// Why a session reached `Ended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The provider reported `call_ended`.
    ProviderEnded,
    /// The user hung up and the provider never confirmed in time.
    FallbackTimer,
    /// The provider reported an error mid-call.
    ProviderError,
    /// A new `start_call` tore down a call that was still live.
    Replaced,
}

/// Delivered exactly once per session, carrying the final transcript snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSession {
    pub session_id: String,
    pub transcript: Vec<TranscriptTurn>,
    pub reason: TerminationReason,
    /// Provider error text when `reason` is `ProviderError`.
    pub error: Option<String>,
}

/// Notifications emitted on the coordinator's channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    CallStarted { session_id: String },
    AgentSpeaking(bool),
    Error(String),
    Completed(CompletedSession),
}
