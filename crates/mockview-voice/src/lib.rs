//! # mockview-voice - Voice interview session layer
//!
//! Owns the lifecycle of one live interview call and hands its transcript to the
//! scoring pipeline exactly once.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  VoiceSessionCoordinator                      │
//! │  ┌───────────────┐  EventSink(gen)  ┌────────────────────┐   │
//! │  │ ProviderClient│ ───────────────▶ │ dispatch (match on │   │
//! │  │ (fresh / call)│ ◀── stop_call ── │  state × event)    │   │
//! │  └───────────────┘                  └─────────┬──────────┘   │
//! │                      fallback timer ──▶ terminate (guarded)  │
//! └───────────────────────────────────────────────┼──────────────┘
//!                                    SessionNotice::Completed
//!                                                 ▼
//!                    finish_interview ──▶ CompletionPipeline ──▶ results path
//!                                                 ▼
//!                                         AnalysisPoller (3s)
//! ```

pub mod completion;
pub mod error;
pub mod event;
pub mod poller;
pub mod provider;
pub mod retell;
pub mod session;
pub mod tts;

pub use completion::{
    finish_interview, results_path, CompletionClient, CompletionOutcome, CompletionPipeline,
    CompletionRequest, InterviewContext,
};
pub use error::{VoiceError, VoiceResult};
pub use event::{
    CallState, CompletedSession, ProviderEvent, RawTurn, SessionNotice, TerminationReason,
};
pub use poller::{AnalysisPoller, AnalysisStatus};
pub use provider::{ProviderClient, ProviderFactory};
pub use retell::{
    sign_payload, verify_signature, DynamicVariables, RetellApi, WebCall, WebCallProvisioner,
    WebhookAction, WebhookEvent,
};
pub use session::{CoordinatorConfig, EventSink, SessionView, VoiceSessionCoordinator};
pub use tts::{speak_or_fallback, ElevenLabsTts, PlaceholderTts, TtsBackend, TtsReply};
