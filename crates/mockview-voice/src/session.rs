//! VoiceSessionCoordinator: the lifecycle state machine for one interview call.
//!
//! ```text
//!   idle ──start_call──▶ connecting ──call_started──▶ active ──┬─ call_ended ──▶ ended
//!    ▲                       │                                  ├─ error ───────▶ ended
//!    └── open rejected / ────┘                                  └─ end_call ──(stop, ≤fallback)──▶ ended
//!        error / end_call
//! ```
//!
//! Every path into `ended` goes through `terminate`, which checks and sets the
//! session's `has_ended` guard under the slot lock. Only the first caller gets to
//! emit `SessionNotice::Completed`; later signals (duplicate `call_ended`, the
//! fallback timer, a second `end_call`) are absorbed.
//!
//! Provider clients never hold the coordinator directly: they get an `EventSink`
//! stamped with their attempt's generation, and anything arriving with a stale
//! generation is dropped.

use crate::error::{VoiceError, VoiceResult};
use crate::event::{
    CallState, CompletedSession, ProviderEvent, SessionNotice, TerminationReason,
};
use crate::provider::{ProviderClient, ProviderFactory};
use mockview_core::{AppConfig, TranscriptTurn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Configuration for the session coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long `end_call` waits for the provider's `call_ended` before forcing completion (default: 500ms)
    pub fallback_timeout: Duration,

    /// Sample rate requested when opening the call (default: 24000 Hz)
    pub sample_rate: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            fallback_timeout: Duration::from_millis(500),
            sample_rate: 24_000,
        }
    }
}

impl From<&AppConfig> for CoordinatorConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            fallback_timeout: cfg.fallback_timeout(),
            sample_rate: cfg.sample_rate,
        }
    }
}

/// Observable snapshot of the coordinator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionView {
    pub session_id: Option<String>,
    pub state: CallState,
    pub is_active: bool,
    pub is_connecting: bool,
    pub is_agent_speaking: bool,
    pub transcript: Vec<TranscriptTurn>,
    pub last_error: Option<String>,
}

struct Session {
    id: String,
    generation: u64,
    state: CallState,
    has_ended: bool,
    stop_requested: bool,
    agent_speaking: bool,
    transcript: Vec<TranscriptTurn>,
    client: Option<Arc<dyn ProviderClient>>,
}

impl Session {
    fn connecting(generation: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            generation,
            state: CallState::Connecting,
            has_ended: false,
            stop_requested: false,
            agent_speaking: false,
            transcript: Vec::new(),
            client: None,
        }
    }
}

#[derive(Default)]
struct Slot {
    next_generation: u64,
    session: Option<Session>,
    last_error: Option<String>,
}

impl Slot {
    fn current(&mut self, generation: u64) -> Option<&mut Session> {
        self.session.as_mut().filter(|s| s.generation == generation)
    }
}

/// What `dispatch` must do once the slot lock is released.
enum Followup {
    Nothing,
    /// Connecting attempt failed: back to idle, surface the error, drop the client.
    Reset(String),
    /// Active call failed: already terminated, surface the error and hang up.
    Failed(String),
}

struct Shared {
    slot: Mutex<Slot>,
    notices: mpsc::UnboundedSender<SessionNotice>,
    config: CoordinatorConfig,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, notice: SessionNotice) {
        if self.notices.send(notice).is_err() {
            debug!(target: "mockview::voice", "notice receiver dropped");
        }
    }

    /// The single termination path. Returns false when the guard was already set.
    fn terminate(&self, session: &mut Session, reason: TerminationReason, error: Option<String>) -> bool {
        if session.has_ended {
            debug!(target: "mockview::voice", session_id = %session.id, ?reason, "termination absorbed");
            return false;
        }
        session.has_ended = true;
        session.state = CallState::Ended;
        session.agent_speaking = false;
        info!(
            target: "mockview::voice",
            session_id = %session.id,
            ?reason,
            turns = session.transcript.len(),
            "📴 Call ended"
        );
        self.notify(SessionNotice::Completed(CompletedSession {
            session_id: session.id.clone(),
            transcript: session.transcript.clone(),
            reason,
            error,
        }));
        true
    }

    fn dispatch(&self, generation: u64, event: ProviderEvent) {
        let mut slot = self.lock();
        let Some(session) = slot.current(generation) else {
            debug!(target: "mockview::voice", generation, event = event.name(), "dropping event from stale client");
            return;
        };

        let followup = match (session.state, event) {
            (CallState::Connecting, ProviderEvent::CallStarted) => {
                session.state = CallState::Active;
                info!(target: "mockview::voice", session_id = %session.id, "📞 Call started");
                self.notify(SessionNotice::CallStarted {
                    session_id: session.id.clone(),
                });
                Followup::Nothing
            }
            (CallState::Active, ProviderEvent::AgentStartTalking) => {
                session.agent_speaking = true;
                self.notify(SessionNotice::AgentSpeaking(true));
                Followup::Nothing
            }
            (CallState::Active, ProviderEvent::AgentStopTalking) => {
                session.agent_speaking = false;
                self.notify(SessionNotice::AgentSpeaking(false));
                Followup::Nothing
            }
            (CallState::Active, ProviderEvent::Update { transcript: Some(turns) }) => {
                session.transcript = turns.iter().map(TranscriptTurn::from).collect();
                debug!(target: "mockview::voice", turns = session.transcript.len(), "transcript snapshot");
                Followup::Nothing
            }
            (CallState::Connecting | CallState::Active, ProviderEvent::CallEnded) => {
                self.terminate(session, TerminationReason::ProviderEnded, None);
                Followup::Nothing
            }
            (CallState::Connecting, ProviderEvent::Error { message }) => Followup::Reset(message),
            (CallState::Active, ProviderEvent::Error { message }) => {
                warn!(target: "mockview::voice", session_id = %session.id, "Provider error mid-call: {}", message);
                if self.terminate(session, TerminationReason::ProviderError, Some(message.clone())) {
                    Followup::Failed(message)
                } else {
                    Followup::Nothing
                }
            }
            (state, event) => {
                debug!(target: "mockview::voice", ?state, event = event.name(), "event ignored in this state");
                Followup::Nothing
            }
        };

        match followup {
            Followup::Nothing => {}
            Followup::Reset(message) => {
                warn!(target: "mockview::voice", "Provider error while connecting: {}", message);
                let client = slot.session.take().and_then(|s| s.client);
                slot.last_error = Some(message.clone());
                drop(slot);
                self.notify(SessionNotice::Error(message));
                if let Some(client) = client {
                    client.stop_call();
                }
            }
            Followup::Failed(message) => {
                let client = slot.current(generation).and_then(|s| s.client.clone());
                slot.last_error = Some(message.clone());
                drop(slot);
                self.notify(SessionNotice::Error(message));
                if let Some(client) = client {
                    client.stop_call();
                }
            }
        }
    }

    /// Fallback after a manual hang-up that the provider never confirmed.
    fn force_end(&self, generation: u64) {
        let mut slot = self.lock();
        if let Some(session) = slot.current(generation) {
            if self.terminate(session, TerminationReason::FallbackTimer, None) {
                warn!(target: "mockview::voice", "⏱️ Provider never confirmed hang-up; completion forced");
            }
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        let slot = self.slot.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = slot.session.take() {
            if !session.has_ended {
                if let Some(client) = session.client {
                    client.stop_call();
                }
            }
        }
    }
}

/// The only path from a provider client back into the coordinator.
#[derive(Clone)]
pub struct EventSink {
    shared: Weak<Shared>,
    generation: u64,
}

impl EventSink {
    /// Deliver one provider event. Events for a replaced attempt are dropped.
    pub fn emit(&self, event: ProviderEvent) {
        if let Some(shared) = self.shared.upgrade() {
            shared.dispatch(self.generation, event);
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("generation", &self.generation)
            .finish()
    }
}

/// Owns the call lifecycle for one interview. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct VoiceSessionCoordinator {
    shared: Arc<Shared>,
    factory: Arc<dyn ProviderFactory>,
}

impl VoiceSessionCoordinator {
    pub fn new(
        factory: Arc<dyn ProviderFactory>,
        config: CoordinatorConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SessionNotice>) {
        let (notices, notice_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot::default()),
            notices,
            config,
        });
        (Self { shared, factory }, notice_rx)
    }

    /// Open a call with a short-lived provider credential.
    ///
    /// Any previous client is stopped first; a previous call that was still live
    /// completes with `TerminationReason::Replaced`. Fails with `Setup` when the
    /// provider rejects the open, leaving the coordinator idle.
    pub async fn start_call(&self, credential: &str) -> VoiceResult<()> {
        if credential.trim().is_empty() {
            return Err(VoiceError::MissingCredential);
        }

        let (generation, previous) = {
            let mut slot = self.shared.lock();
            let mut previous = slot.session.take();
            if let Some(prev) = previous.as_mut() {
                if prev.state == CallState::Active {
                    self.shared.terminate(prev, TerminationReason::Replaced, None);
                }
            }
            slot.next_generation += 1;
            let generation = slot.next_generation;
            slot.last_error = None;
            slot.session = Some(Session::connecting(generation));
            (generation, previous.and_then(|s| s.client))
        };
        if let Some(previous) = previous {
            debug!(target: "mockview::voice", "tearing down previous provider client");
            previous.stop_call();
        }

        let client = self.factory.create(EventSink {
            shared: Arc::downgrade(&self.shared),
            generation,
        });
        {
            let mut slot = self.shared.lock();
            match slot.current(generation) {
                Some(session) => session.client = Some(client.clone()),
                None => {
                    drop(slot);
                    client.stop_call();
                    return Err(VoiceError::Abandoned);
                }
            }
        }

        info!(target: "mockview::voice", generation, "🎙️ Opening call");
        match client.start_call(credential, self.shared.config.sample_rate).await {
            Ok(()) => {
                let slot = self.shared.lock();
                if slot.session.as_ref().map(|s| s.generation) == Some(generation) {
                    Ok(())
                } else {
                    Err(slot
                        .last_error
                        .clone()
                        .map(VoiceError::Provider)
                        .unwrap_or(VoiceError::Abandoned))
                }
            }
            Err(e) => {
                let message = e.to_string();
                warn!(target: "mockview::voice", "Failed to start call: {}", message);
                let reset = {
                    let mut slot = self.shared.lock();
                    let connecting = slot
                        .current(generation)
                        .map_or(false, |s| s.state == CallState::Connecting);
                    if connecting {
                        slot.session = None;
                        slot.last_error = Some(message.clone());
                    }
                    connecting
                };
                if reset {
                    self.shared.notify(SessionNotice::Error(message.clone()));
                    client.stop_call();
                }
                Err(VoiceError::Setup(message))
            }
        }
    }

    /// Hang up. Safe in any state and idempotent.
    ///
    /// While active this asks the provider to stop and arms the fallback timer;
    /// completion then comes from whichever of `call_ended` or the timer is first.
    /// While connecting the attempt is cancelled and the coordinator returns to idle.
    pub fn end_call(&self) {
        let (client, generation) = {
            let mut slot = self.shared.lock();
            let state = slot.session.as_ref().map(|s| s.state);
            match state {
                Some(CallState::Connecting) => {
                    info!(target: "mockview::voice", "Call cancelled while connecting");
                    let client = slot.session.take().and_then(|s| s.client);
                    drop(slot);
                    if let Some(client) = client {
                        client.stop_call();
                    }
                    return;
                }
                Some(CallState::Active) => {
                    let Some(session) = slot.session.as_mut() else {
                        return;
                    };
                    if session.has_ended || session.stop_requested {
                        return;
                    }
                    session.stop_requested = true;
                    session.agent_speaking = false;
                    (session.client.clone(), session.generation)
                }
                _ => {
                    debug!(target: "mockview::voice", "end_call with no live call; ignoring");
                    return;
                }
            }
        };

        info!(target: "mockview::voice", "🛑 Hanging up");
        if let Some(client) = client {
            client.stop_call();
        }
        self.arm_fallback(generation);
    }

    fn arm_fallback(&self, generation: u64) {
        let shared = Arc::clone(&self.shared);
        let timeout = shared.config.fallback_timeout;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(timeout).await;
                    shared.force_end(generation);
                });
            }
            Err(_) => {
                warn!(target: "mockview::voice", "No async runtime for fallback timer; completing now");
                shared.force_end(generation);
            }
        }
    }

    pub fn view(&self) -> SessionView {
        let slot = self.shared.lock();
        match slot.session.as_ref() {
            Some(s) => SessionView {
                session_id: Some(s.id.clone()),
                state: s.state,
                is_active: s.state == CallState::Active && !s.stop_requested,
                is_connecting: s.state == CallState::Connecting,
                is_agent_speaking: s.agent_speaking,
                transcript: s.transcript.clone(),
                last_error: slot.last_error.clone(),
            },
            None => SessionView {
                last_error: slot.last_error.clone(),
                ..SessionView::default()
            },
        }
    }

    pub fn state(&self) -> CallState {
        self.shared
            .lock()
            .session
            .as_ref()
            .map_or(CallState::Idle, |s| s.state)
    }

    pub fn session_id(&self) -> Option<String> {
        self.shared.lock().session.as_ref().map(|s| s.id.clone())
    }

    pub fn transcript(&self) -> Vec<TranscriptTurn> {
        self.shared
            .lock()
            .session
            .as_ref()
            .map(|s| s.transcript.clone())
            .unwrap_or_default()
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.lock().last_error.clone()
    }

    pub fn is_active(&self) -> bool {
        self.view().is_active
    }

    pub fn is_connecting(&self) -> bool {
        self.state() == CallState::Connecting
    }

    pub fn is_agent_speaking(&self) -> bool {
        self.shared
            .lock()
            .session
            .as_ref()
            .map_or(false, |s| s.agent_speaking)
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.shared.config
    }
}
