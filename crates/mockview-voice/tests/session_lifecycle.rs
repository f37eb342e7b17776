//! Lifecycle tests for the session coordinator against a scripted provider.

use mockview_core::{TranscriptRole, TranscriptTurn};
use mockview_voice::{
    CallState, CompletedSession, CoordinatorConfig, EventSink, ProviderClient, ProviderEvent,
    ProviderFactory, RawTurn, SessionNotice, TerminationReason, VoiceError, VoiceResult,
    VoiceSessionCoordinator,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

const FALLBACK: Duration = Duration::from_millis(60);

#[derive(Clone, Default)]
struct Behaviour {
    /// `start_call` fails with this message.
    reject_open: Option<String>,
    /// Emit an `error` event during `start_call`, then return Ok.
    error_on_open: Option<String>,
    /// Emit `call_started` from inside `start_call`.
    start_on_open: bool,
    /// Emit `call_ended` synchronously from `stop_call`.
    end_on_stop: bool,
    /// Block `start_call` until notified.
    hold_open: Option<Arc<Notify>>,
}

struct MockClient {
    sink: EventSink,
    behaviour: Behaviour,
    stops: AtomicUsize,
    credentials: Mutex<Vec<(String, u32)>>,
}

impl MockClient {
    fn emit(&self, event: ProviderEvent) {
        self.sink.emit(event);
    }

    fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ProviderClient for MockClient {
    async fn start_call(&self, credential: &str, sample_rate: u32) -> VoiceResult<()> {
        self.credentials
            .lock()
            .unwrap()
            .push((credential.to_string(), sample_rate));
        if let Some(gate) = &self.behaviour.hold_open {
            gate.notified().await;
        }
        if let Some(msg) = &self.behaviour.reject_open {
            return Err(VoiceError::Provider(msg.clone()));
        }
        if let Some(msg) = &self.behaviour.error_on_open {
            self.sink.emit(ProviderEvent::Error {
                message: msg.clone(),
            });
            return Ok(());
        }
        if self.behaviour.start_on_open {
            self.sink.emit(ProviderEvent::CallStarted);
        }
        Ok(())
    }

    fn stop_call(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.behaviour.end_on_stop {
            self.sink.emit(ProviderEvent::CallEnded);
        }
    }
}

#[derive(Default)]
struct MockFactory {
    behaviour: Mutex<Behaviour>,
    clients: Mutex<Vec<Arc<MockClient>>>,
}

impl MockFactory {
    fn with(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour: Mutex::new(behaviour),
            clients: Mutex::new(Vec::new()),
        })
    }

    fn set(&self, behaviour: Behaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    fn client(&self, index: usize) -> Arc<MockClient> {
        self.clients.lock().unwrap()[index].clone()
    }

    fn created(&self) -> usize {
        self.clients.lock().unwrap().len()
    }
}

impl ProviderFactory for MockFactory {
    fn create(&self, sink: EventSink) -> Arc<dyn ProviderClient> {
        let client = Arc::new(MockClient {
            sink,
            behaviour: self.behaviour.lock().unwrap().clone(),
            stops: AtomicUsize::new(0),
            credentials: Mutex::new(Vec::new()),
        });
        self.clients.lock().unwrap().push(client.clone());
        client
    }
}

fn coordinator(
    factory: &Arc<MockFactory>,
) -> (VoiceSessionCoordinator, mpsc::UnboundedReceiver<SessionNotice>) {
    VoiceSessionCoordinator::new(
        factory.clone(),
        CoordinatorConfig {
            fallback_timeout: FALLBACK,
            ..CoordinatorConfig::default()
        },
    )
}

fn drain(rx: &mut mpsc::UnboundedReceiver<SessionNotice>) -> Vec<SessionNotice> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

fn completions(notices: &[SessionNotice]) -> Vec<CompletedSession> {
    notices
        .iter()
        .filter_map(|n| match n {
            SessionNotice::Completed(c) => Some(c.clone()),
            _ => None,
        })
        .collect()
}

fn update(turns: &[(&str, &str)]) -> ProviderEvent {
    ProviderEvent::Update {
        transcript: Some(turns.iter().map(|(r, c)| RawTurn::new(*r, *c)).collect()),
    }
}

async fn past_fallback() {
    tokio::time::sleep(FALLBACK * 3).await;
}

/// Opens a call and moves it to `Active`.
async fn active_call(
    factory: &Arc<MockFactory>,
    coord: &VoiceSessionCoordinator,
) -> Arc<MockClient> {
    coord.start_call("cred-1").await.unwrap();
    let client = factory.client(factory.created() - 1);
    client.emit(ProviderEvent::CallStarted);
    assert_eq!(coord.state(), CallState::Active);
    client
}

#[tokio::test]
async fn hang_up_without_provider_confirmation_completes_once() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let factory = MockFactory::with(Behaviour::default());
    let (coord, mut rx) = VoiceSessionCoordinator::new(factory.clone(), CoordinatorConfig::default());

    coord.start_call("cred-1").await.unwrap();
    assert_eq!(coord.state(), CallState::Connecting);
    assert!(coord.is_connecting());
    let client = factory.client(0);
    assert_eq!(client.credentials.lock().unwrap()[0], ("cred-1".to_string(), 24_000));

    client.emit(ProviderEvent::CallStarted);
    assert_eq!(coord.state(), CallState::Active);
    assert!(coord.is_active());

    client.emit(update(&[("agent", "Tell me about yourself")]));
    assert_eq!(coord.transcript(), vec![TranscriptTurn::agent("Tell me about yourself")]);

    coord.end_call();
    assert!(!coord.is_active());
    assert_eq!(client.stops(), 1);

    let completed = tokio::time::timeout(Duration::from_millis(700), async {
        loop {
            match rx.recv().await {
                Some(SessionNotice::Completed(c)) => break c,
                Some(_) => continue,
                None => panic!("notice channel closed"),
            }
        }
    })
    .await
    .expect("completion within the fallback window");

    assert_eq!(completed.reason, TerminationReason::FallbackTimer);
    assert_eq!(completed.transcript.len(), 1);
    assert_eq!(completed.transcript[0].role, TranscriptRole::Agent);
    assert_eq!(coord.state(), CallState::Ended);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(completions(&drain(&mut rx)).is_empty());
}

#[tokio::test]
async fn provider_end_then_manual_end_fires_once() {
    let factory = MockFactory::with(Behaviour::default());
    let (coord, mut rx) = coordinator(&factory);
    let client = active_call(&factory, &coord).await;

    client.emit(update(&[("agent", "Q1"), ("user", "A1")]));
    client.emit(ProviderEvent::CallEnded);
    client.emit(ProviderEvent::CallEnded);
    coord.end_call();
    past_fallback().await;

    let done = completions(&drain(&mut rx));
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].reason, TerminationReason::ProviderEnded);
    assert_eq!(done[0].transcript.len(), 2);
    assert_eq!(client.stops(), 0, "no hang-up after the call already ended");
}

#[tokio::test]
async fn manual_end_confirmed_synchronously_fires_once() {
    let factory = MockFactory::with(Behaviour {
        end_on_stop: true,
        ..Behaviour::default()
    });
    let (coord, mut rx) = coordinator(&factory);
    let _client = active_call(&factory, &coord).await;

    coord.end_call();
    assert_eq!(coord.state(), CallState::Ended);
    past_fallback().await;

    let done = completions(&drain(&mut rx));
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].reason, TerminationReason::ProviderEnded);
}

#[tokio::test]
async fn late_provider_end_after_timer_is_absorbed() {
    let factory = MockFactory::with(Behaviour::default());
    let (coord, mut rx) = coordinator(&factory);
    let client = active_call(&factory, &coord).await;
    client.emit(update(&[("agent", "Q1")]));

    coord.end_call();
    past_fallback().await;
    client.emit(update(&[("agent", "Q1"), ("user", "late answer")]));
    client.emit(ProviderEvent::CallEnded);

    let done = completions(&drain(&mut rx));
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].reason, TerminationReason::FallbackTimer);
    assert_eq!(done[0].transcript, vec![TranscriptTurn::agent("Q1")]);
    assert_eq!(coord.transcript(), vec![TranscriptTurn::agent("Q1")]);
}

#[tokio::test]
async fn end_call_is_idempotent() {
    let factory = MockFactory::with(Behaviour::default());
    let (coord, mut rx) = coordinator(&factory);

    coord.end_call();
    assert_eq!(coord.state(), CallState::Idle);

    let client = active_call(&factory, &coord).await;
    coord.end_call();
    coord.end_call();
    assert_eq!(client.stops(), 1);
    past_fallback().await;
    coord.end_call();
    past_fallback().await;

    assert_eq!(completions(&drain(&mut rx)).len(), 1);
    assert_eq!(client.stops(), 1);
}

#[tokio::test]
async fn transcript_snapshots_replace_never_append() {
    let factory = MockFactory::with(Behaviour::default());
    let (coord, _rx) = coordinator(&factory);
    let client = active_call(&factory, &coord).await;

    client.emit(update(&[("agent", "Hi")]));
    client.emit(update(&[("agent", "Hi"), ("user", "Hello")]));
    client.emit(update(&[("agent", "Hi there"), ("user", "Hello"), ("agent", "Ready?")]));
    client.emit(ProviderEvent::Update { transcript: None });

    assert_eq!(
        coord.transcript(),
        vec![
            TranscriptTurn::agent("Hi there"),
            TranscriptTurn::user("Hello"),
            TranscriptTurn::agent("Ready?"),
        ]
    );
}

#[tokio::test]
async fn out_of_order_events_are_no_ops() {
    let factory = MockFactory::with(Behaviour::default());
    let (coord, mut rx) = coordinator(&factory);

    coord.start_call("cred-1").await.unwrap();
    let client = factory.client(0);

    client.emit(ProviderEvent::AgentStartTalking);
    client.emit(update(&[("agent", "too early")]));
    assert_eq!(coord.state(), CallState::Connecting);
    assert!(!coord.is_agent_speaking());
    assert!(coord.transcript().is_empty());

    client.emit(ProviderEvent::CallStarted);
    client.emit(ProviderEvent::CallStarted);
    client.emit(ProviderEvent::AgentStartTalking);
    assert!(coord.is_agent_speaking());
    client.emit(ProviderEvent::AgentStopTalking);
    assert!(!coord.is_agent_speaking());
    client.emit(ProviderEvent::AgentStartTalking);

    client.emit(ProviderEvent::CallEnded);
    assert_eq!(coord.state(), CallState::Ended);
    assert!(!coord.is_agent_speaking());

    client.emit(ProviderEvent::CallStarted);
    client.emit(ProviderEvent::AgentStartTalking);
    assert_eq!(coord.state(), CallState::Ended);
    assert!(!coord.is_agent_speaking());

    let notices = drain(&mut rx);
    let started = notices
        .iter()
        .filter(|n| matches!(n, SessionNotice::CallStarted { .. }))
        .count();
    assert_eq!(started, 1);
    assert_eq!(completions(&notices).len(), 1);
}

#[tokio::test]
async fn events_from_discarded_client_are_dropped() {
    let factory = MockFactory::with(Behaviour::default());
    let (coord, mut rx) = coordinator(&factory);
    let first = active_call(&factory, &coord).await;
    first.emit(update(&[("agent", "first call")]));
    first.emit(ProviderEvent::CallEnded);
    let first_session = coord.session_id();
    drain(&mut rx);

    coord.start_call("cred-2").await.unwrap();
    assert_eq!(factory.created(), 2);
    assert_eq!(first.stops(), 1, "previous client torn down before the next call");
    assert_ne!(coord.session_id(), first_session);
    assert_eq!(coord.state(), CallState::Connecting);
    assert!(coord.transcript().is_empty());

    first.emit(ProviderEvent::CallStarted);
    first.emit(update(&[("agent", "leaked")]));
    first.emit(ProviderEvent::AgentStartTalking);
    first.emit(ProviderEvent::Error {
        message: "stale".into(),
    });
    first.emit(ProviderEvent::CallEnded);

    assert_eq!(coord.state(), CallState::Connecting);
    assert!(coord.transcript().is_empty());
    assert!(coord.last_error().is_none());
    assert!(drain(&mut rx).is_empty());

    factory.client(1).emit(ProviderEvent::CallStarted);
    assert_eq!(coord.state(), CallState::Active);
}

#[tokio::test]
async fn rejected_open_returns_to_idle_and_allows_retry() {
    let factory = MockFactory::with(Behaviour {
        reject_open: Some("microphone permission denied".into()),
        ..Behaviour::default()
    });
    let (coord, mut rx) = coordinator(&factory);

    let err = coord.start_call("cred-1").await.unwrap_err();
    assert!(matches!(err, VoiceError::Setup(ref m) if m.contains("microphone")));
    assert_eq!(coord.state(), CallState::Idle);
    assert!(coord.last_error().unwrap().contains("microphone"));
    assert_eq!(factory.client(0).stops(), 1);

    let notices = drain(&mut rx);
    assert!(matches!(notices.as_slice(), [SessionNotice::Error(_)]));

    factory.set(Behaviour {
        start_on_open: true,
        ..Behaviour::default()
    });
    coord.start_call("cred-1").await.unwrap();
    assert_eq!(coord.state(), CallState::Active);
    assert!(coord.last_error().is_none());
}

#[tokio::test]
async fn empty_credential_is_refused() {
    let factory = MockFactory::with(Behaviour::default());
    let (coord, _rx) = coordinator(&factory);
    assert!(matches!(
        coord.start_call("  ").await,
        Err(VoiceError::MissingCredential)
    ));
    assert_eq!(factory.created(), 0);
}

#[tokio::test]
async fn error_while_connecting_surfaces_without_completion() {
    let factory = MockFactory::with(Behaviour {
        error_on_open: Some("handshake failed".into()),
        ..Behaviour::default()
    });
    let (coord, mut rx) = coordinator(&factory);

    let err = coord.start_call("cred-1").await.unwrap_err();
    assert!(matches!(err, VoiceError::Provider(ref m) if m == "handshake failed"));
    assert_eq!(coord.state(), CallState::Idle);
    assert_eq!(coord.last_error().as_deref(), Some("handshake failed"));

    let notices = drain(&mut rx);
    assert!(completions(&notices).is_empty());
    assert!(notices
        .iter()
        .any(|n| matches!(n, SessionNotice::Error(m) if m == "handshake failed")));
}

#[tokio::test]
async fn mid_call_error_delivers_partial_transcript() {
    let factory = MockFactory::with(Behaviour::default());
    let (coord, mut rx) = coordinator(&factory);
    let client = active_call(&factory, &coord).await;
    client.emit(update(&[("agent", "Q1"), ("user", "half an ans")]));

    client.emit(ProviderEvent::Error {
        message: "network dropped".into(),
    });
    assert_eq!(coord.state(), CallState::Ended);
    assert_eq!(coord.last_error().as_deref(), Some("network dropped"));
    assert_eq!(client.stops(), 1);

    coord.end_call();
    past_fallback().await;

    let done = completions(&drain(&mut rx));
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].reason, TerminationReason::ProviderError);
    assert_eq!(done[0].error.as_deref(), Some("network dropped"));
    assert_eq!(done[0].transcript.len(), 2);

    let view = coord.view();
    assert_eq!(view.state, CallState::Ended);
    assert!(!view.is_active);
}

#[tokio::test]
async fn end_call_while_connecting_cancels_attempt() {
    let gate = Arc::new(Notify::new());
    let factory = MockFactory::with(Behaviour {
        hold_open: Some(gate.clone()),
        ..Behaviour::default()
    });
    let (coord, mut rx) = coordinator(&factory);

    let opener = {
        let coord = coord.clone();
        tokio::spawn(async move { coord.start_call("cred-1").await })
    };
    while factory.created() == 0 || coord.state() != CallState::Connecting {
        tokio::task::yield_now().await;
    }

    coord.end_call();
    assert_eq!(coord.state(), CallState::Idle);
    assert_eq!(factory.client(0).stops(), 1);

    gate.notify_one();
    let result = opener.await.unwrap();
    assert!(matches!(result, Err(VoiceError::Abandoned)));
    past_fallback().await;
    assert!(completions(&drain(&mut rx)).is_empty());
}

#[tokio::test]
async fn starting_over_a_live_call_completes_the_old_one() {
    let factory = MockFactory::with(Behaviour::default());
    let (coord, mut rx) = coordinator(&factory);
    let first = active_call(&factory, &coord).await;
    first.emit(update(&[("agent", "Q1"), ("user", "A1")]));
    let first_id = coord.session_id().unwrap();

    coord.start_call("cred-2").await.unwrap();
    assert_eq!(first.stops(), 1);

    let done = completions(&drain(&mut rx));
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].session_id, first_id);
    assert_eq!(done[0].reason, TerminationReason::Replaced);
    assert_eq!(done[0].transcript.len(), 2);
}
