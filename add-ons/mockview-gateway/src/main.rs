//! Mockview Gateway: HTTP API for mock interviews.
//!
//! Serves question generation, the text-mode turn loop, transcript scoring, the analysis
//! the results page polls for, TTS, and the voice provider's web-call and webhook endpoints.

mod handlers;

use axum::http::{Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use mockview_core::{AppConfig, GeminiClient, InterviewStore, Interviewer};
use mockview_voice::{ElevenLabsTts, PlaceholderTts, RetellApi, TtsBackend, WebCallProvisioner};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<AppConfig>,
    pub(crate) store: Arc<InterviewStore>,
    pub(crate) interviewer: Arc<Interviewer>,
    pub(crate) tts: Arc<dyn TtsBackend>,
    pub(crate) calls: Arc<dyn WebCallProvisioner>,
}

fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/interviews", post(handlers::interview::create_interview))
        .route("/api/interviews/:id", get(handlers::interview::get_interview))
        .route("/api/interview/start", post(handlers::interview::start))
        .route("/api/interview/respond", post(handlers::interview::respond))
        .route("/api/interview/complete", post(handlers::interview::complete))
        .route("/api/analysis/:id", get(handlers::analysis::get_analysis))
        .route("/api/tts", post(handlers::tts::synthesize))
        .route("/api/retell/create-web-call", post(handlers::retell::create_web_call))
        .route(
            "/api/retell/webhook",
            post(handlers::retell::webhook).get(handlers::retell::webhook_status),
        )
        .layer(cors)
        .with_state(state)
}

async fn health(axum::extract::State(state): axum::extract::State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": state.config.app_name,
            "time": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[mockview-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::load() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("❌ Config error: {}", e);
            std::process::exit(1);
        }
    };

    let store = match InterviewStore::open(&config.storage_path) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("❌ Failed to open store at {}: {}", config.storage_path, e);
            std::process::exit(1);
        }
    };
    if let Some((token, user_id)) = config.dev_credentials() {
        match store.register_token(&token, &user_id) {
            Ok(()) => tracing::info!(target: "mockview::gateway", user_id = %user_id, "Dev token registered"),
            Err(e) => tracing::warn!(target: "mockview::gateway", "dev token not registered: {}", e),
        }
    }

    let gemini = GeminiClient::new(config.gemini_api_key.clone()).with_model(&config.gemini_model);
    if !gemini.has_api_key() {
        tracing::warn!(target: "mockview::gateway", "GEMINI_API_KEY not set; interviewer will use canned questions and reports");
    }
    let interviewer = Arc::new(Interviewer::new(Arc::new(gemini)));

    let tts: Arc<dyn TtsBackend> = match config.elevenlabs_api_key.as_deref() {
        Some(key) => match ElevenLabsTts::new(key, config.elevenlabs_voice_id.clone()) {
            Ok(tts) => {
                tracing::info!(target: "mockview::gateway", voice = tts.voice_id(), "🔊 ElevenLabs TTS enabled");
                Arc::new(tts)
            }
            Err(e) => {
                tracing::warn!(target: "mockview::gateway", "ElevenLabs disabled: {}", e);
                Arc::new(PlaceholderTts)
            }
        },
        None => Arc::new(PlaceholderTts),
    };

    let calls = match RetellApi::new(
        config.retell_api_key.clone().unwrap_or_default(),
        config.retell_agent_id.clone().unwrap_or_default(),
    ) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            eprintln!("❌ Failed to build voice provider client: {}", e);
            std::process::exit(1);
        }
    };
    if config.retell_api_key.is_none() || config.retell_agent_id.is_none() {
        tracing::warn!(target: "mockview::gateway", "RETELL_API_KEY / RETELL_AGENT_ID not set; voice calls are unavailable");
    }

    let state = AppState {
        config: Arc::clone(&config),
        store: Arc::clone(&store),
        interviewer,
        tts,
        calls,
    };
    let app = build_app(state);

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("❌ Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!(target: "mockview::gateway", "🚀 {} listening on http://{}", config.app_name, addr);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(target: "mockview::gateway", "ctrl-c handler failed: {}", e);
        }
    };
    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
        tracing::error!(target: "mockview::gateway", "server error: {}", e);
    }
    if let Err(e) = store.flush() {
        tracing::warn!(target: "mockview::gateway", "store flush on shutdown failed: {}", e);
    }
    tracing::info!(target: "mockview::gateway", "Gateway stopped");
}
