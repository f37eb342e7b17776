//! Error types for the voice session layer

use thiserror::Error;

/// Result type alias for voice operations
pub type VoiceResult<T> = Result<T, VoiceError>;

#[derive(Error, Debug)]
pub enum VoiceError {
    /// The provider refused to open the call (bad credential, microphone denied, ...).
    #[error("Call setup failed: {0}")]
    Setup(String),

    /// The provider reported an error while the call was being set up or running.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The attempt was cancelled or replaced by a newer `start_call` before it connected.
    #[error("Call attempt abandoned before it connected")]
    Abandoned,

    #[error("Missing call credential")]
    MissingCredential,

    #[error("Channel receive error: {0}")]
    ChannelReceive(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),
}
