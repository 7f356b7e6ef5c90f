//! Error types for the Hovor application
//!
//! Turn failures never reach the user verbatim: the conversation controller
//! logs the detail and shows a single fixed message instead.

use thiserror::Error;

/// Failure of one chat-completion round trip
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, TLS or body read failure
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    /// Success status but the body lacks `choices[0].message`
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The chat worker thread is gone
    #[error("Chat worker unavailable")]
    WorkerUnavailable,
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Network(e.to_string())
    }
}

/// Failure of one voice capture session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// No capture capability in this build or on this machine
    #[error("Speech capture unsupported: {0}")]
    Unsupported(String),

    /// The input device refused access
    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    /// The session ended without any recognizable speech
    #[error("No speech detected")]
    NoSpeech,

    /// Cloud recognition could not be reached
    #[error("Recognition network error: {0}")]
    Network(String),

    /// The recognition service answered with an error
    #[error("Recognition service error: {0}")]
    Service(String),

    /// The session was stopped before a transcript was produced
    #[error("Capture aborted")]
    Aborted,
}

/// Application-level errors
#[derive(Error, Debug, Clone)]
pub enum HovorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio processing error: {0}")]
    AudioProcessing(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for HovorError {
    fn from(e: std::io::Error) -> Self {
        HovorError::Io(e.to_string())
    }
}

impl HovorError {
    /// Check if this error is recoverable
    ///
    /// Recoverable errors leave the application interactive; the user can
    /// simply try again.
    pub fn is_recoverable(&self) -> bool {
        match self {
            HovorError::Config(_) => false,
            HovorError::Transport(_) => true,
            HovorError::Capture(_) => true,
            // Hardware errors may require user intervention
            HovorError::AudioDevice(_) => false,
            HovorError::AudioProcessing(_) => true,
            HovorError::Channel(_) => false,
            HovorError::Io(_) => false,
        }
    }
}

/// Result type alias for Hovor operations
pub type Result<T> = std::result::Result<T, HovorError>;
