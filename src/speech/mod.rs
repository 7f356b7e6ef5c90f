//! Voice input and output adapters
//!
//! Capture is single-utterance: each `CaptureSession` ends with exactly one
//! `CaptureEvent`. Synthesis is fire-and-forget.

pub mod stt;
pub mod tts;

pub use crate::error::CaptureError;
pub use stt::{CloudRecognizer, Transcriber};
pub use tts::{CloudSynthesizer, Speaker};

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

/// One capture request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureSession {
    pub id: u64,
    /// BCP 47 tag, e.g. `cs-CZ`
    pub locale: String,
}

impl CaptureSession {
    pub fn new(id: u64, locale: impl Into<String>) -> Self {
        Self {
            id,
            locale: locale.into(),
        }
    }
}

/// Outcome of a capture session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureEvent {
    Transcript { session: u64, text: String },
    Error { session: u64, error: CaptureError },
}

impl CaptureEvent {
    pub fn session(&self) -> u64 {
        match self {
            CaptureEvent::Transcript { session, .. } | CaptureEvent::Error { session, .. } => {
                *session
            }
        }
    }
}

/// Speech-to-text capability
pub trait SpeechRecognizer: Send {
    /// Begin a capture session
    ///
    /// The outcome arrives later on `events`, once. Failures to start are
    /// reported the same way, never returned.
    fn start(&mut self, session: CaptureSession, events: Sender<CaptureEvent>);

    /// Request early termination of the active session. No-op when idle.
    fn stop(&mut self);
}

/// Text-to-speech capability
pub trait SpeechSynthesizer: Send {
    /// Enqueue an utterance without blocking. Errors are tolerated silently.
    fn speak(&self, text: &str, locale: &str);
}

/// An installed synthesis voice
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    pub locale: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locale: locale.into(),
        }
    }
}

fn normalize_locale(locale: &str) -> String {
    locale.trim().replace('_', "-").to_lowercase()
}

/// Pick the voice for `locale`
///
/// An exact tag match wins (ignoring case and `_`/`-`), then the first voice
/// sharing the language. `None` means the caller uses its default voice.
pub fn select_voice<'a>(voices: &'a [Voice], locale: &str) -> Option<&'a Voice> {
    let wanted = normalize_locale(locale);
    if let Some(voice) = voices.iter().find(|v| normalize_locale(&v.locale) == wanted) {
        return Some(voice);
    }

    let language = language_from_locale(locale);
    voices
        .iter()
        .find(|v| language_from_locale(&v.locale) == language)
}

/// Language subtag of a locale: `cs-CZ` → `cs`
pub fn language_from_locale(locale: &str) -> String {
    locale
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}
